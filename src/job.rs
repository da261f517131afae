//! Submission lifecycle: at most one job in flight, run on a worker thread,
//! outcome collected by polling from the UI loop.

use std::sync::mpsc;
use std::thread;

use crate::client::{ClientError, Result, SegmentArtifacts, SegmentBackend, SegmentRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
}

/// Owns [`JobState`] and the channel to the worker. The UI disables the
/// submit control while running; `submit` additionally ignores re-entry.
/// `poll` yields each job's outcome exactly once and returns to `Idle` on
/// success and failure alike, so the UI can never stay locked.
pub struct SubmissionController {
    state: JobState,
    rx: Option<mpsc::Receiver<Result<SegmentArtifacts>>>,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
            rx: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// Start a job on a worker thread. Ignored while a job is running.
    pub fn submit<B>(&mut self, backend: B, request: SegmentRequest)
    where
        B: SegmentBackend + 'static,
    {
        if self.is_running() {
            log::warn!("submission ignored: a job is already running");
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.state = JobState::Running;
        thread::spawn(move || {
            let outcome = backend.run(request);
            // The receiver may be gone if the app shut down mid-job.
            let _ = tx.send(outcome);
        });
    }

    /// Non-blocking check for a finished job.
    pub fn poll(&mut self) -> Option<Result<SegmentArtifacts>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.state = JobState::Idle;
                self.rx = None;
                Some(outcome)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.state = JobState::Idle;
                self.rx = None;
                Some(Err(ClientError::Transport(
                    "worker exited without a result".into(),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{SessionImageRefs, UploadFile};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
    use std::sync::Mutex;
    use std::time::Duration;

    fn request() -> SegmentRequest {
        SegmentRequest {
            fields: vec![("input-sigma".into(), "0.80".into())],
            file: UploadFile::default(),
        }
    }

    fn artifacts() -> SegmentArtifacts {
        SegmentArtifacts {
            refs: SessionImageRefs {
                original: "sample.png".into(),
                result: "new_sample.png".into(),
            },
            original: image::RgbaImage::new(1, 1),
            result: image::RgbaImage::new(1, 1),
        }
    }

    /// Backend that blocks until the test releases it, counting runs.
    struct GatedBackend {
        gate: Mutex<Receiver<()>>,
        runs: Arc<AtomicUsize>,
    }

    impl GatedBackend {
        fn new(runs: Arc<AtomicUsize>) -> (Self, SyncSender<()>) {
            let (tx, rx) = sync_channel(1);
            (
                Self {
                    gate: Mutex::new(rx),
                    runs,
                },
                tx,
            )
        }
    }

    impl SegmentBackend for GatedBackend {
        fn run(&self, _request: SegmentRequest) -> Result<SegmentArtifacts> {
            self.gate.lock().unwrap().recv().unwrap();
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(artifacts())
        }
    }

    struct FailingBackend;

    impl SegmentBackend for FailingBackend {
        fn run(&self, _request: SegmentRequest) -> Result<SegmentArtifacts> {
            Err(ClientError::Status(500))
        }
    }

    fn drain(controller: &mut SubmissionController) -> Result<SegmentArtifacts> {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = controller.poll() {
                return outcome;
            }
            assert!(std::time::Instant::now() < deadline, "job never finished");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn submit_runs_job_and_returns_to_idle() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (backend, release) = GatedBackend::new(runs.clone());
        let mut controller = SubmissionController::new();

        assert_eq!(controller.state(), JobState::Idle);
        controller.submit(backend, request());
        assert!(controller.is_running());
        assert!(controller.poll().is_none());

        release.send(()).unwrap();
        let outcome = drain(&mut controller);
        assert!(outcome.is_ok());
        assert_eq!(controller.state(), JobState::Idle);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resubmission_while_running_is_ignored() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (backend, release) = GatedBackend::new(runs.clone());
        let (second, _release2) = GatedBackend::new(runs.clone());
        let mut controller = SubmissionController::new();

        controller.submit(backend, request());
        controller.submit(second, request());
        assert!(controller.is_running());

        release.send(()).unwrap();
        drain(&mut controller).expect("first job succeeds");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_unlocks_exactly_once() {
        let mut controller = SubmissionController::new();
        controller.submit(FailingBackend, request());
        let outcome = drain(&mut controller);
        assert!(matches!(outcome, Err(ClientError::Status(500))));
        assert_eq!(controller.state(), JobState::Idle);
        // The outcome was delivered; nothing more to report.
        assert!(controller.poll().is_none());
    }

    #[test]
    fn controller_is_reusable_after_a_job() {
        let mut controller = SubmissionController::new();
        controller.submit(FailingBackend, request());
        assert!(drain(&mut controller).is_err());

        let runs = Arc::new(AtomicUsize::new(0));
        let (backend, release) = GatedBackend::new(runs.clone());
        controller.submit(backend, request());
        assert!(controller.is_running());
        release.send(()).unwrap();
        drain(&mut controller).expect("second job succeeds");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
