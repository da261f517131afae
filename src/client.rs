//! Wire protocol for the segmentation service: the multipart upload, the
//! two-token reply, and fetching the derived image assets.

use std::io::Read;

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("malformed reply {0:?}: expected \"<basename> <extension>\"")]
    MalformedReply(String),

    #[error("failed to decode {0}: {1}")]
    Decode(String, String),

    #[error("failed to read upload file: {0}")]
    Upload(String),
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ClientError::Status(code),
            ureq::Error::Transport(t) => ClientError::Transport(t.to_string()),
        }
    }
}

/// The two asset locations currently bound to the displayed images.
/// Replaced wholesale on each successful job; never touched on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionImageRefs {
    pub original: String,
    pub result: String,
}

impl SessionImageRefs {
    /// Server path of the uploaded original, e.g. `/tmp/img42.jpg`.
    pub fn original_path(&self) -> String {
        format!("/tmp/{}", self.original)
    }

    /// Server path of the segmented result, e.g. `/tmp/new_img42.png`.
    pub fn result_path(&self) -> String {
        format!("/tmp/{}", self.result)
    }
}

/// Parse the reply to a segmentation request: a basename and a source-file
/// extension (leading dot included) separated by a space, with a trailing
/// newline from the server's line print. Anything else is malformed.
pub fn parse_reply(body: &str) -> Result<SessionImageRefs> {
    let malformed = || ClientError::MalformedReply(body.trim_end().to_string());
    let mut tokens = body.split_whitespace();
    let basename = tokens.next().ok_or_else(malformed)?;
    let extension = tokens.next().ok_or_else(malformed)?;
    if tokens.next().is_some() || !extension.starts_with('.') {
        return Err(malformed());
    }
    Ok(SessionImageRefs {
        original: format!("{basename}{extension}"),
        result: format!("new_{basename}.png"),
    })
}

/// The image file chosen for upload. An empty filename is sent as-is; the
/// server reports the missing file, the client does not pre-check.
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    fn content_type(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

/// Everything one submission sends: the serialized form plus the image.
#[derive(Debug, Clone)]
pub struct SegmentRequest {
    pub fields: Vec<(String, String)>,
    pub file: UploadFile,
}

/// Everything a finished job hands back to the UI.
pub struct SegmentArtifacts {
    pub refs: SessionImageRefs,
    pub original: image::RgbaImage,
    pub result: image::RgbaImage,
}

/// The seam between the submission lifecycle and the network. The production
/// implementation is [`SegmentClient`]; tests substitute stubs.
pub trait SegmentBackend: Send {
    fn run(&self, request: SegmentRequest) -> Result<SegmentArtifacts>;
}

pub fn random_boundary() -> String {
    let tag: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("----segment-studio-{tag}")
}

/// Encode fields plus the file part as a `multipart/form-data` body.
pub fn encode_form(
    fields: &[(String, String)],
    file: &UploadFile,
    boundary: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.bytes.len() + 1024);
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file.filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type()).as_bytes());
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Blocking HTTP client for one segmentation server.
pub struct SegmentClient {
    base_url: String,
    agent: ureq::Agent,
}

impl SegmentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_form(&self, request: &SegmentRequest) -> Result<String> {
        let boundary = random_boundary();
        let body = encode_form(&request.fields, &request.file, &boundary);
        let url = format!("{}/segment", self.base_url);
        log::info!(
            "submitting {} ({} bytes) to {url}",
            request.file.filename,
            body.len()
        );
        let response = self
            .agent
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body)?;
        response
            .into_string()
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    fn fetch_image(&self, path: &str) -> Result<image::RgbaImage> {
        let url = format!("{}{path}", self.base_url);
        let response = self.agent.get(&url).call()?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        crate::image_io::decode_rgba(path, &bytes)
    }
}

impl SegmentBackend for SegmentClient {
    fn run(&self, request: SegmentRequest) -> Result<SegmentArtifacts> {
        let reply = self.post_form(&request)?;
        let refs = parse_reply(&reply)?;
        log::info!(
            "job accepted: original {} result {}",
            refs.original,
            refs.result
        );
        let original = self.fetch_image(&refs.original_path())?;
        let result = self.fetch_image(&refs.result_path())?;
        Ok(SegmentArtifacts {
            refs,
            original,
            result,
        })
    }
}
