mod app;
mod client;
mod image_io;
mod job;
mod params;
mod view;

use clap::Parser;

/// Desktop client for the image-segmentation service.
#[derive(Parser)]
#[command(name = "segment-studio")]
struct Args {
    /// Base URL of the segmentation server
    #[arg(long, default_value = "http://localhost:8080")]
    server: String,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Segment Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Segment Studio",
        options,
        Box::new(move |cc| Ok(Box::new(app::SegmentStudioApp::new(cc, args.server)))),
    )
}
