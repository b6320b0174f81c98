mod adjust;
mod annotation;
mod app;
mod calibration;
mod canvas;
mod dicom;
mod export;
mod geometry;
mod session;
mod sidebar;
mod toolbar;

use std::path::PathBuf;

use eframe::egui;

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,medimark=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    setup_logging();

    // Optional: open a file straight away instead of going through the
    // picker.
    let initial = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("Medimark"),
        ..Default::default()
    };

    eframe::run_native(
        "Medimark",
        options,
        Box::new(move |cc| Ok(Box::new(app::MedimarkApp::new(cc, initial)))),
    )
    .expect("Failed to run eframe");
}
