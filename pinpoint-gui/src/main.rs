// Disable console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod map;
mod tiles;

use app::PinpointApp;
use eframe::egui;
use pinpoint_core::PinpointConfig;

fn main() -> eframe::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Pinpoint - Map Point Picker"),
        ..Default::default()
    };

    let config = PinpointConfig::default();

    eframe::run_native(
        "pinpoint",
        native_options,
        Box::new(|cc| Ok(Box::new(PinpointApp::new(cc, config)?))),
    )
}
