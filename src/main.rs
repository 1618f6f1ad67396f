mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::FreqViewApp;
use eframe::egui;
use freqview::config::{Settings, SETTINGS_FILE};

fn main() -> eframe::Result {
    env_logger::init();

    let settings = match Settings::load_or_default(Path::new(SETTINGS_FILE)) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{e:#}; using default settings");
            Settings::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Freqview – Sweep Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(FreqViewApp::new(settings)))),
    )
}
