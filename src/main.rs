mod app;
mod color;
mod config;
mod data;
mod state;
mod stats;
mod ui;

use app::DashboardApp;
use config::StudyConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = StudyConfig::from_env();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "극지식물 최적 EC 농도 연구",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
}
