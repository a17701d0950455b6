mod app;
mod state;
mod ui;

use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Synthetic NDVI Converter")
            .with_inner_size([1100.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Synthetic NDVI Converter",
        options,
        Box::new(|cc| Ok(Box::new(app::NdviApp::new(cc)))),
    )
}
