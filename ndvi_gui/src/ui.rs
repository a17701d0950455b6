// UI rendering functions

use eframe::egui;

use synthetic_ndvi_lib::MessageLevel;

use crate::state::AppState;

const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 160, 70);
const INFO_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 120, 255);
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 160, 0);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 50, 50);

/// Buttons clicked during this frame
#[derive(Default)]
pub struct Actions {
    pub pick_image: bool,
    pub download: bool,
    pub browse_directory: bool,
    pub process_directory: bool,
}

pub fn render_header(ui: &mut egui::Ui) {
    ui.heading("Synthetic NDVI Converter for Drought Estimation");
    ui.label(
        "Convert RGB landscape or satellite images to synthetic NDVI images. \
         Upload a single image or process an entire directory of images.",
    );
    ui.separator();
}

pub fn render_single_image(ui: &mut egui::Ui, state: &AppState, actions: &mut Actions) {
    ui.horizontal(|ui| {
        if ui.button("📁 Select image (.png, .jpg, .jpeg, .tif, .tiff)").clicked() {
            actions.pick_image = true;
        }
        if let Some(name) = &state.source_name {
            ui.label(name);
        }
    });

    let (Some(source), Some(ndvi)) = (&state.source_texture, &state.ndvi_texture) else {
        return;
    };

    ui.columns(2, |columns| {
        columns[0].label("Uploaded Image");
        paint_fitted(&mut columns[0], source);
        columns[1].label("Synthetic NDVI Image");
        paint_fitted(&mut columns[1], ndvi);
    });

    if let Some(download) = &state.download {
        if ui.button(format!("💾 Download NDVI Image ({})", download.file_name)).clicked() {
            actions.download = true;
        }
    }
}

pub fn render_batch(ui: &mut egui::Ui, state: &mut AppState, actions: &mut Actions) {
    ui.separator();
    ui.label("Enter directory path for batch processing (.jpg, .jpeg, .png, .tiff, .tif)");
    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(&mut state.directory_input).desired_width(420.0));
        if ui.button("Browse...").clicked() {
            actions.browse_directory = true;
        }
        let has_directory = !state.directory_input.trim().is_empty();
        ui.add_enabled_ui(has_directory, |ui| {
            if ui.button("⏩ Process Directory").clicked() {
                actions.process_directory = true;
            }
        });
    });

    if let Some(report) = &state.last_batch {
        ui.label(format!(
            "{} processed, {} failed",
            report.processed_count(),
            report.failed_count()
        ));
    }
}

pub fn render_messages(ui: &mut egui::Ui, state: &AppState) {
    if state.messages.is_empty() {
        return;
    }
    ui.separator();
    egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
        for message in &state.messages {
            let color = match message.level {
                MessageLevel::Success => SUCCESS_COLOR,
                MessageLevel::Info => INFO_COLOR,
                MessageLevel::Warning => WARNING_COLOR,
                MessageLevel::Error => ERROR_COLOR,
            };
            ui.colored_label(color, &message.text);
        }
    });
}

/// Draw a texture scaled down to the available width, keeping its aspect ratio
fn paint_fitted(ui: &mut egui::Ui, texture: &egui::TextureHandle) {
    let tex_size = texture.size_vec2();
    let scale = (ui.available_width() / tex_size.x).min(1.0);
    let (rect, _) = ui.allocate_exact_size(tex_size * scale, egui::Sense::hover());

    ui.painter().image(
        texture.id(),
        rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
}
