// Application State Management
use eframe::egui;
use image::RgbImage;

use synthetic_ndvi_lib::{BatchReport, Download, Message, MessageLevel, Response};

/// What the window currently shows. Rebuilt from each `Response`; no
/// processing state is carried from one action to the next.
#[derive(Default)]
pub struct AppState {
    // Inputs being edited
    pub directory_input: String,

    // Single image
    pub source_name: Option<String>,
    pub source_texture: Option<egui::TextureHandle>,
    pub ndvi_texture: Option<egui::TextureHandle>,
    pub download: Option<Download>,

    // Batch
    pub last_batch: Option<BatchReport>,

    pub messages: Vec<Message>,
}

impl AppState {
    /// Replace the single-image view with the outcome of an upload
    pub fn apply_upload_response(&mut self, ctx: &egui::Context, name: Option<String>, response: Response) {
        self.messages = response.messages;
        self.source_name = name;

        match response.single {
            Some(single) => {
                let source = single.source.to_rgb8();
                self.source_texture = Some(load_texture_from_image(ctx, &source, "source"));
                self.ndvi_texture = Some(load_texture_from_image(ctx, &single.figure, "ndvi"));
                self.download = Some(single.download);
            }
            None => self.clear_single(),
        }
    }

    /// Replace the batch section with the outcome of a directory run
    pub fn apply_batch_response(&mut self, response: Response) {
        self.messages = response.messages;
        self.last_batch = response.batch;
    }

    pub fn clear_single(&mut self) {
        self.source_texture = None;
        self.ndvi_texture = None;
        self.download = None;
    }

    pub fn push_message(&mut self, level: MessageLevel, text: impl Into<String>) {
        self.messages.push(Message { level, text: text.into() });
    }
}

pub fn load_texture_from_image(ctx: &egui::Context, image: &RgbImage, name: &str) -> egui::TextureHandle {
    let size = [image.width() as usize, image.height() as usize];
    let color_image = egui::ColorImage::from_rgb(size, image.as_raw());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}
