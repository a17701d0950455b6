// Main Application Structure
use eframe::egui;
use std::fs;
use std::path::PathBuf;

use synthetic_ndvi_lib::{handle, Config, MessageLevel, Request, Upload};

use crate::state::AppState;
use crate::ui::{self, Actions};

pub struct NdviApp {
    state: AppState,
    config: Config,
}

impl NdviApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = Config::load_or_default(None)
            .and_then(|config| config.validate().map(|()| config))
            .unwrap_or_else(|e| {
                log::warn!("Could not load configuration ({}), using defaults", e);
                Config::default()
            });

        Self {
            state: AppState::default(),
            config,
        }
    }

    fn pick_image(&mut self, ctx: &egui::Context) {
        let extensions: Vec<&str> = self.config.allowed_extensions.iter().map(String::as_str).collect();
        let Some(path) = rfd::FileDialog::new()
            .set_title("Select an RGB satellite image of a landscape of your choosing")
            .add_filter("Images", extensions.as_slice())
            .pick_file()
        else {
            return;
        };

        let upload = match Upload::from_path(&path) {
            Ok(upload) => upload,
            Err(e) => {
                self.state.clear_single();
                self.state.messages.clear();
                self.state
                    .push_message(MessageLevel::Error, format!("Could not read {}: {}", path.display(), e));
                return;
            }
        };

        let name = upload.file_name.clone();
        let request = Request {
            upload: Some(upload),
            ..Request::default()
        };
        let response = handle(&request, &self.config);
        self.state.apply_upload_response(ctx, name, response);
    }

    fn save_download(&mut self) {
        let Some(download) = &self.state.download else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .set_title("Download NDVI Image")
            .set_file_name(download.file_name.as_str())
            .save_file()
        else {
            return;
        };

        match fs::write(&path, &download.bytes) {
            Ok(()) => {
                log::info!("Saved {} ({})", path.display(), download.mime);
                self.state
                    .push_message(MessageLevel::Success, format!("Saved {}", path.display()));
            }
            Err(e) => self
                .state
                .push_message(MessageLevel::Error, format!("Failed to save {}: {}", path.display(), e)),
        }
    }

    fn browse_directory(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Select Image Directory")
            .pick_folder()
        {
            self.state.directory_input = path.display().to_string();
        }
    }

    fn process_directory(&mut self) {
        let directory = self.state.directory_input.trim();
        let request = Request {
            directory: (!directory.is_empty()).then(|| PathBuf::from(directory)),
            process_directory: true,
            ..Request::default()
        };
        let response = handle(&request, &self.config);
        self.state.apply_batch_response(response);
    }
}

impl eframe::App for NdviApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions = Actions::default();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui::render_header(ui);
                ui::render_single_image(ui, &self.state, &mut actions);
                ui::render_batch(ui, &mut self.state, &mut actions);
                ui::render_messages(ui, &self.state);
            });
        });

        if actions.pick_image {
            self.pick_image(ctx);
        }
        if actions.download {
            self.save_download();
        }
        if actions.browse_directory {
            self.browse_directory();
        }
        if actions.process_directory {
            self.process_directory();
        }
    }
}
