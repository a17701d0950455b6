use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use log::{debug, info};

use crate::config::Config;
use crate::errors::{NdviError, Result};
use crate::image_io::decode_image;
use crate::index::{calculate_from_dynamic, IndexArray};
use crate::render::{encode_image, mime_type, render_index};

/// An image supplied in memory, e.g. picked in a file dialog
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    /// Original file name, checked against the accepted extensions when present
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            bytes,
        }
    }

    /// Read an upload from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self {
            file_name: path.file_name().map(|name| name.to_string_lossy().into_owned()),
            bytes,
        })
    }
}

/// A named, typed byte buffer offered for saving
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Everything the single-image view shows
#[derive(Debug, Clone)]
pub struct SingleImageOutput {
    pub source: DynamicImage,
    pub index: IndexArray,
    pub figure: RgbImage,
    pub download: Download,
}

/// Decode an upload and run it through [`process_image`]
pub fn process_upload(upload: &Upload, config: &Config) -> Result<SingleImageOutput> {
    if let Some(name) = &upload.file_name {
        if !config.is_allowed_extension(Path::new(name)) {
            return Err(NdviError::UnsupportedExtension(name.clone()));
        }
    }

    let image = decode_image(&upload.bytes)?;
    process_image(image, config)
}

/// Compute, render and encode the index figure of one image
pub fn process_image(image: DynamicImage, config: &Config) -> Result<SingleImageOutput> {
    let index = calculate_from_dynamic(&image)?;
    info!("Computed synthetic index for {}x{} image", index.width(), index.height());
    if let Some(stats) = index.stats() {
        debug!("index min={:.4} max={:.4} mean={:.4}", stats.min, stats.max, stats.mean);
    }

    let figure = render_index(&index, &config.render_options())?;

    let format = ImageFormat::from_path(&config.download_file_name)?;
    let bytes = encode_image(&figure, format)?;

    Ok(SingleImageOutput {
        source: image,
        index,
        figure,
        download: Download {
            file_name: config.download_file_name.clone(),
            mime: mime_type(format),
            bytes,
        },
    })
}
