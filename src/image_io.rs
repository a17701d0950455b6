use std::fs;
use std::path::{Path, PathBuf};

use image::io::Reader as ImageReader;
use image::DynamicImage;

use crate::config::Config;
use crate::errors::{NdviError, Result};

/// Represents a decoded input image with its metadata
pub struct InputImage {
    pub image: DynamicImage,
    pub path: PathBuf,
    pub file_name: String,
}

/// Get the accepted image files directly inside a directory (not recursive),
/// sorted by file name
pub fn list_image_files<P: AsRef<Path>>(dir_path: P, config: &Config) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.is_dir() {
        return Err(NdviError::InvalidDirectory(dir_path.to_path_buf()));
    }

    let mut image_files = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.is_file() && config.is_allowed_extension(&path) {
            image_files.push(path);
        }
    }

    image_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(image_files)
}

/// Load an image from disk, sniffing the format from its content
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| NdviError::Other(format!("No file name in {}", path.display())))?;

    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        file_name,
    })
}

/// Decode an image held in memory (an upload)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Text before the first `.` of a file name
pub fn file_stem_before_first_dot(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Name of the rendered output for `file_name`, e.g. `ndvi_field.png`
pub fn output_file_name(file_name: &str, config: &Config) -> String {
    format!(
        "{}{}.{}",
        config.output_prefix,
        file_stem_before_first_dot(file_name),
        config.output_extension
    )
}
