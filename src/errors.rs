use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for the synthetic NDVI tools
#[derive(Error, Debug)]
pub enum NdviError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("Invalid directory path: {0}")]
    InvalidDirectory(PathBuf),

    #[error("Image has {found} colour channel(s), at least 3 are required")]
    UnsupportedChannels { found: u8 },

    #[error("Figure does not fit: {0}")]
    FigureTooLarge(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, NdviError>;
