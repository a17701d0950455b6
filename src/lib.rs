// src/lib.rs - Library interface for the synthetic NDVI tools

pub mod batch;
pub mod colormap;
pub mod config;
pub mod errors;
pub mod image_io;
pub mod index;
pub mod output;
pub mod render;
pub mod session;
pub mod single;
#[cfg(feature = "viewer")]
pub mod viewer;

// Re-export commonly used types and functions
pub use errors::{NdviError, Result};
pub use config::Config;
pub use image_io::{InputImage, list_image_files, load_image, decode_image};

// Index calculator
pub use index::{
    calculate_synthetic_ndvi,
    calculate_from_dynamic,
    pixel_index,
    raw_index,
    IndexArray,
    IndexStats,
    EPSILON,
};

// Rendering
pub use colormap::{ColorScale, ColorScaleKind};
pub use render::{render_index, render_heatmap, encode_png, save_rendered, RenderOptions};

// Workflows
pub use batch::{process_directory, BatchReport, FileOutcome, ProcessedFile, FailedFile};
pub use single::{process_upload, process_image, Download, SingleImageOutput, Upload};
pub use session::{handle, Message, MessageLevel, Request, Response};
