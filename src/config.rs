use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::colormap::{ColorScale, ColorScaleKind};
use crate::errors::{NdviError, Result};
use crate::render::RenderOptions;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ndvi.toml";

/// Upper bounds that keep rendered figures a sane size
pub const MAX_PADDING: u32 = 1000;
pub const MAX_COLORBAR_WIDTH: u32 = 1000;

/// Configuration for the synthetic NDVI tools
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Subdirectory created inside the batch input directory
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// Prefix of every batch output file name
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Image format extension of batch output files
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Name offered for the single-image download
    #[serde(default = "default_download_file_name")]
    pub download_file_name: String,

    /// Extensions (lowercase, without dot) accepted as input images
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    // Colour scale
    #[serde(default)]
    pub color_scale: ColorScaleKind,

    #[serde(default = "default_vmin")]
    pub vmin: f64,

    #[serde(default = "default_vmax")]
    pub vmax: f64,

    // Figure layout
    #[serde(default = "default_colorbar")]
    pub colorbar: bool,

    #[serde(default = "default_colorbar_width")]
    pub colorbar_width: u32,

    #[serde(default = "default_colorbar_shrink")]
    pub colorbar_shrink: f64,

    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Optional CSV summary written after a batch run
    #[serde(default)]
    pub summary_csv: Option<String>,
}

fn default_output_dir_name() -> String {
    "ndvi_results".to_string()
}

fn default_output_prefix() -> String {
    "ndvi_".to_string()
}

fn default_output_extension() -> String {
    "png".to_string()
}

fn default_download_file_name() -> String {
    "ndvi_result.png".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "tiff", "tif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_vmin() -> f64 {
    0.0
}

fn default_vmax() -> f64 {
    1.0
}

fn default_colorbar() -> bool {
    true
}

fn default_colorbar_width() -> u32 {
    20
}

fn default_colorbar_shrink() -> f64 {
    0.8
}

fn default_padding() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir_name: default_output_dir_name(),
            output_prefix: default_output_prefix(),
            output_extension: default_output_extension(),
            download_file_name: default_download_file_name(),
            allowed_extensions: default_allowed_extensions(),
            color_scale: ColorScaleKind::default(),
            vmin: default_vmin(),
            vmax: default_vmax(),
            colorbar: default_colorbar(),
            colorbar_width: default_colorbar_width(),
            colorbar_shrink: default_colorbar_shrink(),
            padding: default_padding(),
            summary_csv: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NdviError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| NdviError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })?;

        Ok(config)
    }

    /// Load `path` when given, otherwise `ndvi.toml` if present, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    log::info!("Using configuration from {}", fallback.display());
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.vmin.is_finite() || !self.vmax.is_finite() || self.vmin >= self.vmax {
            return Err(NdviError::Config(format!(
                "vmin ({}) must be finite and < vmax ({})",
                self.vmin, self.vmax
            )));
        }

        if self.colorbar_shrink <= 0.0 || self.colorbar_shrink > 1.0 {
            return Err(NdviError::Config(
                "colorbar_shrink must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.padding > MAX_PADDING {
            return Err(NdviError::Config(format!(
                "padding ({}) must be at most {}",
                self.padding, MAX_PADDING
            )));
        }

        if self.colorbar_width > MAX_COLORBAR_WIDTH {
            return Err(NdviError::Config(format!(
                "colorbar_width ({}) must be at most {}",
                self.colorbar_width, MAX_COLORBAR_WIDTH
            )));
        }

        if self.colorbar && self.colorbar_width == 0 {
            return Err(NdviError::Config(
                "colorbar_width must be > 0 when colorbar is enabled".to_string(),
            ));
        }

        if self.output_dir_name.is_empty()
            || self.output_dir_name.contains(|c: char| c == '/' || c == '\\')
            || self.output_dir_name == "."
            || self.output_dir_name == ".."
        {
            return Err(NdviError::Config(format!(
                "output_dir_name '{}' must be a plain directory name",
                self.output_dir_name
            )));
        }

        if self.allowed_extensions.is_empty() {
            return Err(NdviError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        if ImageFormat::from_extension(&self.output_extension).is_none() {
            return Err(NdviError::Config(format!(
                "output_extension '{}' is not a known image format",
                self.output_extension
            )));
        }

        if ImageFormat::from_path(&self.download_file_name).is_err() {
            return Err(NdviError::Config(format!(
                "download_file_name '{}' has no known image extension",
                self.download_file_name
            )));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            NdviError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Colour scale described by this configuration
    pub fn color_scale(&self) -> ColorScale {
        ColorScale::new(self.color_scale, self.vmin, self.vmax)
    }

    /// Figure layout described by this configuration
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.color_scale(),
            colorbar: self.colorbar,
            colorbar_width: self.colorbar_width,
            colorbar_shrink: self.colorbar_shrink,
            padding: self.padding,
        }
    }

    /// Whether `path` carries one of the accepted input extensions (case-insensitive)
    pub fn is_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }
}
