//! Directory workflow: every accepted image directly inside a directory is
//! turned into a rendered index figure under `<dir>/<output_dir_name>/`.
//!
//! A file that fails to decode or save is recorded and skipped; it never
//! aborts the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::errors::Result;
use crate::image_io::{list_image_files, load_image, output_file_name};
use crate::index::{calculate_from_dynamic, IndexStats};
use crate::render::{encode_image, render_index, RenderOptions};

/// A file whose figure was written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedFile {
    pub file_name: String,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub stats: Option<IndexStats>,
}

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: String,
}

/// Result for one attempted file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Processed(ProcessedFile),
    Failed(FailedFile),
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Processed(file) => &file.file_name,
            FileOutcome::Failed(file) => &file.file_name,
        }
    }
}

/// Ordered outcomes of one directory run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    /// Set only when at least one figure was written
    pub output_dir: Option<PathBuf>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &ProcessedFile> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Processed(file) => Some(file),
            FileOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailedFile> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Failed(file) => Some(file),
            FileOutcome::Processed(_) => None,
        })
    }

    pub fn processed_count(&self) -> usize {
        self.processed().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

/// Process every accepted image directly inside `dir_path`.
///
/// Fails only when `dir_path` is not an existing directory (or cannot be
/// listed); per-file problems end up in the report.
pub fn process_directory<P: AsRef<Path>>(dir_path: P, config: &Config) -> Result<BatchReport> {
    let dir_path = dir_path.as_ref();
    let files = list_image_files(dir_path, config)?;
    info!("Found {} image files in {}", files.len(), dir_path.display());

    let output_dir = dir_path.join(&config.output_dir_name);
    let output_dir_existed = output_dir.is_dir();
    let options = config.render_options();

    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing: {}", path.display());

        let outcome = match process_file(path, &file_name, &output_dir, &options, config) {
            Ok(processed) => FileOutcome::Processed(processed),
            Err(e) => {
                warn!("Error processing {}: {}", file_name, e);
                FileOutcome::Failed(FailedFile {
                    file_name,
                    reason: e.to_string(),
                })
            }
        };
        outcomes.push(outcome);
    }

    let mut report = BatchReport {
        input_dir: dir_path.to_path_buf(),
        output_dir: None,
        outcomes,
    };

    if report.processed_count() > 0 {
        report.output_dir = Some(output_dir);
    } else if !output_dir_existed && output_dir.is_dir() {
        // Created for a file whose save then failed; leave no empty directory behind
        if let Err(e) = fs::remove_dir(&output_dir) {
            warn!("Could not remove empty {}: {}", output_dir.display(), e);
        }
    }

    info!(
        "Batch finished: {} processed, {} failed",
        report.processed_count(),
        report.failed_count()
    );

    Ok(report)
}

/// Decode, compute, render and save one file. Everything allocated here is
/// dropped before the next file is opened. The figure is encoded in memory
/// first, so a failed encode leaves neither a file nor a new directory.
fn process_file(
    path: &Path,
    file_name: &str,
    output_dir: &Path,
    options: &RenderOptions,
    config: &Config,
) -> Result<ProcessedFile> {
    let input = load_image(path)?;
    let index = calculate_from_dynamic(&input.image)?;
    drop(input);

    let stats = index.stats();
    if let Some(stats) = &stats {
        debug!(
            "{}: index min={:.4} max={:.4} mean={:.4}",
            file_name, stats.min, stats.max, stats.mean
        );
    }

    let figure = render_index(&index, options)?;
    let output_path = output_dir.join(output_file_name(file_name, config));
    let format = ImageFormat::from_path(&output_path)?;
    let bytes = encode_image(&figure, format)?;
    drop(figure);

    fs::create_dir_all(output_dir)?;
    fs::write(&output_path, bytes)?;

    Ok(ProcessedFile {
        file_name: file_name.to_string(),
        output_path,
        width: index.width(),
        height: index.height(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn grayscale_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(4, 4, Luma([90]))
            .save(dir.path().join("gray.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([20, 180, 40]))
            .save(dir.path().join("green.png"))
            .unwrap();

        let report = process_directory(dir.path(), &Config::default()).unwrap();
        assert_eq!(report.processed_count(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.file_name, "gray.png");
        assert!(failure.reason.contains("channel"));
    }

    #[test]
    fn outcomes_follow_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.png", "m.png", "a.png"] {
            RgbImage::from_pixel(2, 2, Rgb([10, 10, 10]))
                .save(dir.path().join(name))
                .unwrap();
        }

        let report = process_directory(dir.path(), &Config::default()).unwrap();
        let names: Vec<_> = report.outcomes.iter().map(|o| o.file_name()).collect();
        assert_eq!(names, vec!["a.png", "m.png", "z.png"]);
    }

    #[test]
    fn stats_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]))
            .save(dir.path().join("black.png"))
            .unwrap();

        let report = process_directory(dir.path(), &Config::default()).unwrap();
        let processed = report.processed().next().unwrap();
        assert_eq!((processed.width, processed.height), (3, 3));
        let stats = processed.stats.unwrap();
        assert!((stats.mean - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rerun_reuses_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(2, 2, Rgb([50, 120, 60]))
            .save(dir.path().join("field.png"))
            .unwrap();

        let config = Config::default();
        let first = process_directory(dir.path(), &config).unwrap();
        let second = process_directory(dir.path(), &config).unwrap();
        assert_eq!(first.output_dir, second.output_dir);
        assert_eq!(second.processed_count(), 1);
    }

    #[test]
    fn failed_encode_leaves_no_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(300, 300, Rgb([40, 160, 60]))
            .save(dir.path().join("a.png"))
            .unwrap();
        let config = Config { output_extension: "ico".to_string(), ..Config::default() };

        let report = process_directory(dir.path(), &config).unwrap();
        assert_eq!(report.processed_count(), 0);
        assert_eq!(report.failures().next().unwrap().file_name, "a.png");
        assert_eq!(report.output_dir, None);
        assert!(!dir.path().join("ndvi_results").exists());
    }

    #[test]
    fn removes_empty_output_directory_when_every_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([40, 160, 60]))
            .save(dir.path().join("a.png"))
            .unwrap();
        // Encoding succeeds, then the write into a missing subdirectory fails
        let output_dir = dir.path().join("ndvi_results");
        let config = Config { output_prefix: "missing/ndvi_".to_string(), ..Config::default() };
        let report = process_directory(dir.path(), &config).unwrap();
        assert_eq!(report.processed_count(), 0);
        assert_eq!(report.failed_count(), 1);
        assert!(!output_dir.exists());
    }

    #[test]
    fn report_serializes_with_status_tag() {
        let report = BatchReport {
            input_dir: PathBuf::from("in"),
            output_dir: None,
            outcomes: vec![FileOutcome::Failed(FailedFile {
                file_name: "c.jpg".to_string(),
                reason: "bad".to_string(),
            })],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][0]["file_name"], "c.jpg");
    }
}
