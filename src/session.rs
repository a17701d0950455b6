//! One user action in, everything to show out.
//!
//! A [`Request`] carries the optional upload, the optional directory path and
//! the "process directory" trigger. [`handle`] runs the matching workflows and
//! returns their outputs with ordered user-facing messages. Nothing is kept
//! between calls.

use std::fmt;
use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::batch::{process_directory, BatchReport};
use crate::config::Config;
use crate::errors::NdviError;
use crate::output::write_summary_csv;
use crate::single::{process_upload, SingleImageOutput, Upload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            MessageLevel::Success => "ok",
            MessageLevel::Info => "info",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub upload: Option<Upload>,
    pub directory: Option<PathBuf>,
    /// Batch runs only when this is set and a directory is given
    pub process_directory: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Response {
    pub single: Option<SingleImageOutput>,
    pub batch: Option<BatchReport>,
    pub messages: Vec<Message>,
}

impl Response {
    fn push(&mut self, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        debug!("{:?}: {}", level, text);
        self.messages.push(Message { level, text });
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }

    pub fn messages_at(&self, level: MessageLevel) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.level == level)
    }
}

/// Run the workflows selected by `request`
pub fn handle(request: &Request, config: &Config) -> Response {
    let mut response = Response::default();

    if let Some(upload) = &request.upload {
        match process_upload(upload, config) {
            Ok(output) => response.single = Some(output),
            Err(e) => {
                let name = upload.file_name.as_deref().unwrap_or("uploaded image");
                response.push(MessageLevel::Error, format!("Error processing {}: {}", name, e));
            }
        }
    }

    if request.process_directory {
        match &request.directory {
            Some(directory) if !directory.as_os_str().is_empty() => {
                run_batch(directory.clone(), config, &mut response)
            }
            _ => response.push(MessageLevel::Info, "No directory path entered"),
        }
    }

    response
}

fn run_batch(directory: PathBuf, config: &Config, response: &mut Response) {
    let report = match process_directory(&directory, config) {
        Ok(report) => report,
        Err(NdviError::InvalidDirectory(_)) => {
            response.push(MessageLevel::Error, "Invalid directory path");
            return;
        }
        Err(e) => {
            response.push(
                MessageLevel::Error,
                format!("Could not read {}: {}", directory.display(), e),
            );
            return;
        }
    };

    for failure in report.failures() {
        response.push(
            MessageLevel::Error,
            format!("Error processing {}: {}", failure.file_name, failure.reason),
        );
    }

    match &report.output_dir {
        Some(output_dir) => {
            response.push(
                MessageLevel::Success,
                format!("Processed {} images", report.processed_count()),
            );
            response.push(
                MessageLevel::Success,
                format!("Results saved to {}", output_dir.display()),
            );
        }
        None => response.push(MessageLevel::Warning, "No valid images found"),
    }

    if let Some(summary_path) = &config.summary_csv {
        match write_summary_csv(&report, summary_path) {
            Ok(()) => response.push(MessageLevel::Info, format!("Summary written to {}", summary_path)),
            Err(e) => response.push(
                MessageLevel::Error,
                format!("Failed to write summary {}: {}", summary_path, e),
            ),
        }
    }

    response.batch = Some(report);
}
