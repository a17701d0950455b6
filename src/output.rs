use std::fs;
use std::io::Write;
use std::path::Path;
use csv::Writer;

use crate::batch::{BatchReport, FileOutcome};
use crate::errors::{NdviError, Result};

/// Write one CSV row per attempted file of a batch run
pub fn write_summary_csv<P: AsRef<Path>>(report: &BatchReport, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    // Create directory if it doesn't exist
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = Writer::from_path(output_path)?;
    write_summary_rows(report, &mut writer)?;
    writer.flush()?;

    Ok(())
}

/// Render the batch summary CSV into a string
pub fn summary_csv_string(report: &BatchReport) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    write_summary_rows(report, &mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| NdviError::Other(format!("Failed to finish CSV: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| NdviError::Other(format!("CSV is not UTF-8: {}", e)))
}

fn write_summary_rows<W: Write>(report: &BatchReport, writer: &mut Writer<W>) -> Result<()> {
    writer.write_record(["File", "Status", "Output", "Min", "Max", "Mean", "Error"])?;

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Processed(file) => {
                let (min, max, mean) = match file.stats {
                    Some(stats) => (
                        format!("{:.6}", stats.min),
                        format!("{:.6}", stats.max),
                        format!("{:.6}", stats.mean),
                    ),
                    None => (String::new(), String::new(), String::new()),
                };
                let output = file.output_path.display().to_string();
                writer.write_record([
                    file.file_name.as_str(),
                    "processed",
                    output.as_str(),
                    min.as_str(),
                    max.as_str(),
                    mean.as_str(),
                    "",
                ])?;
            }
            FileOutcome::Failed(file) => {
                writer.write_record([
                    file.file_name.as_str(),
                    "failed",
                    "",
                    "",
                    "",
                    "",
                    file.reason.as_str(),
                ])?;
            }
        }
    }

    Ok(())
}

/// Pretty-printed JSON of a batch report
pub fn report_json(report: &BatchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
