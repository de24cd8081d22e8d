//! Core types for conversion options, results and reports.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::utils::{ConverterError, ConverterResult, ImageFormat, validate_options};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Options for one batch run.
///
/// Field names follow the camelCase keys accepted in an options file, e.g.
/// `{ "targetFormat": "webp", "maxSizeMB": 0.5 }`. Missing keys take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    /// Format every file is re-encoded into
    pub target_format: ImageFormat,
    /// Size budget for the compression stage, in megabytes
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: f64,
    /// Quality factor (0, 1] used by the final re-encode
    pub quality: f32,
    /// Upper bound on compression trials per file
    pub max_iteration: u32,
    /// Quality factor of the first compression trial
    pub initial_quality: f32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            target_format: ImageFormat::JPEG,
            max_size_mb: 1.0,
            quality: 0.8,
            max_iteration: 10,
            initial_quality: 1.0,
        }
    }
}

impl ConversionOptions {
    /// Parses and validates an options document.
    pub fn from_json(json: &str) -> ConverterResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| ConverterError::options(format!("Invalid options file: {e}")))?;
        validate_options(&options)?;
        Ok(options)
    }

    /// Size budget in bytes
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb * BYTES_PER_MB) as u64
    }
}

/// Name of a batch download: `converted_<position>.<format>`.
pub fn batch_file_name(position: usize, format: ImageFormat) -> String {
    format!("converted_{position}.{format}")
}

/// Name of a single-file download: `converted.<format>`.
pub fn single_file_name(format: ImageFormat) -> String {
    format!("converted.{format}")
}

/// A file that went through the whole pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFile {
    /// 1-based position in the original selection
    pub position: usize,
    /// Download name derived from position and format
    pub file_name: String,
    /// Name of the selected source file
    pub source_name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Size of the selected source file in bytes
    pub original_size: u64,
    #[serde(skip)]
    pub data: Arc<Vec<u8>>,
}

impl ConvertedFile {
    /// Encoded size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Bytes saved (negative when the file grew)
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.size() as i64
    }

    /// Saved bytes as a percentage of the original size
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.saved_bytes() as f64 / self.original_size as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Outcome of one file's pipeline, index-aligned with the selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum FileStatus {
    Pending,
    Succeeded { file: ConvertedFile },
    Failed { error: String },
}

impl FileStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn converted(&self) -> Option<&ConvertedFile> {
        match self {
            Self::Succeeded { file } => Some(file),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Per-file entry of a [`BatchReport`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub position: usize,
    pub source_name: String,
    pub status: &'static str,
    pub original_size: u64,
    pub output_name: Option<String>,
    pub converted_size: Option<u64>,
    pub saved_bytes: Option<i64>,
    pub compression_ratio: Option<f64>,
    pub error: Option<String>,
}

/// Summary of a settled batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// Builds a report from sources and their statuses, matched by position.
    pub fn new<'a>(
        sources: impl IntoIterator<Item = (&'a str, u64)>,
        statuses: &[FileStatus],
        elapsed_ms: u64,
    ) -> Self {
        let files: Vec<FileReport> = sources
            .into_iter()
            .zip(statuses)
            .enumerate()
            .map(|(index, ((name, original_size), status))| {
                let converted = status.converted();
                FileReport {
                    position: index + 1,
                    source_name: name.to_string(),
                    status: status.label(),
                    original_size,
                    output_name: converted.map(|f| f.file_name.clone()),
                    converted_size: converted.map(ConvertedFile::size),
                    saved_bytes: converted.map(ConvertedFile::saved_bytes),
                    compression_ratio: converted.map(ConvertedFile::compression_ratio),
                    error: status.error().map(str::to_string),
                }
            })
            .collect();

        let succeeded = statuses.iter().filter(|s| s.converted().is_some()).count();
        let failed = statuses.iter().filter(|s| s.error().is_some()).count();
        let total_input_bytes = files.iter().map(|f| f.original_size).sum();
        let total_output_bytes = files.iter().filter_map(|f| f.converted_size).sum();

        Self {
            files,
            succeeded,
            failed,
            total_input_bytes,
            total_output_bytes,
            elapsed_ms,
        }
    }
}
