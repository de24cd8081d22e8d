//! Command-line interface definitions.

use std::path::PathBuf;
use clap::{ColorChoice, Parser};
use image_converter_lib::{BatchConfig, ConversionOptions, ImageFormat};

/// Compress images to a size budget and convert them to jpeg, png or webp
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Images to convert, in order
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long)]
    pub format: Option<ImageFormat>,

    /// Size budget per file in megabytes
    #[arg(long)]
    pub max_size_mb: Option<f64>,

    /// Quality factor used for the final encoding, in (0, 1]
    #[arg(short, long)]
    pub quality: Option<f32>,

    /// Maximum compression trials per file
    #[arg(long)]
    pub max_iteration: Option<u32>,

    /// Files processed at once (default: 90% of CPU cores, at least 2)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// JSON file with conversion options (camelCase keys)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub options: Option<PathBuf>,

    /// Directory the converted files are saved to
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    /// Save only the file at this 1-based position, as converted.<format>
    #[arg(long)]
    pub single: Option<usize>,

    /// Write a JSON report of the batch to this path
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

impl Cli {
    /// Flags given on the command line win over `base`.
    pub fn apply_overrides(&self, base: ConversionOptions) -> ConversionOptions {
        ConversionOptions {
            target_format: self.format.unwrap_or(base.target_format),
            max_size_mb: self.max_size_mb.unwrap_or(base.max_size_mb),
            quality: self.quality.unwrap_or(base.quality),
            max_iteration: self.max_iteration.unwrap_or(base.max_iteration),
            ..base
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        match self.workers {
            Some(workers) => BatchConfig { workers },
            None => BatchConfig::default(),
        }
    }
}
