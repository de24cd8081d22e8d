// Module declarations in dependency order
pub mod utils;
pub mod worker;
pub mod core;
pub mod processing;
pub mod commands;
pub mod view;

// Public exports for external consumers
pub use crate::core::{AppState, BatchReport, ConversionOptions, ConvertedFile, FileStatus, Phase, SourceFile};
pub use crate::processing::{BatchConfig, BatchProcessor, compress, convert};
pub use crate::utils::{ConverterError, ConverterResult, ImageFormat};
pub use crate::commands::Session;

// The command-line entry point lives in main.rs and drives a `Session`.
