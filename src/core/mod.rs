//! Core application types and state management.
//!
//! This module contains the fundamental types used throughout the application:
//! - [`AppState`]: Application state and its transitions
//! - [`SourceFile`]: A selected input image
//! - [`ConversionOptions`]: Configuration for one batch run
//! - [`ConvertedFile`] / [`FileStatus`]: Per-file results
//! - [`ProgressState`] / [`BatchEvent`]: Progress tracking for batch operations

mod state;
mod types;
mod task;
mod progress;

pub use state::{AppState, Phase};
pub use types::{
    BatchReport, ConversionOptions, ConvertedFile, FileReport, FileStatus,
    batch_file_name, single_file_name,
};
pub use task::{SourceFile, select_files};
pub use progress::{BatchEvent, ProgressState, ProgressUpdate};
