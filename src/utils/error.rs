//! Error types for the image converter.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use crate::worker::WorkerError;

/// Validation errors for selections, options and session actions.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Path-related validation error
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    /// Invalid conversion options
    #[error("Options error: {0}")]
    Options(String),
    /// Action not allowed in the current session phase
    #[error("Invalid action: {0}")]
    Phase(String),
}

/// File path errors.
#[derive(Error, Debug)]
pub enum PathError {
    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Path exists but is not a file
    #[error("Not a file: {0}")]
    NotFile(PathBuf),
    /// IO error accessing the path
    #[error("IO error: {0}")]
    IO(String),
}

/// Main error type for the converter.
///
/// Every per-file pipeline failure ends up as one of these, and the batch
/// records its message as the file's failed status.
#[derive(Error, Debug)]
pub enum ConverterError {
    /// Selection, options or phase validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Input bytes could not be interpreted as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// No drawing surface could be produced for the bitmap
    #[error("Rendering context error: {0}")]
    RenderingContext(String),

    /// Re-encoding into the target format failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Background worker failure
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Convenience result type for converter operations.
pub type ConverterResult<T> = Result<T, ConverterError>;

impl ConverterError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn rendering_context<T: Into<String>>(msg: T) -> Self {
        Self::RenderingContext(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn options<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::options(msg))
    }

    pub fn phase<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::phase(msg))
    }
}

impl ValidationError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFound(path.into()))
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFile(path.into()))
    }

    pub fn options(msg: impl Into<String>) -> Self {
        Self::Options(msg.into())
    }

    pub fn phase(msg: impl Into<String>) -> Self {
        Self::Phase(msg.into())
    }
}

impl From<io::Error> for ConverterError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<PathError> for ConverterError {
    fn from(err: PathError) -> Self {
        Self::Validation(ValidationError::Path(err))
    }
}
