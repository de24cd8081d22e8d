use std::path::Path;
use crate::core::ConversionOptions;
use crate::processing::BatchConfig;
use crate::utils::{ConverterError, ConverterResult, ValidationError};

/// Validates a selected input path
pub fn validate_input_path(path: &Path) -> ConverterResult<()> {
    if !path.exists() {
        return Err(ValidationError::path_not_found(path).into());
    }

    if !path.is_file() {
        return Err(ValidationError::not_a_file(path).into());
    }

    Ok(())
}

/// Validates conversion options before a batch starts
pub fn validate_options(options: &ConversionOptions) -> ConverterResult<()> {
    if !options.max_size_mb.is_finite() || options.max_size_mb <= 0.0 {
        return Err(ConverterError::options(
            format!("Invalid maxSizeMB: {}. Must be a positive number", options.max_size_mb)
        ));
    }

    if options.max_size_bytes() == 0 {
        return Err(ConverterError::options(
            format!("maxSizeMB {} is smaller than one byte", options.max_size_mb)
        ));
    }

    validate_quality("quality", options.quality)?;
    validate_quality("initialQuality", options.initial_quality)?;

    if options.max_iteration == 0 {
        return Err(ConverterError::options("maxIteration must be at least 1"));
    }

    Ok(())
}

/// Validates worker pool settings
pub fn validate_batch_config(config: &BatchConfig) -> ConverterResult<()> {
    if config.workers == 0 {
        return Err(ConverterError::options("Worker count cannot be 0"));
    }
    Ok(())
}

fn validate_quality(name: &str, value: f32) -> ConverterResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConverterError::options(
            format!("Invalid {name} value: {value}. Must be in (0, 1]")
        ));
    }
    Ok(())
}
