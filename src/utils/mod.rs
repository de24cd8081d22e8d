pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{ConverterError, ConverterResult, PathError, ValidationError};
pub use validation::{validate_batch_config, validate_input_path, validate_options};
pub use formats::ImageFormat;
pub use fs::{extract_filename, read_file, save_as};
