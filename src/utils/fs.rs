use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use crate::utils::{ConverterError, ConverterResult, PathError};

/// Returns the final path component, or the whole string when there is none
pub fn extract_filename(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(path)
}

/// Reads a selected file into memory
pub async fn read_file(path: impl AsRef<Path>) -> ConverterResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).await.map_err(|e| {
        ConverterError::from(PathError::IO(format!("Failed to read {}: {}", path.display(), e)))
    })
}

/// Writes `bytes` to `dir/filename`, creating `dir` when missing.
///
/// The data is written to a hidden sibling first and renamed into place, so
/// an interrupted save never leaves a truncated file under the final name.
pub async fn save_as(dir: impl AsRef<Path>, filename: &str, bytes: &[u8]) -> ConverterResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ConverterError::IO(format!("Cannot create output directory {}: {}", dir.display(), e)))?;

    let target = dir.join(filename);
    let partial = dir.join(format!(".{filename}.part"));

    fs::write(&partial, bytes)
        .await
        .map_err(|e| ConverterError::IO(format!("Failed to write {}: {}", partial.display(), e)))?;
    fs::rename(&partial, &target)
        .await
        .map_err(|e| ConverterError::IO(format!("Failed to move {} into place: {}", target.display(), e)))?;

    debug!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}
