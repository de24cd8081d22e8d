//! Source files and file intake.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use crate::utils::{ConverterResult, extract_filename, read_file, validate_input_path};

/// A selected image: raw bytes plus the name it was selected under.
///
/// Immutable once created. Clones share the byte buffer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    data: Arc<Vec<u8>>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data),
        }
    }

    /// Reads a file from disk, keeping only its final path component as name.
    pub async fn load(path: impl AsRef<Path>) -> ConverterResult<Self> {
        let path = path.as_ref();
        validate_input_path(path)?;
        let data = read_file(path).await?;
        let display = path.to_string_lossy();
        Ok(Self::new(extract_filename(&display), data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Shared handle on the bytes for handing to a background worker
    pub fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }
}

/// Loads a selection in order. Any unreadable path rejects the whole selection.
pub async fn select_files(paths: &[PathBuf]) -> ConverterResult<Vec<SourceFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SourceFile::load(path).await?;
        debug!("Selected {} ({} bytes)", file.name(), file.size());
        files.push(file);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selection_keeps_order_and_names() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("b.png");
        let second = tmp.path().join("a.jpg");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second!").unwrap();

        let files = select_files(&[first, second]).await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name(), "b.png");
        assert_eq!(files[0].bytes(), b"first");
        assert_eq!(files[1].name(), "a.jpg");
        assert_eq!(files[1].size(), 7);
    }

    #[tokio::test]
    async fn missing_path_rejects_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let result = select_files(&[tmp.path().join("nope.png")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(SourceFile::load(tmp.path()).await.is_err());
    }

    #[test]
    fn clones_share_bytes() {
        let file = SourceFile::new("x.png", vec![1, 2, 3]);
        let copy = file.clone();
        assert!(Arc::ptr_eq(&file.shared_bytes(), &copy.shared_bytes()));
    }
}
