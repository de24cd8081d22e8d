//! User actions against a single conversion session.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use crate::core::{AppState, BatchReport, ConversionOptions, SourceFile, select_files, single_file_name};
use crate::processing::{BatchConfig, BatchProcessor};
use crate::utils::{ConverterError, ConverterResult, ImageFormat, save_as, validate_batch_config, validate_options};

/// Owns the application state and publishes every new state to subscribers.
///
/// All transitions go through here, so the state has a single writer. Batch
/// events are folded in on the task that awaits [`Session::convert`].
pub struct Session {
    state: AppState,
    publisher: watch::Sender<AppState>,
    processor: BatchProcessor,
}

impl Session {
    pub fn new(options: ConversionOptions, config: &BatchConfig) -> ConverterResult<Self> {
        validate_options(&options)?;
        validate_batch_config(config)?;

        let state = AppState::new(options);
        let (publisher, _) = watch::channel(state.clone());
        Ok(Self {
            state,
            publisher,
            processor: BatchProcessor::new(config),
        })
    }

    /// Receives the current state and every state committed after it.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn commit(&mut self, next: AppState) {
        self.state = next;
        self.publisher.send_replace(self.state.clone());
    }

    /// Reads `paths` and makes them the current selection.
    pub async fn select_paths(&mut self, paths: &[PathBuf]) -> ConverterResult<()> {
        let files = select_files(paths).await?;
        self.select(files)
    }

    pub fn select(&mut self, files: Vec<SourceFile>) -> ConverterResult<()> {
        let next = self.state.with_selection(files)?;
        debug!("Selection replaced: {} files", next.files().len());
        self.commit(next);
        Ok(())
    }

    pub fn set_options(&mut self, options: ConversionOptions) -> ConverterResult<()> {
        let next = self.state.with_options(options)?;
        self.commit(next);
        Ok(())
    }

    pub fn set_target_format(&mut self, format: ImageFormat) -> ConverterResult<()> {
        let next = self.state.with_target_format(format)?;
        self.commit(next);
        Ok(())
    }

    /// Converts the whole selection and resolves once every file has settled.
    pub async fn convert(&mut self) -> ConverterResult<BatchReport> {
        let started = self.state.start_conversion()?;
        self.commit(started);

        let started_at = Instant::now();
        let files = self.state.files().to_vec();
        let options = self.state.options().clone();
        let processor = self.processor.clone();
        info!(
            "Converting {} files to {} with {} workers",
            files.len(), options.target_format, processor.worker_count()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let batch = processor.process_batch(&files, &options, tx);
        let events = async {
            while let Some(event) = rx.recv().await {
                let next = self.state.apply(&event);
                self.commit(next);
            }
        };
        let (statuses, ()) = tokio::join!(batch, events);

        let finished = self.state.finish_conversion(statuses)?;
        self.commit(finished);

        let report = self.state.report(started_at.elapsed());
        info!(
            "Batch settled: {} succeeded, {} failed in {} ms",
            report.succeeded, report.failed, report.elapsed_ms
        );
        Ok(report)
    }

    /// Saves every converted file into `dir` under its batch name.
    pub async fn download_all(&self, dir: impl AsRef<Path>) -> ConverterResult<Vec<PathBuf>> {
        self.ensure_downloadable()?;
        let dir = dir.as_ref();
        let mut saved = Vec::new();
        for file in self.state.converted_files() {
            saved.push(save_as(dir, &file.file_name, &file.data).await?);
        }
        info!("Saved {} files to {}", saved.len(), dir.display());
        Ok(saved)
    }

    /// Saves the converted file at 1-based `position` as `converted.<format>`.
    pub async fn download(&self, position: usize, dir: impl AsRef<Path>) -> ConverterResult<PathBuf> {
        self.ensure_downloadable()?;
        let file = self
            .state
            .converted_files()
            .find(|f| f.position == position)
            .ok_or_else(|| ConverterError::options(format!("No converted file at position {position}")))?;
        let path = save_as(dir.as_ref(), &single_file_name(file.format), &file.data).await?;
        info!("Saved {} as {}", file.source_name, path.display());
        Ok(path)
    }

    fn ensure_downloadable(&self) -> ConverterResult<()> {
        if self.state.can_download() {
            Ok(())
        } else {
            Err(ConverterError::phase(format!(
                "nothing to download while {:?}", self.state.phase()
            )))
        }
    }
}
