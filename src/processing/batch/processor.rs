use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use crate::core::{BatchEvent, ConversionOptions, ConvertedFile, FileStatus, SourceFile, batch_file_name};
use crate::processing::{compress, convert};
use crate::processing::batch::BatchConfig;
use crate::utils::ConverterResult;
use crate::worker::WorkerPool;

/// Runs every selected file through compression and conversion.
///
/// Files are independent: each one gets its own task and one failing never
/// stops the others. CPU work is bounded by the shared [`WorkerPool`].
#[derive(Clone)]
pub struct BatchProcessor {
    pool: WorkerPool,
}

impl BatchProcessor {
    pub fn new(config: &BatchConfig) -> Self {
        debug!("Creating BatchProcessor with {} workers", config.workers);
        Self {
            pool: WorkerPool::new(config.workers),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Processes `files` concurrently and resolves once every file has settled.
    ///
    /// Progress and settlement are streamed over `events` as they happen. The
    /// returned statuses are index-aligned with `files`; a file whose task was
    /// lost stays [`FileStatus::Pending`].
    pub async fn process_batch(
        &self,
        files: &[SourceFile],
        options: &ConversionOptions,
        events: UnboundedSender<BatchEvent>,
    ) -> Vec<FileStatus> {
        let total = files.len();
        info!("Processing batch of {} files as {}", total, options.target_format);

        let mut statuses = vec![FileStatus::Pending; total];
        let mut tasks = JoinSet::new();

        for (index, file) in files.iter().cloned().enumerate() {
            let pool = self.pool.clone();
            let options = options.clone();
            let events = events.clone();
            tasks.spawn(async move {
                let status = match process_file(&pool, index, &file, &options, &events).await {
                    Ok(converted) => {
                        info!(
                            "{} -> {} ({} -> {} bytes)",
                            file.name(), converted.file_name, converted.original_size, converted.size()
                        );
                        FileStatus::Succeeded { file: converted }
                    }
                    Err(e) => {
                        warn!("Failed to convert {}: {}", file.name(), e);
                        FileStatus::Failed { error: e.to_string() }
                    }
                };
                // receiver gone means nobody is watching; the result is still returned
                let _ = events.send(BatchEvent::Settled { index, status: status.clone() });
                (index, status)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, status)) => statuses[index] = status,
                Err(e) => warn!("Batch task did not complete: {}", e),
            }
        }

        let failed = statuses.iter().filter(|s| !matches!(s, FileStatus::Succeeded { .. })).count();
        if failed > 0 {
            warn!("Batch completed with {} failed files out of {}", failed, total);
        } else {
            info!("Batch completed successfully: {} files converted", total);
        }
        statuses
    }
}

/// Compress then convert one file, each stage on a pool worker.
async fn process_file(
    pool: &WorkerPool,
    index: usize,
    file: &SourceFile,
    options: &ConversionOptions,
    events: &UnboundedSender<BatchEvent>,
) -> ConverterResult<ConvertedFile> {
    let source = file.shared_bytes();
    let compress_options = options.clone();
    let progress = events.clone();
    let compressed = pool
        .run(file.name(), move || {
            compress(&source, &compress_options, &|percent| {
                let _ = progress.send(BatchEvent::Progress { index, percent });
            })
        })
        .await??;
    debug!(
        "Compressed {} to {} bytes at {}x{}",
        file.name(), compressed.data.len(), compressed.width, compressed.height
    );

    let target = options.target_format;
    let quality = options.quality;
    let encoded = pool
        .run(file.name(), move || convert(&compressed.data, target, quality))
        .await??;

    let position = index + 1;
    Ok(ConvertedFile {
        position,
        file_name: batch_file_name(position, target),
        source_name: file.name().to_string(),
        format: encoded.format,
        width: encoded.width,
        height: encoded.height,
        original_size: file.size(),
        data: Arc::new(encoded.data),
    })
}
