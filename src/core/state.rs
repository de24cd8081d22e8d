//! Application state and its transitions.
//!
//! [`AppState`] is a plain value. Every user action or batch event is a
//! method that takes the current state by reference and returns the next one,
//! leaving the caller free to publish it to subscribers.
//!
//! ```text
//! Idle -> FilesSelected -> Converting -> Converted -> (new selection) -> ...
//! ```

use std::time::Duration;
use serde::Serialize;
use tracing::warn;
use crate::core::{BatchEvent, BatchReport, ConversionOptions, ConvertedFile, FileStatus, ProgressState, ProgressUpdate, SourceFile};
use crate::utils::{ConverterError, ConverterResult, ImageFormat, validate_options};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    FilesSelected,
    Converting,
    Converted,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    phase: Phase,
    files: Vec<SourceFile>,
    options: ConversionOptions,
    progress: ProgressState,
    statuses: Vec<FileStatus>,
}

impl AppState {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn statuses(&self) -> &[FileStatus] {
        &self.statuses
    }

    /// A batch is in flight
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Converting
    }

    /// The convert action is offered only with a selection and no batch running
    pub fn can_convert(&self) -> bool {
        !self.is_busy() && !self.files.is_empty()
    }

    pub fn can_download(&self) -> bool {
        self.phase == Phase::Converted && self.converted_files().next().is_some()
    }

    /// Successful results in selection order
    pub fn converted_files(&self) -> impl Iterator<Item = &ConvertedFile> {
        self.statuses.iter().filter_map(FileStatus::converted)
    }

    pub fn progress_update(&self) -> ProgressUpdate {
        ProgressUpdate::new(&self.statuses, &self.progress)
    }

    pub fn report(&self, elapsed: Duration) -> BatchReport {
        BatchReport::new(
            self.files.iter().map(|f| (f.name(), f.size())),
            &self.statuses,
            elapsed.as_millis() as u64,
        )
    }

    /// Replaces the selection. Previous progress and results are discarded.
    pub fn with_selection(&self, files: Vec<SourceFile>) -> ConverterResult<Self> {
        self.ensure_idle("select files")?;
        let len = files.len();
        Ok(Self {
            phase: if files.is_empty() { Phase::Idle } else { Phase::FilesSelected },
            files,
            options: self.options.clone(),
            progress: ProgressState::new(len),
            statuses: vec![FileStatus::Pending; len],
        })
    }

    pub fn with_options(&self, options: ConversionOptions) -> ConverterResult<Self> {
        self.ensure_idle("change options")?;
        validate_options(&options)?;
        Ok(Self {
            options,
            ..self.clone()
        })
    }

    pub fn with_target_format(&self, target_format: ImageFormat) -> ConverterResult<Self> {
        self.with_options(ConversionOptions {
            target_format,
            ..self.options.clone()
        })
    }

    /// Enters `Converting` with fresh progress and pending statuses.
    pub fn start_conversion(&self) -> ConverterResult<Self> {
        self.ensure_idle("start a conversion")?;
        if self.files.is_empty() {
            return Err(ConverterError::phase("no files selected"));
        }
        validate_options(&self.options)?;

        let len = self.files.len();
        Ok(Self {
            phase: Phase::Converting,
            progress: ProgressState::new(len),
            statuses: vec![FileStatus::Pending; len],
            ..self.clone()
        })
    }

    /// Folds one batch event into the state. Events outside a batch are dropped.
    pub fn apply(&self, event: &BatchEvent) -> Self {
        let mut next = self.clone();
        if next.phase != Phase::Converting {
            warn!("Ignoring batch event while {:?}", next.phase);
            return next;
        }

        match event {
            BatchEvent::Progress { index, percent } => next.progress.set(*index, *percent),
            BatchEvent::Settled { index, status } => {
                if let Some(slot) = next.statuses.get_mut(*index) {
                    *slot = status.clone();
                    next.progress.set(*index, 100);
                }
            }
        }
        next
    }

    /// Leaves `Converting` with the orchestrator's final statuses.
    ///
    /// Statuses are matched to files by position. Any file still pending is
    /// recorded as failed.
    pub fn finish_conversion(&self, statuses: Vec<FileStatus>) -> ConverterResult<Self> {
        if self.phase != Phase::Converting {
            return Err(ConverterError::phase(format!(
                "cannot finish a conversion while {:?}", self.phase
            )));
        }
        if statuses.len() != self.files.len() {
            return Err(ConverterError::phase(format!(
                "batch returned {} results for {} files", statuses.len(), self.files.len()
            )));
        }

        let statuses: Vec<FileStatus> = statuses
            .into_iter()
            .map(|status| match status {
                FileStatus::Pending => FileStatus::Failed {
                    error: "conversion did not complete".to_string(),
                },
                settled => settled,
            })
            .collect();

        let mut progress = self.progress.clone();
        for index in 0..statuses.len() {
            progress.set(index, 100);
        }

        Ok(Self {
            phase: Phase::Converted,
            progress,
            statuses,
            ..self.clone()
        })
    }

    fn ensure_idle(&self, action: &str) -> ConverterResult<()> {
        if self.is_busy() {
            return Err(ConverterError::phase(format!("cannot {action} while a conversion is running")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::batch_file_name;

    fn files(n: usize) -> Vec<SourceFile> {
        (0..n).map(|i| SourceFile::new(format!("f{i}.png"), vec![i as u8; 8])).collect()
    }

    fn success(position: usize) -> FileStatus {
        FileStatus::Succeeded {
            file: ConvertedFile {
                position,
                file_name: batch_file_name(position, ImageFormat::PNG),
                source_name: format!("f{}.png", position - 1),
                format: ImageFormat::PNG,
                width: 1,
                height: 1,
                original_size: 8,
                data: Arc::new(vec![1, 2, 3]),
            },
        }
    }

    #[test]
    fn empty_selection_cannot_convert() {
        let state = AppState::default().with_selection(Vec::new()).unwrap();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.can_convert());
        assert!(state.start_conversion().is_err());
    }

    #[test]
    fn selection_sizes_progress_and_statuses() {
        let state = AppState::default().with_selection(files(3)).unwrap();
        assert_eq!(state.phase(), Phase::FilesSelected);
        assert_eq!(state.progress().len(), 3);
        assert_eq!(state.statuses().len(), 3);
        assert!(state.can_convert());
        assert!(!state.can_download());
    }

    #[test]
    fn busy_state_rejects_actions() {
        let state = AppState::default()
            .with_selection(files(2)).unwrap()
            .start_conversion().unwrap();

        assert!(state.is_busy());
        assert!(!state.can_convert());
        assert!(state.start_conversion().is_err());
        assert!(state.with_selection(files(1)).is_err());
        assert!(state.with_target_format(ImageFormat::WebP).is_err());
    }

    #[test]
    fn events_update_only_their_slot() {
        let state = AppState::default()
            .with_selection(files(3)).unwrap()
            .start_conversion().unwrap();

        let state = state.apply(&BatchEvent::Progress { index: 2, percent: 40 });
        assert_eq!(state.progress().values(), &[0, 0, 40]);

        let state = state.apply(&BatchEvent::Settled { index: 0, status: success(1) });
        assert_eq!(state.progress().values(), &[100, 0, 40]);
        assert_eq!(state.progress().len(), 3);
        assert!(state.statuses()[0].converted().is_some());
        assert!(!state.statuses()[1].is_settled());
    }

    #[test]
    fn events_outside_a_batch_are_ignored() {
        let state = AppState::default().with_selection(files(1)).unwrap();
        let next = state.apply(&BatchEvent::Progress { index: 0, percent: 70 });
        assert_eq!(next.progress().values(), &[0]);
    }

    #[test]
    fn finishing_marks_stragglers_failed() {
        let state = AppState::default()
            .with_selection(files(3)).unwrap()
            .start_conversion().unwrap()
            .finish_conversion(vec![success(1), FileStatus::Failed { error: "bad".into() }, FileStatus::Pending])
            .unwrap();

        assert_eq!(state.phase(), Phase::Converted);
        assert!(state.can_download());
        assert_eq!(state.converted_files().count(), 1);
        assert_eq!(state.statuses()[2].error(), Some("conversion did not complete"));
        assert_eq!(state.progress().values(), &[100, 100, 100]);
    }

    #[test]
    fn finishing_requires_a_running_batch_and_matching_results() {
        let selected = AppState::default().with_selection(files(2)).unwrap();
        assert!(selected.finish_conversion(vec![success(1), success(2)]).is_err());

        let running = selected.start_conversion().unwrap();
        assert!(running.finish_conversion(vec![success(1)]).is_err());
    }

    #[test]
    fn new_selection_after_conversion_resets_results() {
        let converted = AppState::default()
            .with_selection(files(1)).unwrap()
            .start_conversion().unwrap()
            .finish_conversion(vec![success(1)]).unwrap();

        let reselected = converted.with_selection(files(2)).unwrap();
        assert_eq!(reselected.phase(), Phase::FilesSelected);
        assert_eq!(reselected.converted_files().count(), 0);
        assert_eq!(reselected.progress().values(), &[0, 0]);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let state = AppState::default();
        let bad = ConversionOptions { quality: 2.0, ..ConversionOptions::default() };
        assert!(state.with_options(bad).is_err());
        let webp = state.with_target_format(ImageFormat::WebP).unwrap();
        assert_eq!(webp.options().target_format, ImageFormat::WebP);
    }
}
