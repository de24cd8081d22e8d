use serde::Serialize;
use crate::core::FileStatus;

/// Event sent from a running batch to whoever owns the application state.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Compression progress for the file at `index`
    Progress { index: usize, percent: u8 },
    /// The file at `index` finished its pipeline, successfully or not
    Settled { index: usize, status: FileStatus },
}

/// Per-file progress values (0-100), index-aligned with the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState(Vec<u8>);

impl ProgressState {
    /// All slots start at 0
    pub fn new(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn values(&self) -> &[u8] {
        &self.0
    }

    /// Sets one slot; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, percent: u8) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = percent.min(100);
        }
    }

    /// Mean of all slots
    pub fn overall(&self) -> u8 {
        if self.0.is_empty() {
            return 0;
        }
        let sum: usize = self.0.iter().map(|&p| p as usize).sum();
        (sum / self.0.len()) as u8
    }
}

/// Simplified progress summary for rendering a progress bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub progress_percentage: u8,
}

impl ProgressUpdate {
    pub fn new(statuses: &[FileStatus], progress: &ProgressState) -> Self {
        Self {
            completed_tasks: statuses.iter().filter(|s| s.is_settled()).count(),
            total_tasks: statuses.len(),
            progress_percentage: progress.overall(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_and_ignores_out_of_range() {
        let mut progress = ProgressState::new(2);
        progress.set(0, 250);
        progress.set(5, 10);
        assert_eq!(progress.values(), &[100, 0]);
        assert_eq!(progress.len(), 2);
    }

    #[test]
    fn overall_is_the_mean() {
        let mut progress = ProgressState::new(3);
        progress.set(0, 100);
        progress.set(1, 50);
        assert_eq!(progress.overall(), 50);
        assert_eq!(ProgressState::default().overall(), 0);
    }

    #[test]
    fn update_counts_settled_files() {
        let statuses = vec![
            FileStatus::Pending,
            FileStatus::Failed { error: "x".into() },
        ];
        let mut progress = ProgressState::new(2);
        progress.set(0, 40);
        let update = ProgressUpdate::new(&statuses, &progress);
        assert_eq!(update, ProgressUpdate { completed_tasks: 1, total_tasks: 2, progress_percentage: 20 });
    }
}
