//! Terminal rendering of the session state.
//!
//! The renderer subscribes to state changes and prints what changed: the
//! selection, batch progress and the per-file results once the batch settles.

use owo_colors::OwoColorize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use crate::core::{AppState, FileStatus, Phase, ProgressUpdate};

const BAR_WIDTH: usize = 20;
/// Progress lines are printed in steps of this many percent
const PROGRESS_STEP: u8 = 10;

/// Spawns the renderer. It stops once the publishing session is dropped.
pub fn spawn(mut rx: watch::Receiver<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut renderer = Renderer::default();
        loop {
            let state = rx.borrow_and_update().clone();
            for line in renderer.render(&state) {
                println!("{line}");
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Remembers what was already printed so only changes produce output.
#[derive(Debug, Default)]
pub struct Renderer {
    phase: Option<Phase>,
    progress_bucket: Option<u8>,
    settled: usize,
}

impl Renderer {
    /// Lines to print for `state` given everything rendered before.
    pub fn render(&mut self, state: &AppState) -> Vec<String> {
        let mut lines = Vec::new();
        let previous = self.phase.replace(state.phase());
        let entered = previous != Some(state.phase());

        match state.phase() {
            // the initial state carries no selection yet
            Phase::Idle if entered && previous.is_some() => {
                lines.push("No files selected".dimmed().to_string())
            }
            Phase::FilesSelected if entered => {
                lines.push(format!(
                    "{} files selected, converting to {}",
                    state.files().len(),
                    state.options().target_format.bold()
                ));
                for (index, file) in state.files().iter().enumerate() {
                    lines.push(format!("  {}. {} ({})", index + 1, file.name(), format_bytes(file.size())));
                }
            }
            Phase::Converting => {
                if entered {
                    self.progress_bucket = None;
                    self.settled = 0;
                    lines.push(format!("Converting {} files...", state.files().len()));
                }
                let update = state.progress_update();
                let bucket = update.progress_percentage / PROGRESS_STEP;
                if self.progress_bucket != Some(bucket) || self.settled != update.completed_tasks {
                    self.progress_bucket = Some(bucket);
                    self.settled = update.completed_tasks;
                    lines.push(progress_line(&update));
                }
            }
            Phase::Converted if entered => {
                lines.push(progress_line(&state.progress_update()));
                for (file, status) in state.files().iter().zip(state.statuses()) {
                    lines.push(status_line(file.name(), status));
                }
                let converted = state.converted_files().count();
                let summary = format!("{converted} of {} files converted", state.files().len());
                if converted == state.files().len() {
                    lines.push(summary.green().to_string());
                } else {
                    lines.push(summary.yellow().to_string());
                }
            }
            _ => {}
        }
        lines
    }
}

/// `[#####---------------]  25% (1/4 files)`
pub fn progress_line(update: &ProgressUpdate) -> String {
    let filled = (update.progress_percentage as usize * BAR_WIDTH / 100).min(BAR_WIDTH);
    format!(
        "[{}{}] {:>3}% ({}/{} files)",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        update.progress_percentage,
        update.completed_tasks,
        update.total_tasks
    )
}

pub fn status_line(source_name: &str, status: &FileStatus) -> String {
    match status {
        FileStatus::Succeeded { file } => format!(
            "{} {} -> {} ({} -> {}, {:.1}% saved)",
            "✓".green(),
            source_name,
            file.file_name,
            format_bytes(file.original_size),
            format_bytes(file.size()),
            file.compression_ratio()
        ),
        FileStatus::Failed { error } => format!("{} {}: {}", "✗".red(), source_name, error),
        FileStatus::Pending => format!("{} {}", "…".dimmed(), source_name),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BatchEvent, SourceFile};

    fn selected(n: usize) -> AppState {
        let files = (0..n).map(|i| SourceFile::new(format!("f{i}.png"), vec![0; 10])).collect();
        AppState::default().with_selection(files).unwrap()
    }

    #[test]
    fn bytes_are_human_readable() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        let line = progress_line(&ProgressUpdate { completed_tasks: 1, total_tasks: 4, progress_percentage: 25 });
        assert_eq!(line, "[#####---------------]  25% (1/4 files)");
    }

    #[test]
    fn selection_is_listed_once() {
        let mut renderer = Renderer::default();
        let state = selected(2);
        assert_eq!(renderer.render(&state).len(), 3);
        assert!(renderer.render(&state).is_empty());
    }

    #[test]
    fn initial_idle_state_is_silent() {
        let mut renderer = Renderer::default();
        assert!(renderer.render(&AppState::default()).is_empty());

        let state = selected(1);
        renderer.render(&state);
        let cleared = state.with_selection(Vec::new()).unwrap();
        let lines = renderer.render(&cleared);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("No files selected"));
    }

    #[test]
    fn progress_is_printed_per_step() {
        let mut renderer = Renderer::default();
        let state = selected(1).start_conversion().unwrap();
        assert_eq!(renderer.render(&state).len(), 2);

        let state = state.apply(&BatchEvent::Progress { index: 0, percent: 5 });
        assert!(renderer.render(&state).is_empty());

        let state = state.apply(&BatchEvent::Progress { index: 0, percent: 42 });
        let lines = renderer.render(&state);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("42%"));
    }

    #[test]
    fn failures_are_listed_with_their_error() {
        let line = status_line("bad.png", &FileStatus::Failed { error: "Decode error: nope".into() });
        assert!(line.contains("bad.png"));
        assert!(line.contains("nope"));
    }
}
