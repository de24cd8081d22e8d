use serde::{Serialize, Deserialize};

/// Worker pool settings for batch processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// Maximum number of files in a CPU stage at once
    pub workers: usize,
}

impl BatchConfig {
    /// 90% of the CPU cores, at least 2
    pub fn optimal_workers() -> usize {
        let cpu_count = num_cpus::get();
        ((cpu_count * 9) / 10).max(2)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: Self::optimal_workers(),
        }
    }
}
