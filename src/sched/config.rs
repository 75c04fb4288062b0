use serde::Deserialize;

use crate::sim::config::Config;
use crate::Cycle;

/// Bind-time scheduler knobs. Immutable once the scheduler is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Hard cap on total queued requests; further adds are dropped.
    pub capacity: usize,
    /// Cycles past its ready cycle that a request stays issuable.
    pub slack: Cycle,
    /// Weight of the row-fullness term in the bucket score.
    pub density_weight: f64,
    /// Weight of the mean-confidence term in the bucket score.
    pub confidence_weight: f64,
    /// Normaliser turning raw confidence into [0, 1].
    pub max_confidence: u32,
    /// Blocks per DRAM row buffer, normalising row fullness into [0, 1].
    pub row_buffer_size: u32,
    /// Keep per-row open/access counts for the histograms.
    pub track_row_history: bool,
}

impl Config for SchedulerConfig {}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            slack: 50,
            density_weight: 0.6,
            confidence_weight: 0.4,
            max_confidence: 16,
            row_buffer_size: 128,
            track_row_history: true,
        }
    }
}
