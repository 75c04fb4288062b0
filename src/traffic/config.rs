use serde::Deserialize;

use crate::sim::config::Config;
use crate::Cycle;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    /// Maximum opens the scheduler may issue per cycle.
    pub budget_per_tick: usize,
    /// Probability that the mock sink accepts an issue.
    pub accept_rate: f64,
    /// Fraction of candidates replayed later as demand accesses.
    pub demand_replay_rate: f64,
    pub seed: u64,
    pub patterns: Vec<PatternSpec>,
}

impl Config for TrafficConfig {}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            budget_per_tick: 4,
            accept_rate: 0.8,
            demand_replay_rate: 0.5,
            seed: 0,
            patterns: vec![
                PatternSpec::default(),
                PatternSpec {
                    base: 0xC000_0000,
                    stride: 256,
                    confidence: 6,
                    delay: 40,
                    ..PatternSpec::default()
                },
            ],
        }
    }
}

/// One synthetic candidate stream with a fixed stride, in the shape a
/// delta-based prefetcher hands over: address, confidence, lead time.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PatternSpec {
    pub base: u64,
    /// Byte distance between consecutive candidates; may be negative.
    pub stride: i64,
    pub requests_per_cycle: u32,
    pub confidence: u32,
    /// Cycles until the candidate's row should be open.
    pub delay: Cycle,
    pub start_cycle: Cycle,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            base: 0x8000_0000,
            stride: 64,
            requests_per_cycle: 1,
            confidence: 12,
            delay: 20,
            start_cycle: 0,
        }
    }
}
