use std::collections::BTreeMap;

use serde::Serialize;

use crate::dram::RowCoord;

/// Buckets above the zero bucket; the last one extends to `u64::MAX`.
const HISTOGRAM_BUCKETS: usize = 16;

/// Open/access counts for every row the scheduler has issued or matched.
#[derive(Debug, Default)]
pub(crate) struct RowHistory {
    rows: BTreeMap<RowCoord, RowCounts>,
}

#[derive(Debug, Clone, Copy, Default)]
struct RowCounts {
    opens: u64,
    accesses: u64,
}

impl RowHistory {
    pub(crate) fn record_open(&mut self, coord: &RowCoord) {
        let counts = self.rows.entry(*coord).or_default();
        counts.opens = counts.opens.saturating_add(1);
    }

    pub(crate) fn record_access(&mut self, coord: &RowCoord) {
        let counts = self.rows.entry(*coord).or_default();
        counts.accesses = counts.accesses.saturating_add(1);
    }

    /// Renders the per-row counts into paired histograms. Both histograms
    /// cover the same row population, so their total counts agree.
    pub(crate) fn histograms(&self) -> RowAccessHistogram {
        let mut histogram = RowAccessHistogram::default();
        for counts in self.rows.values() {
            histogram.opens.record(counts.opens);
            histogram.accesses.record(counts.accesses);
        }
        histogram
    }
}

/// One bucket of a power-of-two histogram, inclusive on both ends.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistogramBucket {
    pub min: u64,
    pub max: u64,
    pub count: u64,
    pub sum: u64,
}

impl HistogramBucket {
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

/// Histogram with bucket 0 reserved for the value 0 and power-of-two
/// boundaries above it: bucket `i` covers `[2^(i-1), 2^i - 1]`.
#[derive(Debug, Clone, Serialize)]
pub struct PowerOfTwoHistogram {
    buckets: Vec<HistogramBucket>,
}

impl Default for PowerOfTwoHistogram {
    fn default() -> Self {
        let mut buckets = Vec::with_capacity(HISTOGRAM_BUCKETS + 1);
        buckets.push(HistogramBucket {
            min: 0,
            max: 0,
            count: 0,
            sum: 0,
        });
        for i in 1..=HISTOGRAM_BUCKETS {
            let min = 1u64 << (i - 1);
            let max = if i == HISTOGRAM_BUCKETS {
                u64::MAX
            } else {
                (1u64 << i) - 1
            };
            buckets.push(HistogramBucket {
                min,
                max,
                count: 0,
                sum: 0,
            });
        }
        Self { buckets }
    }
}

impl PowerOfTwoHistogram {
    pub fn record(&mut self, value: u64) {
        let bucket = &mut self.buckets[Self::bucket_index(value)];
        bucket.count = bucket.count.saturating_add(1);
        bucket.sum = bucket.sum.saturating_add(value);
    }

    fn bucket_index(value: u64) -> usize {
        if value == 0 {
            return 0;
        }
        let highest_bit = 63 - value.leading_zeros() as usize;
        (highest_bit + 1).min(HISTOGRAM_BUCKETS)
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }

    pub fn total_sum(&self) -> u64 {
        self.buckets.iter().map(|bucket| bucket.sum).sum()
    }
}

/// Paired open/access histograms over the same row population.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RowAccessHistogram {
    pub opens: PowerOfTwoHistogram,
    pub accesses: PowerOfTwoHistogram,
}

impl RowAccessHistogram {
    pub fn unique_rows(&self) -> u64 {
        self.opens.total_count()
    }

    pub fn total_opens(&self) -> u64 {
        self.opens.total_sum()
    }

    pub fn total_accesses(&self) -> u64 {
        self.accesses.total_sum()
    }
}
