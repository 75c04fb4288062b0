use super::config::SchedulerConfig;
use super::request::QueuedRequest;

/// Pending requests that target one DRAM row.
///
/// Members are block-distinct: an incoming request for an already-queued
/// block coalesces into the existing entry instead of growing the bucket.
#[derive(Debug, Default)]
pub(crate) struct RowBucket {
    requests: Vec<QueuedRequest>,
    score: f64,
    accessed: bool,
}

/// What happened to a request offered to a bucket.
pub(crate) enum BucketAdd {
    Added,
    Coalesced { upgraded: bool },
}

impl RowBucket {
    pub(crate) fn new(first: QueuedRequest, config: &SchedulerConfig) -> Self {
        let mut bucket = Self {
            requests: vec![first],
            score: 0.0,
            accessed: false,
        };
        bucket.rescore(config);
        bucket
    }

    pub(crate) fn add(&mut self, incoming: QueuedRequest, config: &SchedulerConfig) -> BucketAdd {
        if let Some(existing) = self
            .requests
            .iter_mut()
            .find(|queued| queued.block == incoming.block)
        {
            let upgraded = incoming.request.confidence > existing.request.confidence;
            if upgraded {
                existing.request.confidence = incoming.request.confidence;
                existing.request.metadata = incoming.request.metadata;
                self.rescore(config);
            }
            return BucketAdd::Coalesced { upgraded };
        }

        self.requests.push(incoming);
        self.rescore(config);
        BucketAdd::Added
    }

    /// density rewards consolidated rows, confidence rewards trusted ones
    fn rescore(&mut self, config: &SchedulerConfig) {
        if self.requests.is_empty() {
            self.score = 0.0;
            return;
        }

        let row_buffer = config.row_buffer_size.max(1) as f64;
        let density = (self.requests.len() as f64 / row_buffer).min(1.0);

        let sum: u64 = self
            .requests
            .iter()
            .map(|queued| queued.request.confidence as u64)
            .sum();
        let max_confidence = config.max_confidence.max(1) as f64;
        let mean_confidence =
            (sum as f64 / self.requests.len() as f64 / max_confidence).clamp(0.0, 1.0);

        self.score = config.density_weight * density + config.confidence_weight * mean_confidence;
    }

    pub(crate) fn score(&self) -> f64 {
        self.score
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> &QueuedRequest {
        &self.requests[index]
    }

    /// Index of the highest-confidence member; the earliest-added wins ties.
    pub(crate) fn best_index(&self) -> Option<usize> {
        let mut best = None;
        let mut best_confidence = 0;
        for (index, queued) in self.requests.iter().enumerate() {
            if best.is_none() || queued.request.confidence > best_confidence {
                best = Some(index);
                best_confidence = queued.request.confidence;
            }
        }
        best
    }

    /// Retires one member, preserving the order of the rest.
    pub(crate) fn take(&mut self, index: usize, config: &SchedulerConfig) -> QueuedRequest {
        let taken = self.requests.remove(index);
        self.rescore(config);
        taken
    }

    /// Flags the bucket as demand-accessed. Returns true the first time.
    pub(crate) fn mark_accessed(&mut self) -> bool {
        let newly = !self.accessed;
        self.accessed = true;
        newly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::request::RowOpenRequest;

    fn config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    fn queued(addr: u64, confidence: u32) -> QueuedRequest {
        QueuedRequest {
            request: RowOpenRequest::new(addr, confidence, 0),
            block: addr >> 6,
        }
    }

    #[test]
    fn score_combines_density_and_confidence() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 8), &config);
        bucket.add(queued(0x1040, 16), &config);
        // density = 2/128, mean confidence = 12/16
        let expected = 0.6 * (2.0 / 128.0) + 0.4 * 0.75;
        assert!((bucket.score() - expected).abs() < 1e-12);
    }

    #[test]
    fn coalesce_upgrades_confidence_monotonically() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 10), &config);

        assert!(matches!(
            bucket.add(queued(0x1000, 3), &config),
            BucketAdd::Coalesced { upgraded: false }
        ));
        assert_eq!(bucket.get(0).request.confidence, 10);

        assert!(matches!(
            bucket.add(queued(0x1000, 12), &config),
            BucketAdd::Coalesced { upgraded: true }
        ));
        assert_eq!(bucket.get(0).request.confidence, 12);
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn coalesce_with_equal_confidence_is_not_an_upgrade() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 7), &config);
        assert!(matches!(
            bucket.add(queued(0x1000, 7), &config),
            BucketAdd::Coalesced { upgraded: false }
        ));
    }

    #[test]
    fn best_index_prefers_earliest_of_equal_confidence() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 8), &config);
        bucket.add(queued(0x1040, 8), &config);
        bucket.add(queued(0x1080, 8), &config);
        assert_eq!(bucket.best_index(), Some(0));

        bucket.add(queued(0x10C0, 9), &config);
        assert_eq!(bucket.best_index(), Some(3));
    }

    #[test]
    fn take_rescores_remaining_members() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 16), &config);
        bucket.add(queued(0x1040, 0), &config);
        let two_member_score = bucket.score();

        let taken = bucket.take(0, &config);
        assert_eq!(taken.request.addr, 0x1000);
        assert_eq!(bucket.len(), 1);
        assert!(bucket.score() < two_member_score);
    }

    #[test]
    fn mark_accessed_reports_only_first_access() {
        let config = config();
        let mut bucket = RowBucket::new(queued(0x1000, 1), &config);
        assert!(bucket.mark_accessed());
        assert!(!bucket.mark_accessed());
    }
}
