use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dram::{AddressMapping, RowCoord};
use crate::Cycle;

mod bucket;
mod group;
mod planner;
mod usage;

pub mod config;
pub mod history;
pub mod request;
pub mod stats;


pub use config::SchedulerConfig;
pub use history::{HistogramBucket, PowerOfTwoHistogram, RowAccessHistogram};
pub use request::{AddOutcome, RowOpenRequest};
pub use stats::SchedulerStats;

use bucket::BucketAdd;
use group::ReadyGroup;
use history::RowHistory;
use request::QueuedRequest;

/// Queues speculative row-open candidates and meters them out to the DRAM
/// controller so predicted rows sit in the sense amplifiers before the
/// demand access arrives.
///
/// The host drives it once per simulated cycle: the prefetcher submits
/// candidates through [`add_request`](Self::add_request), then the host
/// calls [`tick`](Self::tick) with an issue budget and a sink callback.
/// All operations run to completion; the scheduler performs no I/O and
/// spawns nothing.
pub struct RowOpenScheduler {
    config: Arc<SchedulerConfig>,
    mapping: Arc<dyn AddressMapping>,
    groups: BTreeMap<Cycle, ReadyGroup>,
    queued: usize,
    stats: SchedulerStats,
    history: RowHistory,
    last_cycle: Cycle,
}

impl RowOpenScheduler {
    pub fn new(config: Arc<SchedulerConfig>, mapping: Arc<dyn AddressMapping>) -> Self {
        Self {
            config,
            mapping,
            groups: BTreeMap::new(),
            queued: 0,
            stats: SchedulerStats::default(),
            history: RowHistory::default(),
            last_cycle: 0,
        }
    }

    /// Queues a candidate that becomes issuable at `now + delay`.
    ///
    /// A candidate whose cache block is already queued for the same row and
    /// ready cycle coalesces into the existing entry, upgrading its
    /// confidence and metadata if the newcomer's confidence is higher.
    pub fn add_request(&mut self, request: RowOpenRequest, now: Cycle, delay: Cycle) -> AddOutcome {
        self.observe_cycle(now);

        if self.queued >= self.config.capacity {
            self.stats.record_dropped_full();
            return AddOutcome::DroppedFull;
        }

        let ready_at = now.saturating_add(delay);
        let coord = RowCoord::from(self.mapping.locate(request.addr));
        let queued = QueuedRequest {
            block: self.mapping.block_of(request.addr),
            request,
        };

        match self
            .groups
            .entry(ready_at)
            .or_default()
            .add(coord, queued, &self.config)
        {
            BucketAdd::Added => {
                self.queued += 1;
                self.stats.record_added();
                AddOutcome::Accepted
            }
            BucketAdd::Coalesced { upgraded } => {
                self.stats.record_duplicate(upgraded);
                AddOutcome::CoalescedDuplicate
            }
        }
    }

    /// Services the queue for one cycle: prunes groups whose slack window
    /// has closed, then issues up to `budget` opens through `try_issue`.
    ///
    /// `try_issue` returns whether the host accepted the request for
    /// dispatch. A refused request stays queued for later ticks but is not
    /// retried within this one. The callback must not reenter the
    /// scheduler.
    pub fn tick<F>(&mut self, now: Cycle, budget: usize, try_issue: F)
    where
        F: FnMut(&RowOpenRequest) -> bool,
    {
        self.observe_cycle(now);
        self.prune_expired(now);
        self.issue_ready(now, budget, try_issue);
        debug_assert_eq!(
            self.queued,
            self.groups.values().map(ReadyGroup::request_count).sum::<usize>(),
        );
    }

    /// Tells the scheduler a demand access touched `addr`. Returns whether
    /// a queued row matched. The first access to a queued row counts once
    /// towards its access history.
    pub fn record_access(&mut self, addr: u64, now: Cycle) -> bool {
        self.observe_cycle(now);

        let coord = RowCoord::from(self.mapping.locate(addr));
        let mut matched = false;
        let mut newly_marked = false;
        for group in self.groups.values_mut() {
            if let Some(bucket) = group.bucket_mut(&coord) {
                matched = true;
                newly_marked |= bucket.mark_accessed();
            }
        }

        if newly_marked && self.config.track_row_history {
            self.history.record_access(&coord);
        }
        matched
    }

    pub fn size(&self) -> usize {
        self.queued
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Drops every queued request. Configuration and statistics survive.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.queued = 0;
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Per-row open/access counts rendered as power-of-two histograms.
    /// Empty unless `track_row_history` is set.
    pub fn row_histograms(&self) -> RowAccessHistogram {
        self.history.histograms()
    }

    fn observe_cycle(&mut self, now: Cycle) {
        debug_assert!(
            now >= self.last_cycle,
            "cycle moved backwards: {} -> {now}",
            self.last_cycle,
        );
        self.last_cycle = self.last_cycle.max(now);
    }
}
