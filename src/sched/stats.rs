use serde::Serialize;
use std::ops::AddAssign;

use crate::Cycle;

/// Lifetime counters for one scheduler instance.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SchedulerStats {
    requests_added: u64,
    duplicates_detected: u64,
    confidence_updates: u64,
    dropped_full_queue: u64,
    pruned_expired: u64,
    issued_success: u64,
    issue_failures: u64,
    total_delay_cycles: u64,
}

impl SchedulerStats {
    pub fn requests_added(&self) -> u64 {
        self.requests_added
    }

    pub fn duplicates_detected(&self) -> u64 {
        self.duplicates_detected
    }

    pub fn confidence_updates(&self) -> u64 {
        self.confidence_updates
    }

    pub fn dropped_full_queue(&self) -> u64 {
        self.dropped_full_queue
    }

    pub fn pruned_expired(&self) -> u64 {
        self.pruned_expired
    }

    pub fn issued_success(&self) -> u64 {
        self.issued_success
    }

    pub fn issue_failures(&self) -> u64 {
        self.issue_failures
    }

    pub fn total_delay_cycles(&self) -> u64 {
        self.total_delay_cycles
    }

    /// Mean queue residence (past the ready cycle) of issued requests.
    pub fn average_delay(&self) -> f64 {
        if self.issued_success == 0 {
            return 0.0;
        }
        self.total_delay_cycles as f64 / self.issued_success as f64
    }

    pub fn issue_success_rate(&self) -> f64 {
        let attempts = self.issued_success + self.issue_failures;
        if attempts == 0 {
            return 0.0;
        }
        self.issued_success as f64 / attempts as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn record_added(&mut self) {
        self.requests_added = self.requests_added.saturating_add(1);
    }

    pub(crate) fn record_duplicate(&mut self, upgraded: bool) {
        self.duplicates_detected = self.duplicates_detected.saturating_add(1);
        if upgraded {
            self.confidence_updates = self.confidence_updates.saturating_add(1);
        }
    }

    pub(crate) fn record_dropped_full(&mut self) {
        self.dropped_full_queue = self.dropped_full_queue.saturating_add(1);
    }

    pub(crate) fn record_pruned(&mut self, count: u64) {
        self.pruned_expired = self.pruned_expired.saturating_add(count);
    }

    pub(crate) fn record_issue(&mut self, residence: Cycle) {
        self.issued_success = self.issued_success.saturating_add(1);
        self.total_delay_cycles = self.total_delay_cycles.saturating_add(residence);
    }

    pub(crate) fn record_issue_failure(&mut self) {
        self.issue_failures = self.issue_failures.saturating_add(1);
    }

    /// Folds another instance's counters in, for hosts that run one
    /// scheduler per channel or per prefetcher.
    pub fn accumulate_from(&mut self, other: &SchedulerStats) {
        *self += other;
    }
}

impl AddAssign<&SchedulerStats> for SchedulerStats {
    fn add_assign(&mut self, other: &SchedulerStats) {
        self.requests_added = self.requests_added.saturating_add(other.requests_added);
        self.duplicates_detected = self
            .duplicates_detected
            .saturating_add(other.duplicates_detected);
        self.confidence_updates = self
            .confidence_updates
            .saturating_add(other.confidence_updates);
        self.dropped_full_queue = self
            .dropped_full_queue
            .saturating_add(other.dropped_full_queue);
        self.pruned_expired = self.pruned_expired.saturating_add(other.pruned_expired);
        self.issued_success = self.issued_success.saturating_add(other.issued_success);
        self.issue_failures = self.issue_failures.saturating_add(other.issue_failures);
        self.total_delay_cycles = self
            .total_delay_cycles
            .saturating_add(other.total_delay_cycles);
    }
}

impl AddAssign<SchedulerStats> for SchedulerStats {
    fn add_assign(&mut self, other: SchedulerStats) {
        *self += &other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_metrics_handle_zero_denominators() {
        let stats = SchedulerStats::default();
        assert_eq!(stats.average_delay(), 0.0);
        assert_eq!(stats.issue_success_rate(), 0.0);
    }

    #[test]
    fn derived_metrics_divide_correctly() {
        let mut stats = SchedulerStats::default();
        stats.record_issue(4);
        stats.record_issue(2);
        stats.record_issue_failure();
        assert!((stats.average_delay() - 3.0).abs() < 1e-12);
        assert!((stats.issue_success_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn accumulate_sums_counters() {
        let mut a = SchedulerStats::default();
        a.record_added();
        a.record_issue(5);

        let mut b = SchedulerStats::default();
        b.record_added();
        b.record_duplicate(true);
        b.record_pruned(3);

        a.accumulate_from(&b);
        assert_eq!(a.requests_added(), 2);
        assert_eq!(a.duplicates_detected(), 1);
        assert_eq!(a.confidence_updates(), 1);
        assert_eq!(a.pruned_expired(), 3);
        assert_eq!(a.issued_success(), 1);
        assert_eq!(a.total_delay_cycles(), 5);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = SchedulerStats::default();
        stats.record_added();
        stats.record_dropped_full();
        stats.record_issue(9);
        stats.reset();
        assert_eq!(stats.requests_added(), 0);
        assert_eq!(stats.dropped_full_queue(), 0);
        assert_eq!(stats.issued_success(), 0);
        assert_eq!(stats.total_delay_cycles(), 0);
    }
}
