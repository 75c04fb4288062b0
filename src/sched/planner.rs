use std::mem;
use std::sync::Arc;

use crate::dram::RowCoord;
use crate::Cycle;

use super::config::SchedulerConfig;
use super::group::ReadyGroup;
use super::history::RowHistory;
use super::request::RowOpenRequest;
use super::stats::SchedulerStats;
use super::usage::UsageTracker;
use super::RowOpenScheduler;

/// One row in the current group's issue order. `spent` marks rows that
/// already got their one chance this tick, issued or refused.
struct Candidate {
    coord: RowCoord,
    score: f64,
    spent: bool,
}

impl RowOpenScheduler {
    /// Drops every group whose slack window has closed. A group at the
    /// exact boundary (`now == ready + slack`) is still issuable.
    pub(super) fn prune_expired(&mut self, now: Cycle) {
        let cutoff = now.saturating_sub(self.config.slack);
        let expires = self
            .groups
            .first_key_value()
            .is_some_and(|(&ready_at, _)| ready_at < cutoff);
        if !expires {
            return;
        }

        let live = self.groups.split_off(&cutoff);
        let expired = mem::replace(&mut self.groups, live);
        for group in expired.values() {
            let count = group.request_count();
            self.queued -= count;
            self.stats.record_pruned(count as u64);
        }
    }

    pub(super) fn issue_ready<F>(&mut self, now: Cycle, budget: usize, mut try_issue: F)
    where
        F: FnMut(&RowOpenRequest) -> bool,
    {
        if budget == 0 || self.groups.is_empty() {
            return;
        }

        let config = Arc::clone(&self.config);
        let mut usage = UsageTracker::default();
        let mut issued = 0;
        let mut drained = Vec::new();

        for (&ready_at, group) in self.groups.iter_mut() {
            if ready_at > now {
                break;
            }

            issued += issue_from_group(
                group,
                ready_at,
                now,
                budget - issued,
                &config,
                &mut usage,
                &mut self.stats,
                &mut self.history,
                &mut try_issue,
            );

            if group.is_empty() {
                drained.push(ready_at);
            }
            if issued == budget {
                break;
            }
        }

        for ready_at in drained {
            self.groups.remove(&ready_at);
        }
        self.queued -= issued;
    }
}

/// Issues up to `quota` opens from one ready group, spreading them across
/// channels and ranks and never targeting a bank twice in a tick.
fn issue_from_group<F>(
    group: &mut ReadyGroup,
    ready_at: Cycle,
    now: Cycle,
    quota: usize,
    config: &SchedulerConfig,
    usage: &mut UsageTracker,
    stats: &mut SchedulerStats,
    history: &mut RowHistory,
    try_issue: &mut F,
) -> usize
where
    F: FnMut(&RowOpenRequest) -> bool,
{
    let mut candidates: Vec<Candidate> = group
        .rows()
        .iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(coord, bucket)| Candidate {
            coord: *coord,
            score: bucket.score(),
            spent: false,
        })
        .collect();
    // stable sort: equal scores keep the coordinate order of the row map
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut issued = 0;
    while issued < quota {
        let Some(pick) = select_candidate(&candidates, usage) else {
            break;
        };
        candidates[pick].spent = true;
        let coord = candidates[pick].coord;

        let Some(bucket) = group.bucket_mut(&coord) else {
            continue;
        };
        let Some(best) = bucket.best_index() else {
            continue;
        };

        if try_issue(&bucket.get(best).request) {
            stats.record_issue(now - ready_at);
            usage.record(&coord);
            if config.track_row_history {
                history.record_open(&coord);
            }
            bucket.take(best, config);
            if bucket.is_empty() {
                group.remove_row(&coord);
            }
            issued += 1;
        } else {
            stats.record_issue_failure();
        }
    }

    issued
}

/// Picks the unspent candidate with a free bank that minimises, in order,
/// this tick's channel use then rank use. The candidate list is already in
/// score-then-coordinate order, so the scan's first strict improvement wins
/// remaining ties.
fn select_candidate(candidates: &[Candidate], usage: &UsageTracker) -> Option<usize> {
    let mut best = None;
    let mut best_channel = u32::MAX;
    let mut best_rank = u32::MAX;

    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.spent || usage.bank_in_use(candidate.coord.bank) {
            continue;
        }

        let channel = usage.channel_usage(candidate.coord.channel);
        let rank = usage.rank_usage(candidate.coord.rank);
        if channel < best_channel || (channel == best_channel && rank < best_rank) {
            best = Some(index);
            best_channel = channel;
            best_rank = rank;
        }
    }

    best
}
