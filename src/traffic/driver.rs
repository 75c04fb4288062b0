use std::collections::VecDeque;
use std::mem;

use log::{debug, info};

use crate::sched::{RowOpenRequest, RowOpenScheduler};
use crate::Cycle;

use super::config::TrafficConfig;
use super::patterns::{Candidate, StrideStream};
use super::sink::{decide, HashSink};

/// Feeds synthetic prefetch candidates into the scheduler every cycle and
/// services it against the mock sink, replaying a slice of the candidates
/// as demand accesses to exercise the row-access bookkeeping.
pub struct TrafficDriver {
    streams: Vec<StrideStream>,
    sink: HashSink,
    budget_per_tick: usize,
    demand_replay_rate: f64,
    seed: u64,
    pending_demand: VecDeque<(Cycle, u64)>,
    scratch: Vec<Candidate>,
}

impl TrafficDriver {
    pub fn new(config: &TrafficConfig) -> Self {
        Self {
            streams: config.patterns.iter().map(StrideStream::new).collect(),
            sink: HashSink::new(config.accept_rate, config.seed),
            budget_per_tick: config.budget_per_tick,
            demand_replay_rate: config.demand_replay_rate,
            seed: config.seed,
            pending_demand: VecDeque::new(),
            scratch: Vec::new(),
        }
    }

    pub fn run(&mut self, scheduler: &mut RowOpenScheduler, cycles: Cycle) {
        for now in 0..cycles {
            self.step(scheduler, now);
        }
        info!(
            "traffic done: sink accepted {} and rejected {} opens",
            self.sink.accepted(),
            self.sink.rejected(),
        );
    }

    pub fn sink(&self) -> &HashSink {
        &self.sink
    }

    fn step(&mut self, scheduler: &mut RowOpenScheduler, now: Cycle) {
        // entries are due in per-pattern order, not queue order
        let mut waiting = VecDeque::with_capacity(self.pending_demand.len());
        while let Some((due, addr)) = self.pending_demand.pop_front() {
            if due > now {
                waiting.push_back((due, addr));
                continue;
            }
            let matched = scheduler.record_access(addr, now);
            debug!("demand access {addr:#x} at {now}: matched queued row = {matched}");
        }
        self.pending_demand = waiting;

        let mut candidates = mem::take(&mut self.scratch);
        candidates.clear();
        for stream in &mut self.streams {
            stream.emit(now, &mut candidates);
        }

        for candidate in &candidates {
            let request = RowOpenRequest::new(candidate.addr, candidate.confidence, 0);
            let outcome = scheduler.add_request(request, now, candidate.delay);
            debug!("candidate {:#x} at {now}: {outcome:?}", candidate.addr);
            if decide(self.demand_replay_rate, candidate.addr ^ self.seed) {
                self.pending_demand
                    .push_back((now.saturating_add(candidate.delay), candidate.addr));
            }
        }
        self.scratch = candidates;

        let sink = &mut self.sink;
        scheduler.tick(now, self.budget_per_tick, |request| {
            sink.try_issue(request.addr)
        });
    }
}
