use crate::Cycle;

use super::config::PatternSpec;

/// A candidate the traffic source hands to the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub addr: u64,
    pub confidence: u32,
    pub delay: Cycle,
}

/// Walks one configured stride stream, emitting a fixed number of
/// candidates per cycle once its start cycle is reached.
#[derive(Debug)]
pub struct StrideStream {
    next_addr: u64,
    stride: i64,
    requests_per_cycle: u32,
    confidence: u32,
    delay: Cycle,
    start_cycle: Cycle,
}

impl StrideStream {
    pub fn new(spec: &PatternSpec) -> Self {
        Self {
            next_addr: spec.base,
            stride: spec.stride,
            requests_per_cycle: spec.requests_per_cycle,
            confidence: spec.confidence,
            delay: spec.delay,
            start_cycle: spec.start_cycle,
        }
    }

    pub fn emit(&mut self, now: Cycle, out: &mut Vec<Candidate>) {
        if now < self.start_cycle {
            return;
        }
        for _ in 0..self.requests_per_cycle {
            out.push(Candidate {
                addr: self.next_addr,
                confidence: self.confidence,
                delay: self.delay,
            });
            self.next_addr = self.next_addr.wrapping_add_signed(self.stride);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_strided_addresses() {
        let spec = PatternSpec {
            base: 0x1000,
            stride: 64,
            requests_per_cycle: 2,
            ..PatternSpec::default()
        };
        let mut stream = StrideStream::new(&spec);
        let mut out = Vec::new();
        stream.emit(0, &mut out);
        stream.emit(1, &mut out);
        let addrs: Vec<u64> = out.iter().map(|candidate| candidate.addr).collect();
        assert_eq!(addrs, vec![0x1000, 0x1040, 0x1080, 0x10C0]);
    }

    #[test]
    fn silent_before_start_cycle() {
        let spec = PatternSpec {
            start_cycle: 10,
            ..PatternSpec::default()
        };
        let mut stream = StrideStream::new(&spec);
        let mut out = Vec::new();
        stream.emit(9, &mut out);
        assert!(out.is_empty());
        stream.emit(10, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn negative_stride_walks_down() {
        let spec = PatternSpec {
            base: 0x2000,
            stride: -64,
            ..PatternSpec::default()
        };
        let mut stream = StrideStream::new(&spec);
        let mut out = Vec::new();
        stream.emit(0, &mut out);
        stream.emit(1, &mut out);
        assert_eq!(out[1].addr, 0x1FC0);
    }
}
