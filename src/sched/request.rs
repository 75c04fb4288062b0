/// A candidate row-open handed over by the prefetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOpenRequest {
    pub addr: u64,
    pub confidence: u32,
    /// Prefetcher metadata passed through to the issue sink untouched.
    pub metadata: u32,
}

impl RowOpenRequest {
    pub fn new(addr: u64, confidence: u32, metadata: u32) -> Self {
        Self {
            addr,
            confidence,
            metadata,
        }
    }
}

/// Outcome of `RowOpenScheduler::add_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Queued as a new request.
    Accepted,
    /// The same cache block was already queued for that row and ready
    /// cycle; the existing entry may have absorbed a higher confidence.
    CoalescedDuplicate,
    /// The queue is at capacity. The caller may retry on a later cycle.
    DroppedFull,
}

impl AddOutcome {
    /// Whether the candidate is represented in the queue after the call.
    pub fn is_queued(self) -> bool {
        !matches!(self, AddOutcome::DroppedFull)
    }
}

/// A request plus the block number the scheduler resolves once at add
/// time, so the address mapping is never re-queried at issue time. The
/// insertion cycle and ready delay collapse into the enclosing ready
/// group's key.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueuedRequest {
    pub(crate) request: RowOpenRequest,
    pub(crate) block: u64,
}
