use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic fetch counter. Only the holder of the latest number may apply
/// its result; everything older is stale.
#[derive(Debug, Default)]
pub struct FetchSequence {
    counter: AtomicU64,
}

impl FetchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next sequence number. Must be called before the request is issued.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.current() == seq
    }
}
