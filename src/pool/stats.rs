// src/pool/stats.rs
//! Pool statistics snapshots.

/// A point-in-time snapshot of [`PooledAllocator`](crate::PooledAllocator) counters.
///
/// Counters are read with relaxed ordering and may be slightly stale under
/// concurrent use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle blocks currently held across all size classes
    pub available: usize,
    /// Blocks freshly allocated from the heap
    pub allocated: usize,
    /// Total allocation requests served
    pub acquired: usize,
    /// Requests served from an idle block
    pub recycled: usize,
    /// Blocks handed back to the pool
    pub returned: usize,
}

impl PoolStats {
    /// Fraction of requests served by recycling an idle block.
    pub fn hit_rate(&self) -> f64 {
        if self.acquired == 0 {
            0.0
        } else {
            self.recycled as f64 / self.acquired as f64
        }
    }
}
