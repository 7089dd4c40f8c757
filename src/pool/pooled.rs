// src/pool/pooled.rs
//! Lock-free pooled allocator with power-of-two size classes.
//!
//! # Architecture
//!
//! A request for `len` bytes is rounded up to a size class (a power of two
//! between `min_block_size` and `max_block_size`) and served by:
//!
//! 1. **Idle block** popped from that class's lock-free queue
//! 2. **Fresh allocation** from the global heap (fallback)
//!
//! Requests above `max_block_size` always go to the heap and their blocks
//! are never retained.
//!
//! # Memory Safety
//!
//! Every block is scrubbed with `zeroize` before it is queued for reuse, so
//! the next buffer that receives it cannot observe the previous owner's
//! bytes, and so that a recycled block satisfies the allocator contract of
//! being zero-filled.
//!
//! The per-class counters and queues are not updated in a single
//! transaction. Under heavy concurrency a class may briefly exceed
//! `max_pool_size` by a small constant; this bound is best-effort.

use super::config::PoolConfig;
use super::stats::PoolStats;
use crate::allocator::ByteAllocator;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use zeroize::Zeroize;

/// Wrapper around `crossbeam::SegQueue` that tracks an approximate length.
///
/// The counter and the queue are **not** updated atomically, so `len()` may
/// be briefly stale.  This is acceptable for pool-sizing heuristics.
struct LockFreeQueue<T> {
    items: crossbeam::queue::SegQueue<T>,
    size: AtomicUsize,
}

impl<T> LockFreeQueue<T> {
    fn new() -> Self {
        Self {
            items: crossbeam::queue::SegQueue::new(),
            size: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn push(&self, item: T) {
        self.items.push(item);
        self.size.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn pop(&self) -> Option<T> {
        self.items.pop().inspect(|_| {
            self.size.fetch_sub(1, Ordering::Relaxed);
        })
    }

    #[inline]
    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}

struct PoolCounters {
    allocated: AtomicUsize,
    acquired: AtomicUsize,
    recycled: AtomicUsize,
    returned: AtomicUsize,
}

impl PoolCounters {
    fn new() -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            recycled: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
        }
    }
}

struct PoolInner {
    classes: Vec<LockFreeQueue<Vec<u8>>>,
    config: PoolConfig,
    counters: PoolCounters,
}

impl PoolInner {
    /// Size-class index serving a request of `len` bytes, if pooled.
    fn class_for_request(&self, len: usize) -> Option<usize> {
        if len > self.config.max_block_size {
            return None;
        }
        let class_len = len.max(self.config.min_block_size).next_power_of_two();
        Some(self.class_index(class_len))
    }

    /// Size-class index a released block with `capacity` can serve again.
    fn class_for_release(&self, capacity: usize) -> Option<usize> {
        if capacity < self.config.min_block_size {
            return None;
        }
        // Largest class that fits inside the block.
        let class_len = 1usize << (usize::BITS - 1 - capacity.leading_zeros());
        if class_len > self.config.max_block_size {
            return None;
        }
        Some(self.class_index(class_len))
    }

    #[inline]
    fn class_index(&self, class_len: usize) -> usize {
        (class_len.trailing_zeros() - self.config.min_block_size.trailing_zeros()) as usize
    }

    #[inline]
    fn class_len(&self, index: usize) -> usize {
        self.config.min_block_size << index
    }
}

/// Allocation strategy that recycles released blocks.
///
/// `PooledAllocator` is a cheap handle: clones share the same free lists,
/// so every buffer built from one pool feeds blocks back into it. The handle
/// is `Send + Sync` and may be shared across threads, even though each
/// buffer drawing from it is used by one thread at a time.
///
/// # Example
///
/// ```rust
/// use tilebuf::prelude::*;
///
/// let pool = PooledAllocator::new(PoolConfig::default());
///
/// let mut tile = Buffer::new_in(pool.clone());
/// tile.write(&[7u8; 100])?;
/// drop(tile); // the block goes back to the pool
///
/// let mut next = Buffer::new_in(pool.clone());
/// next.write(&[1u8; 100])?;
/// assert_eq!(pool.stats().recycled, 1);
/// # Ok::<(), tilebuf::BufferError>(())
/// ```
#[derive(Clone)]
pub struct PooledAllocator {
    inner: Arc<PoolInner>,
}

impl Default for PooledAllocator {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for PooledAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledAllocator")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl PooledAllocator {
    /// Creates an empty pool. Size-class bounds are rounded up to powers of two.
    pub fn new(config: PoolConfig) -> Self {
        let config = config.normalized();
        let classes = (0..config.class_count())
            .map(|_| LockFreeQueue::new())
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                classes,
                config,
                counters: PoolCounters::new(),
            }),
        }
    }

    /// The effective (normalized) configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Number of idle blocks across all size classes.
    pub fn available(&self) -> usize {
        self.inner.classes.iter().map(LockFreeQueue::len).sum()
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        let c = &self.inner.counters;
        PoolStats {
            available: self.available(),
            allocated: c.allocated.load(Ordering::Relaxed),
            acquired: c.acquired.load(Ordering::Relaxed),
            recycled: c.recycled.load(Ordering::Relaxed),
            returned: c.returned.load(Ordering::Relaxed),
        }
    }

    /// Pre-allocates idle blocks for the size class serving `len`-byte
    /// requests until it holds about `target` blocks (capped at
    /// `max_pool_size`). Does nothing for lengths the pool does not serve.
    pub fn warm(&self, len: usize, target: usize) {
        let Some(index) = self.inner.class_for_request(len) else {
            return;
        };
        let queue = &self.inner.classes[index];
        let class_len = self.inner.class_len(index);
        let target = target.min(self.inner.config.max_pool_size);
        for _ in queue.len()..target {
            queue.push(vec![0; class_len]);
        }
        tracing::trace!(class_len, idle = queue.len(), "warmed pool size class");
    }

    /// Drops every idle block.
    pub fn clear(&self) {
        for queue in &self.inner.classes {
            while queue.pop().is_some() {}
        }
    }
}

impl ByteAllocator for PooledAllocator {
    fn allocate(&self, len: usize) -> Vec<u8> {
        let inner = &*self.inner;
        inner.counters.acquired.fetch_add(1, Ordering::Relaxed);

        let Some(index) = inner.class_for_request(len) else {
            inner.counters.allocated.fetch_add(1, Ordering::Relaxed);
            return vec![0; len];
        };

        let mut block = match inner.classes[index].pop() {
            Some(block) => {
                inner.counters.recycled.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(len, capacity = block.capacity(), "recycled pooled block");
                block
            }
            None => {
                inner.counters.allocated.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(inner.class_len(index))
            }
        };
        // Idle blocks are scrubbed and empty, so this only zero-fills.
        block.clear();
        block.resize(len, 0);
        block
    }

    fn reallocate(&self, mut block: Vec<u8>, len: usize) -> Vec<u8> {
        if len <= block.capacity() {
            block.resize(len, 0);
            return block;
        }
        let mut grown = self.allocate(len);
        let keep = block.len().min(len);
        grown[..keep].copy_from_slice(&block[..keep]);
        self.release(block);
        grown
    }

    fn release(&self, mut block: Vec<u8>) {
        let inner = &*self.inner;
        // Wipes the whole capacity, not just the initialized length.
        block.zeroize();

        let Some(index) = inner.class_for_release(block.capacity()) else {
            return;
        };
        inner.counters.returned.fetch_add(1, Ordering::Relaxed);

        let queue = &inner.classes[index];
        if queue.len() < inner.config.max_pool_size {
            queue.push(block);
        }
        // else: block is already scrubbed and is freed here.
    }
}
