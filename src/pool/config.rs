// src/pool/config.rs
//! Pool sizing configuration.

/// Configuration for a [`PooledAllocator`](crate::PooledAllocator).
///
/// Blocks are bucketed into power-of-two size classes between
/// `min_block_size` and `max_block_size`. Requests outside that range are
/// served by the global heap and never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Smallest size class; smaller requests are rounded up to it
    pub min_block_size: usize,
    /// Largest size class the pool will retain
    pub max_block_size: usize,
    /// Maximum idle blocks kept per size class
    pub max_pool_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_block_size: 64,
            max_block_size: 4 * 1024 * 1024, // 4MB
            max_pool_size: 64,
        }
    }
}

impl PoolConfig {
    /// Normalizes the class bounds to powers of two with `min <= max`.
    pub(crate) fn normalized(mut self) -> Self {
        const TOP_CLASS: usize = 1 << (usize::BITS - 1);
        self.min_block_size = self
            .min_block_size
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(TOP_CLASS);
        self.max_block_size = self
            .max_block_size
            .max(self.min_block_size)
            .checked_next_power_of_two()
            .unwrap_or(TOP_CLASS);
        self
    }

    /// Number of size classes between the two bounds, inclusive.
    pub(crate) fn class_count(&self) -> usize {
        (self.max_block_size.trailing_zeros() - self.min_block_size.trailing_zeros()) as usize + 1
    }
}
