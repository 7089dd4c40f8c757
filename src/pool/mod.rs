// src/pool/mod.rs
//! Pooled allocation strategy.

mod config;
mod pooled;
mod stats;

pub use config::PoolConfig;
pub use pooled::PooledAllocator;
pub use stats::PoolStats;
