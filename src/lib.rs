// src/lib.rs
//! # Cursor-Based Byte Buffers
//!
//! The byte-buffer layer of an array storage engine: every tile, metadata
//! block and serialized message passes through one of these buffers on its
//! way to or from I/O.
//!
//! Features:
//! - A shared cursor contract ([`BufferBase`]) with bounds-checked reads
//! - An owning buffer ([`Buffer`]) that grows geometrically on demand, or
//!   never grows at all when preallocated
//! - A read-only view ([`ConstBuffer`]) over memory owned elsewhere
//! - A fixed-capacity writer ([`PreallocatedBuffer`]) that never reallocates
//! - Interchangeable allocation strategies: the global heap
//!   ([`HeapAllocator`]) or a lock-free recycling pool ([`PooledAllocator`])
//!   that scrubs blocks with `zeroize` before reuse
//!
//! Recoverable failures (reading past the end, overflowing a fixed buffer,
//! writing to borrowed memory) come back as [`BufferError`]. Contract
//! violations, such as growing a preallocated buffer or seeking past the
//! end, panic.
//!
//! Buffers are plain single-threaded values; share them across threads only
//! with external synchronization.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod pool;

// Re-export main types
pub use allocator::{ByteAllocator, HeapAllocator};
pub use buffer::{Buffer, BufferBase, ConstBuffer, PooledBuffer, PreallocatedBuffer};
pub use error::{BufferError, Result, ResultExt};
pub use pool::{PoolConfig, PoolStats, PooledAllocator};

/// Commonly used imports.
pub mod prelude {
    pub use crate::allocator::{ByteAllocator, HeapAllocator};
    pub use crate::buffer::{Buffer, BufferBase, ConstBuffer, PooledBuffer, PreallocatedBuffer};
    pub use crate::error::{BufferError, Result, ResultExt};
    pub use crate::pool::{PoolConfig, PoolStats, PooledAllocator};
}
