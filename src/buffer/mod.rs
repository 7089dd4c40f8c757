// src/buffer/mod.rs
//! Buffer kinds and the cursor contract they share.
//!
//! - [`BufferBase`]: cursor movement and bounds-checked reads
//! - [`Buffer`]: owning, growable, allocator-parametrized
//! - [`ConstBuffer`]: read-only view over borrowed bytes
//! - [`PreallocatedBuffer`]: fixed-capacity writer over borrowed bytes

mod base;
mod fixed;
mod owned;
mod view;

pub use base::BufferBase;
pub use fixed::PreallocatedBuffer;
pub use owned::Buffer;
pub use view::ConstBuffer;

/// An owning buffer that draws its storage from a [`PooledAllocator`](crate::PooledAllocator).
pub type PooledBuffer<'a> = Buffer<'a, crate::pool::PooledAllocator>;
