// src/allocator.rs
//! Allocation strategies for owning buffers.
//!
//! A [`Buffer`](crate::Buffer) draws its storage from a [`ByteAllocator`]
//! chosen at construction time. The strategy only decides *where* bytes come
//! from; the buffer's observable behaviour is the same for every strategy.
//!
//! Blocks are plain `Vec<u8>` values whose length is the reserved capacity.
//! Every byte of a block is initialized, so a buffer may expose its whole
//! allocation for callers that fill it in place.

/// A strategy that produces, resizes and releases contiguous byte blocks.
///
/// Implementations must be cheap to clone: a cloned buffer clones its
/// allocator so both copies draw from the same source.
pub trait ByteAllocator: Clone {
    /// Returns a zero-filled block of exactly `len` bytes.
    fn allocate(&self, len: usize) -> Vec<u8>;

    /// Resizes `block` to exactly `len` bytes.
    ///
    /// Content up to `min(block.len(), len)` is preserved and any new tail
    /// is zero-filled. The returned block may live at a different address.
    fn reallocate(&self, mut block: Vec<u8>, len: usize) -> Vec<u8> {
        block.resize(len, 0);
        block
    }

    /// Hands a block back to the strategy once no buffer refers to it.
    fn release(&self, block: Vec<u8>);
}

/// The default strategy: every block comes straight from the global heap.
///
/// # Examples
///
/// ```
/// use tilebuf::{ByteAllocator, HeapAllocator};
///
/// let block = HeapAllocator.allocate(16);
/// assert_eq!(block.len(), 16);
/// assert!(block.iter().all(|&b| b == 0));
/// HeapAllocator.release(block);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapAllocator;

impl ByteAllocator for HeapAllocator {
    #[inline]
    fn allocate(&self, len: usize) -> Vec<u8> {
        vec![0; len]
    }

    #[inline]
    fn release(&self, block: Vec<u8>) {
        drop(block);
    }
}
