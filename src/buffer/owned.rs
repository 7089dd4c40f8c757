// src/buffer/owned.rs
//! Owning, geometrically growing buffers.
//!
//! [`Buffer`] accumulates serialized output. Its storage is either an
//! allocation it owns, drawn from a [`ByteAllocator`], or a caller-supplied
//! slice it merely wraps. Only owned storage can be written or grown.

use std::fmt;
use std::mem;

use super::base::{BufferBase, sealed::Region};
use super::view::ConstBuffer;
use crate::allocator::{ByteAllocator, HeapAllocator};
use crate::error::{BufferError, Result};

enum Storage<'a> {
    /// Allocation owned by the buffer; its length is the reserved capacity.
    Owned(Vec<u8>),
    /// Memory owned by the caller.
    Borrowed(&'a mut [u8]),
}

impl Storage<'_> {
    #[inline]
    fn allocation(&self) -> &[u8] {
        match self {
            Storage::Owned(block) => block.as_slice(),
            Storage::Borrowed(region) => &region[..],
        }
    }

    #[inline]
    fn allocation_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(block) => block.as_mut_slice(),
            Storage::Borrowed(region) => &mut region[..],
        }
    }

    /// An empty storage of the same kind.
    fn emptied(&self) -> Self {
        match self {
            Storage::Owned(_) => Storage::Owned(Vec::new()),
            Storage::Borrowed(_) => Storage::Borrowed(&mut []),
        }
    }
}

#[inline]
fn end_of(at: usize, nbytes: usize) -> usize {
    match at.checked_add(nbytes) {
        Some(end) => end,
        None => panic!("buffer length overflow: {} + {}", at, nbytes),
    }
}

fn not_owned(op: &'static str) -> BufferError {
    tracing::warn!(op, "cannot write to buffer; buffer does not own its data");
    BufferError::NotOwned
}

/// A growable byte buffer with a read/write cursor.
///
/// Writes land at the cursor, advance it, and extend the logical size.
/// When a write needs more room than is reserved, capacity doubles until
/// it fits, so `k` single-byte writes cost `O(log k)` reallocations.
///
/// A buffer built with [`preallocated`](Self::preallocated) reserves its
/// capacity once and never grows; exceeding it panics. A buffer built with
/// [`wrap`](Self::wrap) borrows caller memory and rejects every write with
/// [`BufferError::NotOwned`].
///
/// The allocation strategy `A` is fixed at construction and only affects
/// where blocks come from.
///
/// # Examples
///
/// ```
/// use tilebuf::prelude::*;
///
/// let mut buf = Buffer::new();
/// buf.write(&42u32.to_le_bytes())?;
/// buf.write(b"cells")?;
/// assert_eq!(buf.size(), 9);
/// assert_eq!(buf.offset(), 9);
///
/// buf.reset_offset();
/// let mut word = [0u8; 4];
/// buf.read(&mut word)?;
/// assert_eq!(u32::from_le_bytes(word), 42);
/// # Ok::<(), BufferError>(())
/// ```
pub struct Buffer<'a, A: ByteAllocator = HeapAllocator> {
    storage: Storage<'a>,
    /// Length of valid data
    size: usize,
    /// Current read/write position
    offset: usize,
    preallocated: bool,
    alloc: A,
}

impl<'a> Buffer<'a, HeapAllocator> {
    /// Creates an empty, growable buffer on the global heap.
    ///
    /// Nothing is allocated until the first write.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebuf::prelude::*;
    ///
    /// let buf = Buffer::new();
    /// assert_eq!(buf.size(), 0);
    /// assert_eq!(buf.alloced_size(), 0);
    /// assert!(buf.as_ptr().is_null());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::new_in(HeapAllocator)
    }

    /// Creates a buffer with exactly `capacity` bytes reserved that will
    /// never grow beyond them.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebuf::prelude::*;
    ///
    /// let mut buf = Buffer::preallocated(8);
    /// assert_eq!(buf.alloced_size(), 8);
    /// buf.write(&[0u8; 8])?;
    /// assert_eq!(buf.free_space(), 0);
    /// # Ok::<(), BufferError>(())
    /// ```
    #[inline]
    pub fn preallocated(capacity: usize) -> Self {
        Self::preallocated_in(capacity, HeapAllocator)
    }

    /// Wraps memory owned by the caller. The size is the slice length.
    ///
    /// The buffer can be read and sought, but writes and reallocation fail
    /// with [`BufferError::NotOwned`].
    #[inline]
    pub fn wrap(data: &'a mut [u8]) -> Self {
        Self::wrap_in(data, HeapAllocator)
    }

    /// Takes ownership of `data` as a growable buffer; size is `data.len()`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let size = data.len();
        Self {
            storage: Storage::Owned(data),
            size,
            offset: 0,
            preallocated: false,
            alloc: HeapAllocator,
        }
    }
}

impl Default for Buffer<'_, HeapAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: ByteAllocator> Buffer<'a, A> {
    /// Creates an empty, growable buffer drawing storage from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            storage: Storage::Owned(Vec::new()),
            size: 0,
            offset: 0,
            preallocated: false,
            alloc,
        }
    }

    /// Like [`Buffer::preallocated`] with an explicit allocator.
    pub fn preallocated_in(capacity: usize, alloc: A) -> Self {
        let block = alloc.allocate(capacity);
        Self {
            storage: Storage::Owned(block),
            size: 0,
            offset: 0,
            preallocated: true,
            alloc,
        }
    }

    /// Like [`Buffer::wrap`] with an explicit allocator.
    ///
    /// The allocator is never asked for memory by a wrapping buffer; it is
    /// carried so the buffer type matches its owning siblings.
    pub fn wrap_in(data: &'a mut [u8], alloc: A) -> Self {
        let size = data.len();
        Self {
            storage: Storage::Borrowed(data),
            size,
            offset: 0,
            preallocated: false,
            alloc,
        }
    }

    /// Deep-copies this buffer into storage drawn from `alloc`.
    ///
    /// Ownership mode, the preallocated flag, the capacity and the cursor
    /// carry over. A wrapping buffer has nothing of its own to copy, so its
    /// copy is an empty wrapping buffer.
    pub fn clone_in<B: ByteAllocator>(&self, alloc: B) -> Buffer<'a, B> {
        match &self.storage {
            Storage::Owned(block) => {
                let copy = if block.is_empty() {
                    Vec::new()
                } else {
                    let mut copy = alloc.allocate(block.len());
                    copy.copy_from_slice(block);
                    copy
                };
                Buffer {
                    storage: Storage::Owned(copy),
                    size: self.size,
                    offset: self.offset,
                    preallocated: self.preallocated,
                    alloc,
                }
            }
            Storage::Borrowed(_) => Buffer {
                storage: Storage::Borrowed(&mut []),
                size: 0,
                offset: 0,
                preallocated: self.preallocated,
                alloc,
            },
        }
    }

    /// Moves this buffer's contents into storage drawn from `alloc`.
    ///
    /// Owned bytes are copied into a fresh block and the old block is
    /// released to the old allocator. Wrapped memory is handed over as is.
    pub fn move_in<B: ByteAllocator>(mut self, alloc: B) -> Buffer<'a, B> {
        let storage = mem::replace(&mut self.storage, Storage::Owned(Vec::new()));
        let storage = match storage {
            Storage::Owned(block) => {
                let moved = if block.is_empty() {
                    Vec::new()
                } else {
                    let mut moved = alloc.allocate(block.len());
                    moved.copy_from_slice(&block);
                    moved
                };
                if block.capacity() > 0 {
                    self.alloc.release(block);
                }
                Storage::Owned(moved)
            }
            Storage::Borrowed(region) => Storage::Borrowed(region),
        };
        Buffer {
            storage,
            size: mem::take(&mut self.size),
            offset: mem::take(&mut self.offset),
            preallocated: self.preallocated,
            alloc,
        }
    }

    /// Moves the contents out, leaving this buffer empty but reusable.
    ///
    /// The returned buffer holds the original allocation, size and cursor.
    /// The source keeps its ownership mode and has no allocation, size 0 and
    /// offset 0. With nothing reserved it is no longer preallocated, so later
    /// writes grow it like a fresh [`Buffer::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebuf::prelude::*;
    ///
    /// let mut src = Buffer::new();
    /// src.write(b"abc")?;
    ///
    /// let dst = src.take();
    /// assert_eq!(dst.data(), b"abc");
    /// assert_eq!(src.size(), 0);
    /// assert!(src.as_ptr().is_null());
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn take(&mut self) -> Self {
        let empty = Self {
            storage: self.storage.emptied(),
            size: 0,
            offset: 0,
            preallocated: false,
            alloc: self.alloc.clone(),
        };
        mem::replace(self, empty)
    }

    /// Exchanges all state with `other` in constant time.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns `true` if the buffer owns its storage.
    #[inline]
    pub fn owns_data(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Returns `true` if the capacity was fixed at construction.
    #[inline]
    pub fn is_preallocated(&self) -> bool {
        self.preallocated
    }

    /// The allocation strategy this buffer draws from.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Reserved capacity in bytes. For a wrapping buffer this is the length
    /// of the wrapped slice.
    #[inline]
    pub fn alloced_size(&self) -> usize {
        self.storage.allocation().len()
    }

    /// Reserved bytes beyond the logical size.
    #[inline]
    pub fn free_space(&self) -> usize {
        debug_assert!(self.alloced_size() >= self.size);
        self.alloced_size() - self.size
    }

    /// The whole allocation, from byte 0 to [`alloced_size`](Self::alloced_size).
    ///
    /// Intended for callers that fill the buffer in place and then declare
    /// how much they wrote with [`set_size`](Self::set_size).
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.storage.allocation_mut()
    }

    /// The allocation from the cursor onward, or `None` when there is no
    /// allocation.
    pub fn cur_data_mut(&mut self) -> Option<&mut [u8]> {
        let offset = self.offset;
        let allocation = self.storage.allocation_mut();
        if allocation.is_empty() {
            None
        } else {
            Some(&mut allocation[offset..])
        }
    }

    /// The allocation from `offset` onward, or `None` when there is no
    /// allocation or `offset` lies past it.
    pub fn data_at(&self, offset: usize) -> Option<&[u8]> {
        let allocation = self.storage.allocation();
        if allocation.is_empty() {
            return None;
        }
        allocation.get(offset..)
    }

    /// Extends the logical size by `nbytes` after an in-place fill.
    ///
    /// # Panics
    ///
    /// Panics if the buffer does not own its data, or if the new size
    /// would exceed the allocation.
    pub fn advance_size(&mut self, nbytes: usize) {
        assert!(
            self.owns_data(),
            "advance_size called on a buffer that does not own its data"
        );
        let size = end_of(self.size, nbytes);
        assert!(
            size <= self.alloced_size(),
            "advance_size: size {} exceeds allocation {}",
            size,
            self.alloced_size()
        );
        self.size = size;
    }

    /// Overrides the logical size. The cursor is clamped to the new size.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the allocation.
    pub fn set_size(&mut self, size: usize) {
        assert!(
            size <= self.alloced_size(),
            "set_size: size {} exceeds allocation {}",
            size,
            self.alloced_size()
        );
        self.size = size;
        self.offset = self.offset.min(size);
    }

    /// Resets size and cursor to 0, keeping the allocation for reuse.
    #[inline]
    pub fn reset_size(&mut self) {
        self.offset = 0;
        self.size = 0;
    }

    /// Releases the allocation and resets size and cursor. Idempotent.
    ///
    /// A wrapping buffer forgets its slice without touching it. A
    /// preallocated buffer loses its fixed capacity along with the
    /// allocation and becomes growable.
    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Owned(block) => {
                let block = mem::take(block);
                if block.capacity() > 0 {
                    self.alloc.release(block);
                }
            }
            Storage::Borrowed(region) => *region = &mut [],
        }
        self.preallocated = false;
        self.offset = 0;
        self.size = 0;
    }

    /// Grows the allocation to exactly `nbytes` if it is currently smaller.
    ///
    /// Content is preserved. The allocation never shrinks, and any address
    /// obtained before a growth is invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] for a wrapping buffer.
    pub fn realloc(&mut self, nbytes: usize) -> Result<()> {
        match &mut self.storage {
            Storage::Borrowed(_) => Err(not_owned("realloc")),
            Storage::Owned(block) => {
                if nbytes > block.len() {
                    let old_len = block.len();
                    *block = self.alloc.reallocate(mem::take(block), nbytes);
                    tracing::trace!(from = old_len, to = nbytes, "buffer reallocated");
                }
                Ok(())
            }
        }
    }

    /// Makes sure at least `nbytes` are reserved, doubling the capacity
    /// until it suffices.
    ///
    /// Does nothing when the capacity is already large enough.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] if a wrapping buffer would have to
    /// grow.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is preallocated and `nbytes` exceeds its fixed
    /// capacity.
    pub fn ensure_alloced_size(&mut self, nbytes: usize) -> Result<()> {
        let alloced = self.alloced_size();
        if self.preallocated && nbytes > alloced {
            panic!(
                "Failed to reallocate. Buffer is preallocated to a fixed size \
                 (requested {}, capacity {})",
                nbytes, alloced
            );
        } else if self.preallocated || alloced >= nbytes {
            return Ok(());
        }

        let mut new_alloc_size = if alloced == 0 { nbytes } else { alloced };
        while new_alloc_size < nbytes {
            new_alloc_size = new_alloc_size.saturating_mul(2);
        }
        self.realloc(new_alloc_size)
    }

    /// Copies as much of `src`'s unread bytes as fits in the reserved
    /// capacity after the cursor, without growing.
    ///
    /// Both cursors advance by the number of bytes copied, which is
    /// returned. It is less than `src.nbytes_left_to_read()` when the
    /// capacity runs out.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] for a wrapping buffer.
    pub fn write_from(&mut self, src: &mut ConstBuffer<'_>) -> Result<usize> {
        if !self.owns_data() {
            return Err(not_owned("write_from"));
        }
        let start = self.offset;
        let nbytes = (self.alloced_size() - start).min(src.nbytes_left_to_read());
        let end = start + nbytes;

        src.read(&mut self.storage.allocation_mut()[start..end])?;
        self.offset = end;
        self.size = self.size.max(end);
        Ok(nbytes)
    }

    /// Copies exactly `nbytes` from `src`, growing first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] for a wrapping buffer and
    /// [`BufferError::ReadOverflow`] if `src` has fewer than `nbytes` unread
    /// bytes. The buffer is unchanged in both cases.
    pub fn write_from_exact(&mut self, src: &mut ConstBuffer<'_>, nbytes: usize) -> Result<()> {
        if !self.owns_data() {
            return Err(not_owned("write_from_exact"));
        }
        if nbytes > src.nbytes_left_to_read() {
            tracing::warn!(
                requested = nbytes,
                available = src.nbytes_left_to_read(),
                "read buffer overflow; may not read beyond buffer size"
            );
            return Err(BufferError::ReadOverflow);
        }
        let start = self.offset;
        let end = end_of(start, nbytes);
        self.ensure_alloced_size(end)?;

        src.read(&mut self.storage.allocation_mut()[start..end])?;
        self.offset = end;
        self.size = self.size.max(end);
        Ok(())
    }

    /// Copies `bytes` at the cursor, growing as needed, and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] for a wrapping buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is preallocated and the write does not fit.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.owns_data() {
            return Err(not_owned("write"));
        }
        let start = self.offset;
        let end = end_of(start, bytes.len());
        self.ensure_alloced_size(end)?;

        self.storage.allocation_mut()[start..end].copy_from_slice(bytes);
        self.offset = end;
        self.size = self.size.max(end);
        Ok(())
    }

    /// Copies `bytes` at `offset`, growing as needed, without moving the
    /// cursor.
    ///
    /// Writing past the current size extends it. Bytes in the gap keep
    /// whatever the allocation held, which is zero for fresh storage.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotOwned`] for a wrapping buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is preallocated and the write does not fit.
    pub fn write_at(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        if !self.owns_data() {
            return Err(not_owned("write_at"));
        }
        let end = end_of(offset, bytes.len());
        self.ensure_alloced_size(end)?;

        self.storage.allocation_mut()[offset..end].copy_from_slice(bytes);
        self.size = self.size.max(end);
        Ok(())
    }

    /// Consumes the buffer and returns its valid bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        let size = self.size;
        match &mut self.storage {
            Storage::Owned(block) => {
                let mut block = mem::take(block);
                block.truncate(size);
                block
            }
            Storage::Borrowed(region) => region[..size].to_vec(),
        }
    }
}

impl<A: ByteAllocator> Region for Buffer<'_, A> {
    #[inline]
    fn region(&self) -> Option<&[u8]> {
        let allocation = self.storage.allocation();
        if allocation.is_empty() {
            None
        } else {
            Some(&allocation[..self.size])
        }
    }

    #[inline]
    fn cursor(&self) -> usize {
        self.offset
    }

    #[inline]
    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.offset
    }
}

impl<A: ByteAllocator> BufferBase for Buffer<'_, A> {}

impl<A: ByteAllocator> Clone for Buffer<'_, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.alloc.clone())
    }
}

impl<A: ByteAllocator> Drop for Buffer<'_, A> {
    fn drop(&mut self) {
        if let Storage::Owned(block) = &mut self.storage {
            let block = mem::take(block);
            if block.capacity() > 0 {
                self.alloc.release(block);
            }
        }
    }
}

impl<A: ByteAllocator> AsRef<[u8]> for Buffer<'_, A> {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl<A: ByteAllocator> fmt::Debug for Buffer<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size)
            .field("offset", &self.offset)
            .field("alloced_size", &self.alloced_size())
            .field("owns_data", &self.owns_data())
            .field("preallocated", &self.preallocated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{PoolConfig, PooledAllocator};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Heap allocator that counts how often blocks are resized.
    #[derive(Clone, Default)]
    struct CountingAllocator {
        reallocs: Rc<Cell<usize>>,
    }

    impl ByteAllocator for CountingAllocator {
        fn allocate(&self, len: usize) -> Vec<u8> {
            HeapAllocator.allocate(len)
        }

        fn reallocate(&self, block: Vec<u8>, len: usize) -> Vec<u8> {
            self.reallocs.set(self.reallocs.get() + 1);
            HeapAllocator.reallocate(block, len)
        }

        fn release(&self, block: Vec<u8>) {
            HeapAllocator.release(block)
        }
    }

    #[test]
    fn test_three_writes_concatenate() {
        let mut buf = Buffer::new();
        buf.write(&[1u8; 10]).unwrap();
        buf.write(&[2u8; 10]).unwrap();
        buf.write(&[3u8; 10]).unwrap();
        assert_eq!(buf.size(), 30);
        assert_eq!(buf.offset(), 30);

        let mut out = [0u8; 30];
        buf.read_at(&mut out, 0).unwrap();
        assert_eq!(&out[..10], &[1u8; 10]);
        assert_eq!(&out[10..20], &[2u8; 10]);
        assert_eq!(&out[20..], &[3u8; 10]);
    }

    #[test]
    fn test_geometric_growth() {
        let alloc = CountingAllocator::default();
        let mut buf = Buffer::new_in(alloc.clone());
        for i in 0..1000u32 {
            buf.write(&[i as u8]).unwrap();
            assert!(buf.alloced_size() >= buf.size());
        }
        assert_eq!(buf.size(), 1000);
        // 1 -> 2 -> 4 -> ... -> 1024
        assert_eq!(alloc.reallocs.get(), 11);
        assert_eq!(buf.alloced_size(), 1024);
    }

    #[test]
    fn test_growth_starts_at_request() {
        let mut buf = Buffer::new();
        buf.ensure_alloced_size(100).unwrap();
        assert_eq!(buf.alloced_size(), 100);
        buf.ensure_alloced_size(101).unwrap();
        assert_eq!(buf.alloced_size(), 200);
        buf.ensure_alloced_size(801).unwrap();
        assert_eq!(buf.alloced_size(), 1600);
    }

    #[test]
    fn test_ensure_noop_keeps_address() {
        let mut buf = Buffer::new();
        buf.write(&[9u8; 40]).unwrap();
        let ptr = buf.as_ptr();
        let alloced = buf.alloced_size();

        buf.ensure_alloced_size(alloced).unwrap();
        buf.ensure_alloced_size(1).unwrap();
        assert_eq!(buf.as_ptr(), ptr);
        assert_eq!(buf.size(), 40);
    }

    #[test]
    fn test_realloc_exact_and_never_shrinks() {
        let mut buf = Buffer::new();
        buf.write(b"keep").unwrap();
        buf.realloc(37).unwrap();
        assert_eq!(buf.alloced_size(), 37);
        assert_eq!(buf.data(), b"keep");

        buf.realloc(5).unwrap();
        assert_eq!(buf.alloced_size(), 37);
    }

    #[test]
    fn test_write_at_extends_size() {
        let mut buf = Buffer::new();
        buf.write(b"ab").unwrap();
        buf.write_at(b"zz", 6).unwrap();
        assert_eq!(buf.size(), 8);
        assert_eq!(buf.offset(), 2);
        assert_eq!(buf.data(), b"ab\0\0\0\0zz");

        buf.write_at(b"XY", 0).unwrap();
        assert_eq!(buf.size(), 8);
        assert_eq!(&buf.data()[..2], b"XY");
    }

    #[test]
    fn test_overwrite_in_middle_keeps_size() {
        let mut buf = Buffer::new();
        buf.write(b"abcdef").unwrap();
        buf.set_offset(2);
        buf.write(b"ZZ").unwrap();
        assert_eq!(buf.offset(), 4);
        assert_eq!(buf.size(), 6);
        assert_eq!(buf.data(), b"abZZef");
    }

    #[test]
    fn test_preallocated_within_capacity() {
        let mut buf = Buffer::preallocated(16);
        assert!(buf.is_preallocated());
        assert_eq!(buf.size(), 0);
        assert!(!buf.as_ptr().is_null());
        buf.write(&[1u8; 16]).unwrap();
        buf.ensure_alloced_size(16).unwrap();
        assert_eq!(buf.alloced_size(), 16);
        assert_eq!(buf.free_space(), 0);
    }

    #[test]
    #[should_panic(expected = "preallocated to a fixed size")]
    fn test_preallocated_ceiling_panics() {
        let mut buf = Buffer::preallocated(16);
        let _ = buf.write(&[0u8; 17]);
    }

    #[test]
    fn test_preallocated_ceiling_leaves_buffer_intact() {
        let mut buf = Buffer::preallocated(4);
        buf.write(b"abcd").unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = buf.write(b"e");
        }));
        assert!(result.is_err());
        assert_eq!(buf.alloced_size(), 4);
        assert_eq!(buf.size(), 4);
        assert_eq!(buf.data(), b"abcd");
    }

    #[test]
    fn test_wrap_rejects_writes() {
        let mut region = *b"external";
        let mut buf = Buffer::wrap(&mut region);
        assert!(!buf.owns_data());
        assert_eq!(buf.size(), 8);
        assert_eq!(buf.alloced_size(), 8);

        assert_eq!(buf.write(b"x"), Err(BufferError::NotOwned));
        assert_eq!(buf.write_at(b"x", 0), Err(BufferError::NotOwned));
        assert_eq!(buf.realloc(100), Err(BufferError::NotOwned));
        let mut src = ConstBuffer::new(b"abc");
        assert_eq!(buf.write_from(&mut src), Err(BufferError::NotOwned));
        assert_eq!(buf.write_from_exact(&mut src, 1), Err(BufferError::NotOwned));
        assert_eq!(src.offset(), 0);

        let mut out = [0u8; 3];
        buf.read(&mut out).unwrap();
        assert_eq!(&out, b"ext");
    }

    #[test]
    #[should_panic(expected = "does not own its data")]
    fn test_wrap_advance_size_panics() {
        let mut region = [0u8; 4];
        let mut buf = Buffer::wrap(&mut region);
        buf.set_size(2);
        buf.advance_size(1);
    }

    #[test]
    fn test_advance_and_set_size_after_fill() {
        let mut buf = Buffer::new();
        buf.realloc(8).unwrap();
        buf.data_mut()[..3].copy_from_slice(b"abc");
        buf.advance_size(3);
        assert_eq!(buf.data(), b"abc");

        buf.cur_data_mut().unwrap()[..5].copy_from_slice(b"12345");
        buf.set_size(5);
        assert_eq!(buf.data(), b"12345");
        assert_eq!(buf.free_space(), 3);
    }

    #[test]
    fn test_set_size_clamps_cursor() {
        let mut buf = Buffer::new();
        buf.write(b"abcdef").unwrap();
        buf.set_size(2);
        assert_eq!(buf.offset(), 2);
        assert!(buf.end());
    }

    #[test]
    #[should_panic(expected = "exceeds allocation")]
    fn test_set_size_past_allocation_panics() {
        let mut buf = Buffer::preallocated(4);
        buf.set_size(5);
    }

    #[test]
    fn test_reset_size_keeps_allocation() {
        let mut buf = Buffer::new();
        buf.write(&[1u8; 64]).unwrap();
        let ptr = buf.as_ptr();
        buf.reset_size();
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.offset(), 0);
        assert_eq!(buf.alloced_size(), 64);
        assert_eq!(buf.as_ptr(), ptr);
    }

    #[test]
    fn test_clear_idempotent() {
        let mut buf = Buffer::new();
        buf.write(b"data").unwrap();
        buf.clear();
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.alloced_size(), 0);
        assert!(buf.as_ptr().is_null());
        assert!(buf.cur_data().is_none());
        buf.clear();
        assert_eq!(buf.size(), 0);

        buf.write(b"again").unwrap();
        assert_eq!(buf.data(), b"again");
    }

    #[test]
    fn test_clear_wrapped_forgets_region() {
        let mut region = *b"keep me";
        {
            let mut buf = Buffer::wrap(&mut region);
            buf.clear();
            assert_eq!(buf.size(), 0);
            assert!(buf.as_ptr().is_null());
        }
        assert_eq!(&region, b"keep me");
    }

    #[test]
    fn test_take_transfers_ownership() {
        let mut src = Buffer::new();
        src.write(b"payload").unwrap();
        src.set_offset(3);
        let ptr = src.as_ptr();

        let dst = src.take();
        assert_eq!(dst.data(), b"payload");
        assert_eq!(dst.offset(), 3);
        assert_eq!(dst.as_ptr(), ptr);

        assert_eq!(src.size(), 0);
        assert_eq!(src.offset(), 0);
        assert!(src.as_ptr().is_null());
        assert!(src.owns_data());
    }

    #[test]
    fn test_take_from_preallocated_leaves_growable_source() {
        let mut src = Buffer::preallocated(8);
        src.write(b"ab").unwrap();

        let dst = src.take();
        assert!(dst.is_preallocated());
        assert_eq!(dst.alloced_size(), 8);
        assert!(!src.is_preallocated());

        src.write(b"grows past eight bytes").unwrap();
        assert_eq!(src.data(), b"grows past eight bytes");
        assert_eq!(dst.data(), b"ab");
    }

    #[test]
    fn test_clear_preallocated_becomes_growable() {
        let mut buf = Buffer::preallocated(4);
        buf.write(b"abcd").unwrap();
        buf.clear();
        assert!(!buf.is_preallocated());
        assert_eq!(buf.alloced_size(), 0);

        buf.write(b"more than four").unwrap();
        assert_eq!(buf.data(), b"more than four");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Buffer::new();
        original.write(b"original").unwrap();
        original.set_offset(4);

        let mut copy = original.clone();
        assert_ne!(copy.as_ptr(), original.as_ptr());
        assert_eq!(copy.offset(), 4);
        assert_eq!(copy.alloced_size(), original.alloced_size());

        copy.write_at(b"XXXX", 0).unwrap();
        assert_eq!(original.data(), b"original");
        assert_eq!(copy.data(), b"XXXXinal");
    }

    #[test]
    fn test_clone_preserves_preallocated() {
        let mut buf = Buffer::preallocated(8);
        buf.write(b"ab").unwrap();
        let copy = buf.clone();
        assert!(copy.is_preallocated());
        assert_eq!(copy.alloced_size(), 8);
        assert_eq!(copy.data(), b"ab");
    }

    #[test]
    fn test_clone_of_wrapped_is_empty() {
        let mut region = *b"abc";
        let mut buf = Buffer::wrap(&mut region);
        buf.advance_offset(2);
        let copy = buf.clone();
        assert!(!copy.owns_data());
        assert_eq!(copy.size(), 0);
        assert_eq!(copy.offset(), 0);
    }

    #[test]
    fn test_swap() {
        let mut a = Buffer::new();
        a.write(b"aaa").unwrap();
        let mut b = Buffer::preallocated(4);

        a.swap(&mut b);
        assert!(a.is_preallocated());
        assert_eq!(a.size(), 0);
        assert_eq!(b.data(), b"aaa");
        assert_eq!(b.offset(), 3);
    }

    #[test]
    fn test_write_from_truncates_to_capacity() {
        let mut dst = Buffer::preallocated(4);
        let mut src = ConstBuffer::new(b"abcdef");

        let copied = dst.write_from(&mut src).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(dst.data(), b"abcd");
        assert_eq!(dst.offset(), 4);
        assert_eq!(src.offset(), 4);
        assert_eq!(src.nbytes_left_to_read(), 2);

        // Full: nothing more fits, and nothing is consumed.
        assert_eq!(dst.write_from(&mut src).unwrap(), 0);
        assert_eq!(src.offset(), 4);
    }

    #[test]
    fn test_write_from_on_empty_buffer_copies_nothing() {
        let mut dst = Buffer::new();
        let mut src = ConstBuffer::new(b"abc");
        assert_eq!(dst.write_from(&mut src).unwrap(), 0);
        assert_eq!(dst.size(), 0);
    }

    #[test]
    fn test_write_from_exact_grows() {
        let mut dst = Buffer::new();
        dst.write(b">").unwrap();
        let mut src = ConstBuffer::new(b"0123456789");

        dst.write_from_exact(&mut src, 7).unwrap();
        assert_eq!(dst.data(), b">0123456");
        assert_eq!(src.nbytes_left_to_read(), 3);

        let before = dst.alloced_size();
        assert_eq!(
            dst.write_from_exact(&mut src, 4),
            Err(BufferError::ReadOverflow)
        );
        assert_eq!(dst.alloced_size(), before);
        assert_eq!(dst.size(), 8);
        assert_eq!(src.nbytes_left_to_read(), 3);
    }

    #[test]
    fn test_data_at() {
        let mut buf = Buffer::new();
        assert!(buf.data_at(0).is_none());
        buf.write(b"abcd").unwrap();
        assert_eq!(buf.data_at(2), Some(&b"cd"[..]));
        assert_eq!(buf.data_at(4), Some(&b""[..]));
        assert!(buf.data_at(5).is_none());
    }

    #[test]
    fn test_into_vec() {
        let mut buf = Buffer::new();
        buf.write(&[1, 2, 3]).unwrap();
        assert_eq!(buf.into_vec(), vec![1u8, 2, 3]);

        let buf = Buffer::from_vec(vec![4, 5]);
        assert_eq!(buf.size(), 2);
        assert_eq!(buf.offset(), 0);
        assert_eq!(buf.into_vec(), vec![4u8, 5]);
    }

    #[test]
    fn test_pooled_matches_heap() {
        let pool = PooledAllocator::new(PoolConfig::default());
        let mut heap = Buffer::new();
        let mut pooled = Buffer::new_in(pool.clone());

        for chunk in [&b"alpha"[..], &b"beta"[..], &b""[..], &b"gamma-delta"[..]] {
            heap.write(chunk).unwrap();
            pooled.write(chunk).unwrap();
        }
        heap.write_at(b"!", 30).unwrap();
        pooled.write_at(b"!", 30).unwrap();

        assert_eq!(heap.data(), pooled.data());
        assert_eq!(heap.size(), pooled.size());
        assert_eq!(heap.offset(), pooled.offset());
        assert_eq!(heap.alloced_size(), pooled.alloced_size());
    }

    #[test]
    fn test_pooled_block_returns_on_drop() {
        let pool = PooledAllocator::new(PoolConfig::default());
        {
            let mut buf = Buffer::new_in(pool.clone());
            buf.write(&[0xEE; 200]).unwrap();
        }
        assert_eq!(pool.available(), 1);

        let mut buf = Buffer::preallocated_in(200, pool.clone());
        assert_eq!(pool.stats().recycled, 1);
        assert!(buf.data_mut().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clone_in_and_move_in() {
        let pool = PooledAllocator::new(PoolConfig::default());
        let mut heap = Buffer::new();
        heap.write(b"tile bytes").unwrap();
        heap.set_offset(5);

        let pooled = heap.clone_in(pool.clone());
        assert_eq!(pooled.data(), b"tile bytes");
        assert_eq!(pooled.offset(), 5);

        let back = pooled.move_in(HeapAllocator);
        assert_eq!(back.data(), b"tile bytes");
        assert_eq!(back.offset(), 5);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_clone_and_move_of_empty_buffer_draw_nothing() {
        let pool = PooledAllocator::new(PoolConfig::default());
        let empty = Buffer::new();

        let cloned = empty.clone_in(pool.clone());
        assert_eq!(cloned.alloced_size(), 0);
        assert!(cloned.as_ptr().is_null());

        let moved = Buffer::new().move_in(pool.clone());
        assert_eq!(moved.alloced_size(), 0);

        drop(cloned);
        drop(moved);
        let stats = pool.stats();
        assert_eq!(stats.acquired, 0);
        assert_eq!(stats.allocated, 0);
        assert_eq!(stats.available, 0);
    }
}
