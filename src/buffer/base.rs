// src/buffer/base.rs
//! The cursor contract shared by every buffer kind.
//!
//! A buffer is a byte region with a logical `size` and a cursor `offset`
//! satisfying `offset <= size`. [`BufferBase`] implements all cursor
//! movement and reads once, on top of three accessors each buffer kind
//! supplies through the crate-private [`sealed::Region`] trait.

use crate::error::{BufferError, Result};

pub(crate) mod sealed {
    /// Raw access to a buffer's region and cursor.
    ///
    /// Implementors guarantee `cursor() <= region().map_or(0, len)`.
    pub trait Region {
        /// The valid bytes `[0, size)`, or `None` when the region has no
        /// allocation behind it.
        fn region(&self) -> Option<&[u8]>;

        /// Current cursor position.
        fn cursor(&self) -> usize;

        /// Mutable cursor position; callers keep it within `[0, size]`.
        fn cursor_mut(&mut self) -> &mut usize;
    }
}

/// Cursor-based read access over a contiguous byte region.
///
/// Implemented by [`Buffer`](crate::Buffer),
/// [`ConstBuffer`](crate::ConstBuffer) and
/// [`PreallocatedBuffer`](crate::PreallocatedBuffer). The trait is sealed.
///
/// # Examples
///
/// ```
/// use tilebuf::prelude::*;
///
/// let mut view = ConstBuffer::new(b"hello world");
/// let mut word = [0u8; 5];
/// view.read(&mut word)?;
/// assert_eq!(&word, b"hello");
///
/// view.advance_offset(100); // saturates at the end
/// assert!(view.end());
/// # Ok::<(), BufferError>(())
/// ```
pub trait BufferBase: sealed::Region {
    /// Number of valid bytes in the region.
    #[inline]
    fn size(&self) -> usize {
        self.region().map_or(0, <[u8]>::len)
    }

    /// Current cursor position.
    #[inline]
    fn offset(&self) -> usize {
        self.cursor()
    }

    /// Moves the cursor back to the start.
    #[inline]
    fn reset_offset(&mut self) {
        *self.cursor_mut() = 0;
    }

    /// Moves the cursor to `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset > self.size()`. Seeking past the end is a logic
    /// error in the caller, not a runtime condition.
    fn set_offset(&mut self, offset: usize) {
        let size = self.size();
        if offset > size {
            panic!("BufferBase::set_offset: offset {} out of range for size {}", offset, size);
        }
        *self.cursor_mut() = offset;
    }

    /// Advances the cursor by `nbytes`, stopping at the end of the region.
    ///
    /// Advancing past the end is a valid "seek to end" and never fails.
    #[inline]
    fn advance_offset(&mut self, nbytes: usize) {
        let size = self.size();
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_add(nbytes).min(size);
    }

    /// Returns `true` when the cursor sits at the end of the region.
    #[inline]
    fn end(&self) -> bool {
        self.cursor() == self.size()
    }

    /// The valid bytes `[0, size)`.
    #[inline]
    fn data(&self) -> &[u8] {
        self.region().unwrap_or(&[])
    }

    /// Address of the first byte, or null when the region has no allocation.
    ///
    /// Any operation that may reallocate invalidates this address.
    #[inline]
    fn as_ptr(&self) -> *const u8 {
        self.region().map_or(std::ptr::null(), <[u8]>::as_ptr)
    }

    /// The valid bytes from the cursor onward, or `None` when the region has
    /// no allocation.
    #[inline]
    fn cur_data(&self) -> Option<&[u8]> {
        let cursor = self.cursor();
        self.region().map(|region| &region[cursor..])
    }

    /// Bytes between the cursor and the end of the region.
    #[inline]
    fn nbytes_left_to_read(&self) -> usize {
        self.size() - self.cursor()
    }

    /// Copies `dst.len()` bytes from the cursor into `dst` and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::ReadOverflow`] if fewer than `dst.len()` bytes
    /// remain. Neither the cursor nor `dst` is modified in that case.
    fn read(&mut self, dst: &mut [u8]) -> Result<()> {
        let cursor = self.cursor();
        self.read_at(dst, cursor)?;
        *self.cursor_mut() = cursor + dst.len();
        Ok(())
    }

    /// Copies `dst.len()` bytes starting at `offset` into `dst` without
    /// moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::ReadOverflow`] if the range
    /// `[offset, offset + dst.len())` is not inside `[0, size)`.
    fn read_at(&self, dst: &mut [u8], offset: usize) -> Result<()> {
        let data = self.data();
        match data.get(offset..).and_then(|rest| rest.get(..dst.len())) {
            Some(src) => {
                dst.copy_from_slice(src);
                Ok(())
            }
            None => {
                tracing::warn!(
                    offset,
                    requested = dst.len(),
                    size = data.len(),
                    "read buffer overflow; may not read beyond buffer size"
                );
                Err(BufferError::ReadOverflow)
            }
        }
    }
}
