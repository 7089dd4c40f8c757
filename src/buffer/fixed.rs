// src/buffer/fixed.rs
//! Fixed-capacity writable buffers over caller-supplied memory.

use super::base::{BufferBase, sealed::Region};
use crate::error::{BufferError, Result};

/// A write cursor over a caller-supplied slice that never reallocates.
///
/// The size is the slice length, fixed at construction. Writes past the
/// end fail with [`BufferError::PreallocatedOverflow`] instead of growing.
///
/// # Examples
///
/// ```
/// use tilebuf::prelude::*;
///
/// let mut header = [0u8; 16];
/// let mut buf = PreallocatedBuffer::new(&mut header);
/// buf.write(&[1u8; 10])?;
/// buf.write(&[2u8; 6])?;
/// assert_eq!(buf.free_space(), 0);
/// assert_eq!(buf.write(&[3]), Err(BufferError::PreallocatedOverflow));
/// # Ok::<(), BufferError>(())
/// ```
#[derive(Debug)]
pub struct PreallocatedBuffer<'a> {
    data: &'a mut [u8],
    offset: usize,
}

impl<'a> PreallocatedBuffer<'a> {
    /// Creates a buffer spanning all of `data`, cursor at 0.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes that can still be written from the cursor.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Copies `bytes` at the cursor and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::PreallocatedOverflow`] if `bytes` does not fit
    /// in [`free_space`](Self::free_space); nothing is copied in that case.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.free_space() {
            return Err(BufferError::PreallocatedOverflow);
        }
        let end = self.offset + bytes.len();
        self.data[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    /// The slice from the cursor to the end, for in-place fills.
    ///
    /// Returns `None` for a zero-length buffer.
    pub fn cur_data_mut(&mut self) -> Option<&mut [u8]> {
        if self.data.is_empty() {
            None
        } else {
            Some(&mut self.data[self.offset..])
        }
    }
}

impl Region for PreallocatedBuffer<'_> {
    #[inline]
    fn region(&self) -> Option<&[u8]> {
        if self.data.is_empty() {
            None
        } else {
            Some(&self.data[..])
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

impl BufferBase for PreallocatedBuffer<'_> {}
