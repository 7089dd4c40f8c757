// src/buffer/view.rs
//! Read-only views over memory owned elsewhere.

use super::base::{BufferBase, sealed::Region};
use super::owned::Buffer;
use crate::allocator::ByteAllocator;

/// A read-only cursor over borrowed bytes.
///
/// A view never owns or mutates its source and always starts at offset 0.
/// It is the usual source when copying into a [`Buffer`] with
/// [`Buffer::write_from`] or [`Buffer::write_from_exact`].
///
/// # Examples
///
/// ```
/// use tilebuf::prelude::*;
///
/// let mut out = Buffer::new();
/// out.write(b"tile header")?;
///
/// let mut view = ConstBuffer::from_buffer(&out);
/// assert_eq!(view.nbytes_left_to_read(), 11);
///
/// let mut magic = [0u8; 4];
/// view.read(&mut magic)?;
/// assert_eq!(&magic, b"tile");
/// # Ok::<(), BufferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConstBuffer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ConstBuffer<'a> {
    /// Creates a view over `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Creates a view over the current valid bytes of `buffer`.
    ///
    /// The view captures `buffer.data()` as it is now; the borrow keeps the
    /// source from growing while the view is alive.
    #[inline]
    pub fn from_buffer<A: ByteAllocator>(buffer: &'a Buffer<'_, A>) -> Self {
        Self::new(buffer.data())
    }
}

impl<'a> From<&'a [u8]> for ConstBuffer<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl Region for ConstBuffer<'_> {
    #[inline]
    fn region(&self) -> Option<&[u8]> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data)
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

impl BufferBase for ConstBuffer<'_> {}
