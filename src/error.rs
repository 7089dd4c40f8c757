// src/error.rs
//! Error types for buffer operations.
//!
//! Only recoverable, I/O-shaped failures travel through [`BufferError`].
//! Contract violations (growing a preallocated buffer, seeking past the end)
//! are programmer errors and panic instead.

use std::fmt;

/// Recoverable errors reported by buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A read requested more bytes than remain between the read position and the size
    ReadOverflow,
    /// A write to a fixed-capacity buffer requested more bytes than remain
    PreallocatedOverflow,
    /// A mutating operation was invoked on a buffer that borrows its storage
    NotOwned,
    /// I/O error (for compatibility)
    Io(String),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOverflow => {
                write!(f, "Read buffer overflow; may not read beyond buffer size")
            }
            Self::PreallocatedOverflow => write!(f, "Write would overflow buffer"),
            Self::NotOwned => write!(f, "Buffer does not own the underlying data"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BufferError {}

impl BufferError {
    /// Returns `true` for the "no space" family of errors, as opposed to
    /// "not allowed to write here".
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::ReadOverflow | Self::PreallocatedOverflow)
    }
}

/// Convert BufferError to std::io::Error
impl From<BufferError> for std::io::Error {
    fn from(err: BufferError) -> Self {
        use std::io::ErrorKind;
        match err {
            BufferError::ReadOverflow => std::io::Error::new(ErrorKind::UnexpectedEof, err),
            BufferError::PreallocatedOverflow => std::io::Error::new(ErrorKind::WriteZero, err),
            BufferError::NotOwned => std::io::Error::new(ErrorKind::PermissionDenied, err),
            BufferError::Io(msg) => std::io::Error::other(msg),
        }
    }
}

/// Convert std::io::Error to BufferError
impl From<std::io::Error> for BufferError {
    fn from(err: std::io::Error) -> Self {
        BufferError::Io(err.to_string())
    }
}

/// Convert BufferError to anyhow::Error
#[cfg(feature = "anyhow")]
impl From<BufferError> for anyhow::Error {
    fn from(err: BufferError) -> Self {
        anyhow::anyhow!("{}", err)
    }
}

/// Result type alias for buffer operations
///
/// Note: When using with other Result types (like anyhow::Result),
/// either qualify the type (`tilebuf::Result<T>`) or use the conversion traits.
pub type Result<T> = std::result::Result<T, BufferError>;

/// Extension trait for converting Results between different error types
pub trait ResultExt<T> {
    /// Convert to anyhow::Result
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T>;

    /// Convert to io::Result
    fn into_io(self) -> std::io::Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| e.into())
    }

    fn into_io(self) -> std::io::Result<T> {
        self.map_err(|e| e.into())
    }
}

/// Maps the error of a buffer operation into another error type.
///
/// The two-argument form names the target type explicitly, which is needed
/// for targets such as `anyhow::Error` that have overlapping `From` impls.
///
/// # Example
/// ```
/// use tilebuf::prelude::*;
/// use tilebuf::buffer_op;
///
/// fn serialize_header() -> std::io::Result<()> {
///     let mut buf = Buffer::new();
///     buffer_op!(buf.write(b"TDB1"))?;
///     Ok(())
/// }
/// # serialize_header().unwrap();
/// ```
#[macro_export]
macro_rules! buffer_op {
    ($expr:expr, $target:ty) => {
        $expr.map_err(|e: $crate::BufferError| -> $target { e.into() })
    };
    ($expr:expr) => {
        $expr.map_err(|e: $crate::BufferError| -> std::io::Error { e.into() })
    };
}

/// Try a buffer operation with automatic error conversion
#[macro_export]
macro_rules! buffer_try {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => return Err(e.into()),
        }
    };
}
