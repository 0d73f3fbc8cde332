//! Error type shared by all containers.
//!
//! Lookups that miss are not errors; they return `None` or `false`. This
//! type covers allocation failure, precondition violations reported by the
//! `try_*` entry points, and text conversion failures.

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Capacity arithmetic for `requested` elements does not fit in `usize`.
    CapacityOverflow { requested: usize },
    /// The allocator refused a region of `bytes` bytes.
    Alloc { bytes: usize },
    /// Containers of zero-byte records are not supported.
    ZeroStride,
    /// A record's length does not match the container stride.
    StrideMismatch { expected: usize, actual: usize },
    /// Insertion index past the end of the container.
    IndexOutOfBounds { index: usize, len: usize },
    /// The map already holds a bucket comparing equal to the pushed one.
    DuplicateKey,
    /// Text is not UTF-8; `valid_up_to` bytes decode cleanly.
    InvalidUtf8 { valid_up_to: usize },
    /// Unpaired surrogate at code unit `index`.
    InvalidUtf16 { index: usize },
    /// Not a Unicode scalar value.
    InvalidCodePoint { value: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow: cannot hold {requested} elements")
            }
            Self::Alloc { bytes } => write!(f, "memory allocation of {bytes} bytes failed"),
            Self::ZeroStride => f.write_str("stride must be non-zero"),
            Self::StrideMismatch { expected, actual } => {
                write!(
                    f,
                    "stride mismatch: record is {actual} bytes, container stride is {expected}"
                )
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "insertion index (is {index}) should be <= len (is {len})")
            }
            Self::DuplicateKey => f.write_str("duplicate key"),
            Self::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid utf-8 sequence after {valid_up_to} bytes")
            }
            Self::InvalidUtf16 { index } => write!(f, "unpaired utf-16 surrogate at unit {index}"),
            Self::InvalidCodePoint { value } => write!(f, "invalid code point {value:#x}"),
        }
    }
}

impl std::error::Error for Error {}

/// Terminal path for the infallible entry points.
///
/// Allocation failure aborts through the global handler so the process gets
/// the usual "memory allocation failed" diagnostic; everything else is a
/// broken precondition and panics with the error message.
#[cold]
pub(crate) fn fatal(err: Error) -> ! {
    if let Error::Alloc { bytes } = err {
        if let Ok(layout) = Layout::array::<u8>(bytes) {
            handle_alloc_error(layout);
        }
    }
    panic!("{err}")
}
