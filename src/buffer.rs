//! Buffer: type-erased growable array of fixed-stride records.

use crate::bucket::BucketCmp;
use crate::capacity::{checked_capacity_for, scaled_capacity, try_region};
use crate::error::{fatal, Error};
use bytemuck::Pod;
use core::cmp::Ordering;
use core::fmt;

/// Contiguous array of `len` records, each `stride` bytes, inside an owned
/// region sized for `capacity` records.
///
/// Records are opaque bytes. Growth and shrinking follow
/// [`capacity_for`](crate::capacity_for): grow to the next power of two on
/// demand, shrink to `capacity_for(len * 2)` once fewer than a quarter of the
/// slots are live.
#[derive(Clone)]
pub struct Buffer {
    data: Vec<u8>, // always exactly `cap * stride` bytes
    len: usize,
    cap: usize,
    stride: usize,
}

impl Buffer {
    /// Create a buffer of `stride`-byte records with room for
    /// `initial_len` of them. Panics if `stride` is zero.
    pub fn new(stride: usize, initial_len: usize) -> Self {
        Self::try_new(stride, initial_len).unwrap_or_else(|e| fatal(e))
    }

    pub fn try_new(stride: usize, initial_len: usize) -> Result<Self, Error> {
        if stride == 0 {
            return Err(Error::ZeroStride);
        }
        let cap = checked_capacity_for(initial_len).ok_or(Error::CapacityOverflow {
            requested: initial_len,
        })?;
        Ok(Self {
            data: try_region(cap, stride)?,
            len: 0,
            cap,
            stride,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn capacity(&self) -> usize {
        self.cap
    }
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Ensure room for `min_len` records. Aborts if the allocation fails.
    pub fn reserve(&mut self, min_len: usize) {
        if let Err(e) = self.try_reserve(min_len) {
            fatal(e)
        }
    }

    /// Grow to `capacity_for(min_len)` if the current capacity is smaller.
    /// The live prefix is copied into the new region; the old one is freed.
    pub fn try_reserve(&mut self, min_len: usize) -> Result<(), Error> {
        if self.cap >= min_len {
            return Ok(());
        }
        let cap = checked_capacity_for(min_len).ok_or(Error::CapacityOverflow {
            requested: min_len,
        })?;
        self.reallocate(cap)
    }

    /// Shrink to `capacity_for(len * 2)` when fewer than a quarter of the
    /// slots are live.
    pub fn trim(&mut self) {
        if self.cap / 4 <= self.len {
            return;
        }
        let cap = match scaled_capacity(self.len, 2) {
            Ok(cap) => cap,
            Err(e) => fatal(e),
        };
        if cap < self.cap {
            self.data.truncate(cap * self.stride);
            self.data.shrink_to_fit();
            self.cap = cap;
        }
    }

    fn reallocate(&mut self, cap: usize) -> Result<(), Error> {
        let mut data = try_region(cap, self.stride)?;
        let live = self.len * self.stride;
        data[..live].copy_from_slice(&self.data[..live]);
        self.data = data;
        self.cap = cap;
        Ok(())
    }

    #[inline]
    fn span(&self, index: usize) -> core::ops::Range<usize> {
        let start = index * self.stride;
        start..start + self.stride
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index < self.len {
            Some(&self.data[self.span(index)])
        } else {
            None
        }
    }

    /// Record `index` for callers that hold `index < len` as an invariant.
    /// A broken index panics instead of reading as a miss.
    #[inline]
    pub(crate) fn record(&self, index: usize) -> &[u8] {
        assert!(
            index < self.len,
            "record index {index} out of bounds (len {})",
            self.len
        );
        &self.data[self.span(index)]
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index < self.len {
            let span = self.span(index);
            Some(&mut self.data[span])
        } else {
            None
        }
    }

    /// Insert `elem` at `index`, shifting the tail right by one record.
    ///
    /// Panics if `index > len` or `elem.len() != stride`; see
    /// [`Buffer::try_insert`] for the fallible form.
    pub fn insert(&mut self, elem: &[u8], index: usize) {
        if let Err(e) = self.try_insert(elem, index) {
            fatal(e)
        }
    }

    pub fn try_insert(&mut self, elem: &[u8], index: usize) -> Result<(), Error> {
        if elem.len() != self.stride {
            return Err(Error::StrideMismatch {
                expected: self.stride,
                actual: elem.len(),
            });
        }
        if index > self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.try_reserve(self.len + 1)?;
        let at = index * self.stride;
        let end = self.len * self.stride;
        self.data.copy_within(at..end, at + self.stride);
        self.data[at..at + self.stride].copy_from_slice(elem);
        self.len += 1;
        Ok(())
    }

    /// Append `elem` and return its index.
    pub fn push(&mut self, elem: &[u8]) -> usize {
        self.insert(elem, self.len);
        self.len - 1
    }

    /// Remove the record at `index`, closing the gap. Out-of-range indices
    /// are ignored.
    pub fn erase(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        let at = index * self.stride;
        let end = self.len * self.stride;
        self.data.copy_within(at + self.stride..end, at);
        self.len -= 1;
        self.trim();
    }

    /// Index of the first record `cmp(elem, record)` reports equal.
    pub fn find<C: BucketCmp>(&self, elem: &[u8], cmp: C) -> Option<usize> {
        self.iter()
            .position(|rec| cmp.compare(elem, rec) == Ordering::Equal)
    }

    /// Live records in index order.
    pub fn iter(&self) -> core::slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(self.stride)
    }

    /// The live prefix, `len * stride` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len * self.stride]
    }

    /// Append a plain-data value whose size equals the stride.
    pub fn push_pod<T: Pod>(&mut self, value: &T) -> usize {
        self.push(bytemuck::bytes_of(value))
    }

    /// Copy record `index` out as `T`. Panics if `size_of::<T>() != stride`.
    pub fn get_pod<T: Pod>(&self, index: usize) -> Option<T> {
        self.get(index).map(bytemuck::pod_read_unaligned)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("capacity", &self.cap)
            .field("stride", &self.stride)
            .finish()
    }
}
