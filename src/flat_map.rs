//! FlatMap: buckets kept sorted in a [`Buffer`], found by binary search.

use crate::bucket::BucketCmp;
use crate::buffer::Buffer;
use crate::error::{fatal, Error};
use core::cmp::Ordering;
use core::fmt;

/// Sorted associative array over fixed-stride buckets.
///
/// At most one bucket per key: `push` of a key already present returns the
/// stored bucket and leaves the map unchanged. Insertion and removal shift
/// the tail through [`Buffer::insert`] / [`Buffer::erase`], so they share
/// the buffer's growth and trim policy.
#[derive(Clone)]
pub struct FlatMap<C> {
    buckets: Buffer,
    cmp: C,
}

impl<C: BucketCmp> FlatMap<C> {
    pub fn new(stride: usize, initial_len: usize, cmp: C) -> Self {
        Self {
            buckets: Buffer::new(stride, initial_len),
            cmp,
        }
    }

    pub fn try_new(stride: usize, initial_len: usize, cmp: C) -> Result<Self, Error> {
        Ok(Self {
            buckets: Buffer::try_new(stride, initial_len)?,
            cmp,
        })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }
    pub fn stride(&self) -> usize {
        self.buckets.stride()
    }

    pub fn reserve(&mut self, min_len: usize) {
        self.buckets.reserve(min_len)
    }

    pub fn try_reserve(&mut self, min_len: usize) -> Result<(), Error> {
        self.buckets.try_reserve(min_len)
    }

    pub fn trim(&mut self) {
        self.buckets.trim()
    }

    /// Binary search for `key`: `Ok(index)` of the matching bucket, or
    /// `Err(index)` where it would be inserted to keep the order.
    pub fn search(&self, key: &[u8]) -> Result<usize, usize> {
        let mut low = 0;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.cmp.compare(key, self.buckets.record(mid)) {
                Ordering::Greater => low = mid + 1,
                Ordering::Less => high = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let index = self.search(key).ok()?;
        self.buckets.get(index)
    }

    /// Mutable access to a stored bucket. Bytes the comparator reads must
    /// not change, or the order is silently broken.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        let index = self.search(key).ok()?;
        self.buckets.get_mut(index)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.search(key).is_ok()
    }

    /// Insert `bucket` in order. Returns `None` when it was inserted, or the
    /// already stored bucket with an equal key (which is left untouched).
    ///
    /// Panics if `bucket.len() != stride`.
    pub fn push(&mut self, bucket: &[u8]) -> Option<&[u8]> {
        match self.search(bucket) {
            Ok(index) => self.buckets.get(index),
            Err(index) => {
                self.buckets.insert(bucket, index);
                None
            }
        }
    }

    /// Like [`FlatMap::push`], but reports an existing key as
    /// [`Error::DuplicateKey`] and allocation failure as an error.
    pub fn try_push(&mut self, bucket: &[u8]) -> Result<(), Error> {
        match self.search(bucket) {
            Ok(_) => Err(Error::DuplicateKey),
            Err(index) => self.buckets.try_insert(bucket, index),
        }
    }

    /// Remove the bucket matching `key`, copying it into `out`. Returns
    /// whether a bucket was found.
    ///
    /// Panics if a bucket is found and `out.len() != stride`.
    pub fn pop(&mut self, key: &[u8], out: &mut [u8]) -> bool {
        let index = match self.search(key) {
            Ok(index) => index,
            Err(_) => return false,
        };
        if out.len() != self.stride() {
            fatal(Error::StrideMismatch {
                expected: self.stride(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(self.buckets.record(index));
        self.buckets.erase(index);
        true
    }

    /// Buckets in ascending order.
    pub fn iter(&self) -> core::slice::ChunksExact<'_, u8> {
        self.buckets.iter()
    }

    /// The sorted bucket array, `len * stride` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buckets.as_bytes()
    }
}

impl<C> fmt::Debug for FlatMap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMap")
            .field("buckets", &self.buckets)
            .finish_non_exhaustive()
    }
}
