//! Hashing and ordering over opaque bucket bytes.
//!
//! Containers never know what a record means. Maps take a [`BucketCmp`]
//! (three-way ordering) and, for the hash maps, a [`BucketHash`]. Both are
//! implemented for plain closures over `&[u8]`, and by [`PodKey`], which
//! reads a `bytemuck::Pod` key from the front of each bucket.

use bytemuck::Pod;
use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

/// Three-way comparison of two buckets (or a probe key and a bucket).
pub trait BucketCmp {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

impl<F> BucketCmp for F
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self(a, b)
    }
}

/// Hash of a bucket. Buckets comparing equal must hash equal.
pub trait BucketHash {
    fn hash(&self, bucket: &[u8]) -> u64;
}

impl<F> BucketHash for F
where
    F: Fn(&[u8]) -> u64,
{
    #[inline]
    fn hash(&self, bucket: &[u8]) -> u64 {
        self(bucket)
    }
}

/// Typed key stored in the first `size_of::<T>()` bytes of every bucket.
///
/// Compares with `T: Ord` and hashes with `T: Hash` through `S`. Probe keys
/// may be just the key bytes; the rest of the bucket is never read.
pub struct PodKey<T, S = DefaultHashBuilder> {
    hasher: S,
    _key: PhantomData<fn() -> T>,
}

impl<T: Pod> PodKey<T> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<T: Pod> Default for PodKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod, S> PodKey<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            _key: PhantomData,
        }
    }

    /// Number of leading bucket bytes the key occupies.
    pub const fn key_len() -> usize {
        core::mem::size_of::<T>()
    }

    /// Read the key out of `bucket`. Buckets need not be aligned for `T`.
    #[inline]
    pub fn read(bucket: &[u8]) -> T {
        bytemuck::pod_read_unaligned(&bucket[..Self::key_len()])
    }
}

impl<T: Pod, S: Clone> Clone for PodKey<T, S> {
    fn clone(&self) -> Self {
        Self::with_hasher(self.hasher.clone())
    }
}

impl<T, S> core::fmt::Debug for PodKey<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PodKey")
            .field("key", &core::any::type_name::<T>())
            .finish()
    }
}

impl<T: Pod + Ord, S> BucketCmp for PodKey<T, S> {
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        Self::read(a).cmp(&Self::read(b))
    }
}

impl<T: Pod + Hash, S: BuildHasher> BucketHash for PodKey<T, S> {
    #[inline]
    fn hash(&self, bucket: &[u8]) -> u64 {
        self.hasher.hash_one(Self::read(bucket))
    }
}
