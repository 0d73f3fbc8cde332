//! FlatHashMap: open addressing with Robin Hood displacement, buckets
//! stored inline in the probe table.

use crate::bucket::{BucketCmp, BucketHash};
use crate::capacity::{checked_capacity_for, scaled_capacity};
use crate::error::{fatal, Error};
use crate::robin_hood::{ByteSlots, Probe, RobinHood};
use core::cmp::Ordering;
use core::fmt;

/// Hash map over fixed-stride buckets.
///
/// Capacity is always a power of two. The table grows (to
/// `capacity_for(min_len * 2)`) before the load would pass three quarters,
/// and shrinks (to `capacity_for(len)`) after a removal leaves it under one
/// quarter. Both are full rehashes. Removal is tombstone-free.
#[derive(Clone)]
pub struct FlatHashMap<H, C> {
    table: RobinHood<ByteSlots>,
    len: usize,
    stride: usize,
    hash: H,
    cmp: C,
}

enum Pushed {
    Inserted,
    Existing(usize),
}

impl<H: BucketHash, C: BucketCmp> FlatHashMap<H, C> {
    pub fn new(stride: usize, initial_len: usize, hash: H, cmp: C) -> Self {
        Self::try_new(stride, initial_len, hash, cmp).unwrap_or_else(|e| fatal(e))
    }

    pub fn try_new(stride: usize, initial_len: usize, hash: H, cmp: C) -> Result<Self, Error> {
        if stride == 0 {
            return Err(Error::ZeroStride);
        }
        let cap = checked_capacity_for(initial_len).ok_or(Error::CapacityOverflow {
            requested: initial_len,
        })?;
        Ok(Self {
            table: Self::empty_table(cap, stride)?,
            len: 0,
            stride,
            hash,
            cmp,
        })
    }

    fn empty_table(cap: usize, stride: usize) -> Result<RobinHood<ByteSlots>, Error> {
        RobinHood::try_new(cap, ByteSlots::try_new(cap, stride)?)
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn reserve(&mut self, min_len: usize) {
        if let Err(e) = self.try_reserve(min_len) {
            fatal(e)
        }
    }

    /// Rehash into `capacity_for(min_len * 2)` slots if `min_len` entries
    /// would push the load factor above 0.75.
    pub fn try_reserve(&mut self, min_len: usize) -> Result<(), Error> {
        let cap = self.capacity();
        if min_len <= cap - cap / 4 {
            return Ok(());
        }
        self.rehash(scaled_capacity(min_len, 2)?)
    }

    /// Rehash into `capacity_for(len)` slots once under a quarter full.
    pub fn trim(&mut self) {
        let cap = self.capacity();
        if cap / 4 <= self.len {
            return;
        }
        let shrunk = match checked_capacity_for(self.len) {
            Some(c) if c < cap => c,
            _ => return,
        };
        if let Err(e) = self.rehash(shrunk) {
            fatal(e)
        }
    }

    fn rehash(&mut self, cap: usize) -> Result<(), Error> {
        let mut table = Self::empty_table(cap, self.stride)?;
        for slot in self.table.occupied() {
            let bucket = self.table.slots().get(slot);
            table.slots_mut().stage(bucket);
            table.place_unique(self.hash.hash(bucket), ());
        }
        self.table = table;
        Ok(())
    }

    fn find(&self, key: &[u8], hash: u64) -> Probe {
        self.table.find(hash, |slots, slot| {
            self.cmp.compare(key, slots.get(slot)) == Ordering::Equal
        })
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.find(key, self.hash.hash(key)) {
            Probe::Found(slot) => Some(self.table.slots().get(slot)),
            Probe::Vacant { .. } => None,
        }
    }

    /// Mutable access to a stored bucket. Bytes read by the hasher or
    /// comparator must not change.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        match self.find(key, self.hash.hash(key)) {
            Probe::Found(slot) => Some(self.table.slots_mut().get_mut(slot)),
            Probe::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    fn push_slot(&mut self, bucket: &[u8]) -> Result<Pushed, Error> {
        if bucket.len() != self.stride {
            return Err(Error::StrideMismatch {
                expected: self.stride,
                actual: bucket.len(),
            });
        }
        self.try_reserve(self.len + 1)?;
        let hash = self.hash.hash(bucket);
        match self.find(bucket, hash) {
            Probe::Found(slot) => Ok(Pushed::Existing(slot)),
            Probe::Vacant { slot, distance } => {
                self.table.slots_mut().stage(bucket);
                self.table.place(slot, distance, ());
                self.len += 1;
                Ok(Pushed::Inserted)
            }
        }
    }

    /// Insert `bucket`. Returns `None` when inserted, or the stored bucket
    /// with an equal key, which is left as is.
    ///
    /// Panics if `bucket.len() != stride`.
    pub fn push(&mut self, bucket: &[u8]) -> Option<&[u8]> {
        match self.push_slot(bucket) {
            Ok(Pushed::Inserted) => None,
            Ok(Pushed::Existing(slot)) => Some(self.table.slots().get(slot)),
            Err(e) => fatal(e),
        }
    }

    /// Like [`FlatHashMap::push`], with an existing key reported as
    /// [`Error::DuplicateKey`].
    pub fn try_push(&mut self, bucket: &[u8]) -> Result<(), Error> {
        match self.push_slot(bucket)? {
            Pushed::Inserted => Ok(()),
            Pushed::Existing(_) => Err(Error::DuplicateKey),
        }
    }

    /// Remove the bucket matching `key`, copying it into `out`, then trim.
    /// Returns whether a bucket was found.
    ///
    /// Panics if a bucket is found and `out.len() != stride`.
    pub fn pop(&mut self, key: &[u8], out: &mut [u8]) -> bool {
        let slot = match self.find(key, self.hash.hash(key)) {
            Probe::Found(slot) => slot,
            Probe::Vacant { .. } => return false,
        };
        if out.len() != self.stride {
            fatal(Error::StrideMismatch {
                expected: self.stride,
                actual: out.len(),
            });
        }
        out.copy_from_slice(self.table.slots().get(slot));
        self.table.remove(slot);
        self.len -= 1;
        self.trim();
        true
    }

    /// Stored buckets in table order (not insertion order).
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let slots = self.table.slots();
        self.table.occupied().map(move |slot| slots.get(slot))
    }

    #[cfg(test)]
    pub(crate) fn verify(&self) -> Result<(), String> {
        if self.table.occupied().count() != self.len {
            return Err(format!("len {} disagrees with occupied slots", self.len));
        }
        self.table
            .verify(|slots, slot| self.hash.hash(slots.get(slot)))
    }
}

impl<H, C> fmt::Debug for FlatHashMap<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatHashMap")
            .field("len", &self.len)
            .field("capacity", &self.table.capacity())
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::PodKey;
    use bytemuck::{Pod, Zeroable};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Entry {
        key: u32,
        value: u32,
    }

    fn entry(key: u32, value: u32) -> Entry {
        Entry { key, value }
    }

    type Map = FlatHashMap<PodKey<u32>, PodKey<u32>>;

    fn map() -> Map {
        FlatHashMap::new(8, 0, PodKey::new(), PodKey::new())
    }

    fn get(m: &Map, key: u32) -> Option<Entry> {
        m.get(&key.to_ne_bytes()).map(bytemuck::pod_read_unaligned)
    }

    /// Invariant: inserting 1..=20 grows 8 -> 16 -> 32 and every key stays
    /// reachable; removing 1..=10 leaves exactly 11..=20.
    #[test]
    fn grow_then_remove_half() {
        let mut m = map();
        assert_eq!(m.capacity(), 8);
        let mut seen = vec![m.capacity()];
        for k in 1..=20u32 {
            assert!(m.push(bytemuck::bytes_of(&entry(k, k * 100))).is_none());
            if *seen.last().unwrap() != m.capacity() {
                seen.push(m.capacity());
            }
        }
        assert_eq!(seen, vec![8, 16, 32]);
        for k in 1..=20 {
            assert_eq!(get(&m, k), Some(entry(k, k * 100)));
        }
        m.verify().unwrap();

        let mut out = [0u8; 8];
        for k in 1..=10u32 {
            assert!(m.pop(&k.to_ne_bytes(), &mut out));
            assert_eq!(bytemuck::pod_read_unaligned::<Entry>(&out), entry(k, k * 100));
            m.verify().unwrap();
        }
        assert_eq!(m.len(), 10);
        for k in 1..=10 {
            assert_eq!(get(&m, k), None);
        }
        for k in 11..=20 {
            assert_eq!(get(&m, k), Some(entry(k, k * 100)));
        }
    }

    /// Invariant: shrinking happens once fewer than a quarter of the slots
    /// are live, to `capacity_for(len)`, and loses nothing.
    #[test]
    fn pop_shrinks_below_quarter_load() {
        let mut m = map();
        for k in 1..=20u32 {
            m.push(bytemuck::bytes_of(&entry(k, k)));
        }
        assert_eq!(m.capacity(), 32);
        let mut out = [0u8; 8];
        for k in 1..=12u32 {
            m.pop(&k.to_ne_bytes(), &mut out);
        }
        // 8 live entries, 32 / 4 == 8: still not under a quarter.
        assert_eq!(m.capacity(), 32);
        m.pop(&13u32.to_ne_bytes(), &mut out);
        assert_eq!(m.len(), 7);
        assert_eq!(m.capacity(), 8);
        m.verify().unwrap();
        for k in 14..=20 {
            assert_eq!(get(&m, k), Some(entry(k, k)));
        }
    }

    /// Invariant: a duplicate push returns the stored bucket and never
    /// overwrites it.
    #[test]
    fn duplicate_push_returns_existing() {
        let mut m = map();
        m.push(bytemuck::bytes_of(&entry(5, 1)));
        let existing = m
            .push(bytemuck::bytes_of(&entry(5, 2)))
            .map(bytemuck::pod_read_unaligned::<Entry>);
        assert_eq!(existing, Some(entry(5, 1)));
        assert_eq!(m.len(), 1);
        assert_eq!(
            m.try_push(bytemuck::bytes_of(&entry(5, 3))),
            Err(Error::DuplicateKey)
        );
        assert_eq!(get(&m, 5), Some(entry(5, 1)));
    }

    #[test]
    fn pop_missing_key_reports_not_found() {
        let mut m = map();
        let mut out = [0xAAu8; 8];
        assert!(!m.pop(&1u32.to_ne_bytes(), &mut out));
        assert_eq!(out, [0xAA; 8]);
        m.push(bytemuck::bytes_of(&entry(1, 1)));
        assert!(!m.pop(&2u32.to_ne_bytes(), &mut out));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: lookups resolve by comparator even when every key lands
    /// on the same ideal slot, and backward shift keeps the chain intact.
    #[test]
    fn constant_hash_collisions() {
        let cmp = |a: &[u8], b: &[u8]| a[..4].cmp(&b[..4]);
        let mut m = FlatHashMap::new(8, 0, |_: &[u8]| 0u64, cmp);
        for k in 0..40u32 {
            m.push(bytemuck::bytes_of(&entry(k, k + 1)));
        }
        m.verify().unwrap();
        let mut out = [0u8; 8];
        for k in (0..40u32).step_by(3) {
            assert!(m.pop(&k.to_ne_bytes(), &mut out));
            m.verify().unwrap();
        }
        for k in 0..40u32 {
            let hit = m.get(&k.to_ne_bytes()).map(bytemuck::pod_read_unaligned::<Entry>);
            if k % 3 == 0 {
                assert_eq!(hit, None);
            } else {
                assert_eq!(hit, Some(entry(k, k + 1)));
            }
        }
    }

    #[test]
    fn get_mut_updates_value_in_place() {
        let mut m = map();
        m.push(bytemuck::bytes_of(&entry(9, 0)));
        m.get_mut(&9u32.to_ne_bytes()).unwrap()[4..].copy_from_slice(&77u32.to_ne_bytes());
        assert_eq!(get(&m, 9), Some(entry(9, 77)));
    }

    #[test]
    fn iter_visits_every_bucket_once() {
        let mut m = map();
        for k in 0..30u32 {
            m.push(bytemuck::bytes_of(&entry(k, k)));
        }
        let mut keys: Vec<u32> = m
            .iter()
            .map(|b| bytemuck::pod_read_unaligned::<Entry>(b).key)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..30).collect::<Vec<u32>>());
    }

    #[test]
    fn zero_stride_is_an_error() {
        let res = FlatHashMap::try_new(0, 0, PodKey::<u32>::new(), PodKey::<u32>::new());
        assert_eq!(res.map(|_| ()), Err(Error::ZeroStride));
    }

    #[test]
    fn try_push_rejects_wrong_stride() {
        let mut m = map();
        assert_eq!(
            m.try_push(&[0u8; 4]),
            Err(Error::StrideMismatch {
                expected: 8,
                actual: 4
            })
        );
        assert!(m.is_empty());
    }

    /// Invariant: clones are deep copies with their own table.
    #[test]
    fn clone_is_independent() {
        let mut a = map();
        a.push(bytemuck::bytes_of(&entry(1, 1)));
        let mut b = a.clone();
        b.push(bytemuck::bytes_of(&entry(2, 2)));
        assert!(a.get(&2u32.to_ne_bytes()).is_none());
        assert_eq!(b.len(), 2);
    }
}
