//! FlatOrderedHashMap: insertion-ordered dense array of buckets indexed by
//! a sparse Robin Hood table of dense positions.
//!
//! The dense side is a [`Buffer`]; the sparse side is the same
//! [`RobinHood`] structure `FlatHashMap` uses, holding positions instead of
//! buckets. Removal shifts the dense tail down to keep strict insertion
//! order, then re-points every sparse slot that referenced a shifted entry.

use crate::bucket::{BucketCmp, BucketHash};
use crate::buffer::Buffer;
use crate::capacity::{checked_capacity_for, scaled_capacity};
use crate::error::{fatal, Error};
use crate::robin_hood::{IndexSlots, Probe, RobinHood};
use core::cmp::Ordering;
use core::fmt;

#[derive(Clone)]
pub struct FlatOrderedHashMap<H, C> {
    dense: Buffer,
    index: RobinHood<IndexSlots>,
    hash: H,
    cmp: C,
}

enum Pushed {
    Inserted,
    Existing(usize),
}

impl<H: BucketHash, C: BucketCmp> FlatOrderedHashMap<H, C> {
    pub fn new(stride: usize, initial_len: usize, hash: H, cmp: C) -> Self {
        Self::try_new(stride, initial_len, hash, cmp).unwrap_or_else(|e| fatal(e))
    }

    pub fn try_new(stride: usize, initial_len: usize, hash: H, cmp: C) -> Result<Self, Error> {
        let cap = checked_capacity_for(initial_len).ok_or(Error::CapacityOverflow {
            requested: initial_len,
        })?;
        Ok(Self {
            dense: Buffer::try_new(stride, initial_len)?,
            index: Self::empty_index(cap)?,
            hash,
            cmp,
        })
    }

    fn empty_index(cap: usize) -> Result<RobinHood<IndexSlots>, Error> {
        RobinHood::try_new(cap, IndexSlots::try_new(cap)?)
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
    /// Slots in the sparse index.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }
    pub fn stride(&self) -> usize {
        self.dense.stride()
    }

    pub fn reserve(&mut self, min_len: usize) {
        if let Err(e) = self.try_reserve(min_len) {
            fatal(e)
        }
    }

    /// Same thresholds as `FlatHashMap::try_reserve`; the dense array is
    /// grown to match.
    pub fn try_reserve(&mut self, min_len: usize) -> Result<(), Error> {
        let cap = self.capacity();
        if min_len <= cap - cap / 4 {
            return Ok(());
        }
        let cap = scaled_capacity(min_len, 2)?;
        self.dense.try_reserve(min_len)?;
        self.reindex(cap)
    }

    pub fn trim(&mut self) {
        let cap = self.capacity();
        if cap / 4 <= self.len() {
            return;
        }
        let shrunk = match checked_capacity_for(self.len()) {
            Some(c) if c < cap => c,
            _ => return,
        };
        if let Err(e) = self.reindex(shrunk) {
            fatal(e)
        }
    }

    /// Rebuild the sparse index at `cap` slots from the dense array.
    fn reindex(&mut self, cap: usize) -> Result<(), Error> {
        let mut index = Self::empty_index(cap)?;
        for (pos, bucket) in self.dense.iter().enumerate() {
            index.place_unique(self.hash.hash(bucket), pos);
        }
        self.index = index;
        Ok(())
    }

    fn find(&self, key: &[u8], hash: u64) -> Probe {
        self.index.find(hash, |slots, slot| {
            self.cmp.compare(key, self.dense.record(slots.get(slot))) == Ordering::Equal
        })
    }

    /// Dense position of the bucket matching `key`.
    pub fn index_of(&self, key: &[u8]) -> Option<usize> {
        match self.find(key, self.hash.hash(key)) {
            Probe::Found(slot) => Some(self.index.slots().get(slot)),
            Probe::Vacant { .. } => None,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.dense.get(self.index_of(key)?)
    }

    /// Mutable access to a stored bucket. Bytes read by the hasher or
    /// comparator must not change.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        let pos = self.index_of(key)?;
        self.dense.get_mut(pos)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.index_of(key).is_some()
    }

    /// Bucket at insertion position `pos`.
    pub fn get_index(&self, pos: usize) -> Option<&[u8]> {
        self.dense.get(pos)
    }

    fn push_pos(&mut self, bucket: &[u8]) -> Result<Pushed, Error> {
        if bucket.len() != self.stride() {
            return Err(Error::StrideMismatch {
                expected: self.stride(),
                actual: bucket.len(),
            });
        }
        self.try_reserve(self.len() + 1)?;
        self.dense.try_reserve(self.len() + 1)?;
        let hash = self.hash.hash(bucket);
        match self.find(bucket, hash) {
            Probe::Found(slot) => Ok(Pushed::Existing(self.index.slots().get(slot))),
            Probe::Vacant { slot, distance } => {
                // Index first: a refused placement leaves the dense side as is.
                let pos = self.dense.len();
                self.index.place(slot, distance, pos);
                self.dense.try_insert(bucket, pos)?;
                Ok(Pushed::Inserted)
            }
        }
    }

    /// Append `bucket` after every bucket already stored. Returns `None`
    /// when inserted, or the stored bucket with an equal key, unchanged and
    /// still at its original position.
    ///
    /// Panics if `bucket.len() != stride`.
    pub fn push(&mut self, bucket: &[u8]) -> Option<&[u8]> {
        match self.push_pos(bucket) {
            Ok(Pushed::Inserted) => None,
            Ok(Pushed::Existing(pos)) => self.dense.get(pos),
            Err(e) => fatal(e),
        }
    }

    /// Like [`FlatOrderedHashMap::push`], with an existing key reported as
    /// [`Error::DuplicateKey`].
    pub fn try_push(&mut self, bucket: &[u8]) -> Result<(), Error> {
        match self.push_pos(bucket)? {
            Pushed::Inserted => Ok(()),
            Pushed::Existing(_) => Err(Error::DuplicateKey),
        }
    }

    /// Remove the bucket matching `key`, copying it into `out`. Later
    /// buckets move up one position; relative order is unchanged.
    ///
    /// Panics if a bucket is found and `out.len() != stride`.
    pub fn pop(&mut self, key: &[u8], out: &mut [u8]) -> bool {
        let slot = match self.find(key, self.hash.hash(key)) {
            Probe::Found(slot) => slot,
            Probe::Vacant { .. } => return false,
        };
        if out.len() != self.stride() {
            fatal(Error::StrideMismatch {
                expected: self.stride(),
                actual: out.len(),
            });
        }
        let pos = self.index.slots().get(slot);
        out.copy_from_slice(self.dense.record(pos));
        self.dense.erase(pos);
        self.index.remove(slot);
        self.index.close_dense_gap(pos);
        self.trim();
        true
    }

    /// Buckets in insertion order.
    pub fn iter(&self) -> core::slice::ChunksExact<'_, u8> {
        self.dense.iter()
    }

    /// The dense array, `len * stride` bytes in insertion order.
    pub fn as_bytes(&self) -> &[u8] {
        self.dense.as_bytes()
    }

    #[cfg(test)]
    pub(crate) fn verify(&self) -> Result<(), String> {
        let mut seen = vec![false; self.len()];
        for slot in self.index.occupied() {
            let pos = self.index.slots().get(slot);
            match seen.get_mut(pos) {
                Some(s) if !*s => *s = true,
                Some(_) => return Err(format!("position {pos} indexed twice")),
                None => return Err(format!("slot {slot} points past the end ({pos})")),
            }
        }
        if seen.iter().any(|s| !s) {
            return Err("dense entry without an index slot".to_string());
        }
        self.index.verify(|slots, slot| {
            self.dense
                .get(slots.get(slot))
                .map(|bucket| self.hash.hash(bucket))
                .unwrap_or(0)
        })
    }
}

impl<H, C> fmt::Debug for FlatOrderedHashMap<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatOrderedHashMap")
            .field("dense", &self.dense)
            .field("capacity", &self.index.capacity())
            .finish_non_exhaustive()
    }
}
