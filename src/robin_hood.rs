//! RobinHood: structural layer shared by both hash maps.
//!
//! A power-of-two array of slots plus a parallel array of probe distances.
//! What a slot holds is up to the [`Slots`] payload: whole bucket bytes for
//! `FlatHashMap`, dense-array positions for `FlatOrderedHashMap`. This layer
//! never hashes or compares; callers pass hashes in and supply the equality
//! test as a closure, so the displacement and backward-shift logic lives in
//! one place.
//!
//! Invariants
//! - `meta[i] == EMPTY` iff slot `i` is free.
//! - An occupied slot `i` with distance `d` holds an entry whose ideal slot
//!   is `(i - d) & mask`, and every slot from the ideal one up to `i` is
//!   occupied.
//! - Along a run, `meta[i] <= meta[i - 1] + 1`, so a probe carrying
//!   distance `d` that meets a resident with a smaller distance has proven
//!   its key absent.

use crate::capacity::{try_filled, try_region};
use crate::error::Error;

pub(crate) type Distance = u16;

/// Metadata sentinel for a free slot.
pub(crate) const EMPTY: Distance = Distance::MAX;

/// Storage for the entries a probe table moves around.
pub(crate) trait Slots {
    /// The entry in flight while an insert walks the probe sequence.
    type Carry;
    fn put(&mut self, slot: usize, carry: Self::Carry);
    fn swap(&mut self, slot: usize, carry: &mut Self::Carry);
    /// Copy the entry at `from` into `to`; `from` is about to be vacated.
    fn shift(&mut self, from: usize, to: usize);
}

/// Outcome of a lookup walk.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Probe {
    Found(usize),
    /// Where an insert of the missing key would land, and with what distance.
    Vacant { slot: usize, distance: Distance },
}

#[derive(Clone, Debug)]
pub(crate) struct RobinHood<P> {
    meta: Vec<Distance>,
    slots: P,
    mask: usize,
}

impl<P: Slots> RobinHood<P> {
    /// `cap` must be a power of two and match the size of `slots`.
    pub(crate) fn try_new(cap: usize, slots: P) -> Result<Self, Error> {
        debug_assert!(cap.is_power_of_two());
        Ok(Self {
            meta: try_filled(cap, EMPTY)?,
            slots,
            mask: cap - 1,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.meta.len()
    }

    #[inline]
    pub(crate) fn slots(&self) -> &P {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut P {
        &mut self.slots
    }

    #[inline]
    fn ideal(&self, hash: u64) -> usize {
        hash as usize & self.mask
    }

    /// Occupied slot indices in table order.
    pub(crate) fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.meta
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d != EMPTY)
            .map(|(i, _)| i)
    }

    /// Walk the probe sequence for `hash` until `matches` accepts a slot or
    /// the Robin Hood early exit proves the key absent.
    pub(crate) fn find<F>(&self, hash: u64, mut matches: F) -> Probe
    where
        F: FnMut(&P, usize) -> bool,
    {
        let mut slot = self.ideal(hash);
        let mut distance: Distance = 0;
        loop {
            let resident = self.meta[slot];
            if resident == EMPTY || distance > resident {
                return Probe::Vacant { slot, distance };
            }
            if matches(&self.slots, slot) {
                return Probe::Found(slot);
            }
            slot = (slot + 1) & self.mask;
            distance += 1;
        }
    }

    /// Insert `carry` starting at a vacant probe position. Residents closer
    /// to their ideal slot than the carried entry give up their slot and
    /// continue the walk themselves.
    ///
    /// Panics before storing anything at distance `EMPTY`, which would make
    /// the entry indistinguishable from a free slot.
    pub(crate) fn place(&mut self, mut slot: usize, mut distance: Distance, mut carry: P::Carry) {
        loop {
            assert!(distance != EMPTY, "robin hood probe distance overflow");
            let resident = self.meta[slot];
            if resident == EMPTY {
                self.slots.put(slot, carry);
                self.meta[slot] = distance;
                return;
            }
            if distance > resident {
                self.slots.swap(slot, &mut carry);
                self.meta[slot] = distance;
                distance = resident;
            }
            slot = (slot + 1) & self.mask;
            distance += 1;
        }
    }

    /// Insert an entry known not to be present (rehash path).
    pub(crate) fn place_unique(&mut self, hash: u64, carry: P::Carry) {
        let slot = self.ideal(hash);
        self.place(slot, 0, carry);
    }

    /// Free `slot` by backward shift: each following entry that is not at
    /// its ideal slot moves back one place, until an empty slot or an entry
    /// with distance zero ends the run.
    pub(crate) fn remove(&mut self, mut slot: usize) {
        debug_assert!(self.meta[slot] != EMPTY);
        loop {
            let next = (slot + 1) & self.mask;
            let d = self.meta[next];
            if d == EMPTY || d == 0 {
                self.meta[slot] = EMPTY;
                return;
            }
            self.slots.shift(next, slot);
            self.meta[slot] = d - 1;
            slot = next;
        }
    }

    /// Check every structural invariant, given a way to recompute each
    /// occupied slot's hash.
    #[cfg(test)]
    pub(crate) fn verify<F>(&self, hash_of: F) -> Result<(), String>
    where
        F: Fn(&P, usize) -> u64,
    {
        for slot in self.occupied() {
            let d = usize::from(self.meta[slot]);
            let ideal = self.ideal(hash_of(&self.slots, slot));
            if (slot.wrapping_sub(d)) & self.mask != ideal {
                return Err(format!(
                    "slot {slot}: distance {d} but ideal slot is {ideal}"
                ));
            }
            if d > 0 {
                let prev = self.meta[(slot.wrapping_sub(1)) & self.mask];
                if prev == EMPTY || usize::from(prev) + 1 < d {
                    return Err(format!(
                        "slot {slot}: distance {d} follows {prev}, run is broken"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Whole buckets stored in the table. The entry in flight lives in
/// `scratch`; call [`ByteSlots::stage`] before placing.
#[derive(Clone, Debug)]
pub(crate) struct ByteSlots {
    data: Vec<u8>,
    scratch: Vec<u8>,
    stride: usize,
}

impl ByteSlots {
    pub(crate) fn try_new(cap: usize, stride: usize) -> Result<Self, Error> {
        Ok(Self {
            data: try_region(cap, stride)?,
            scratch: try_region(1, stride)?,
            stride,
        })
    }

    #[inline]
    fn span(&self, slot: usize) -> core::ops::Range<usize> {
        let start = slot * self.stride;
        start..start + self.stride
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> &[u8] {
        &self.data[self.span(slot)]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, slot: usize) -> &mut [u8] {
        let span = self.span(slot);
        &mut self.data[span]
    }

    pub(crate) fn stage(&mut self, bucket: &[u8]) {
        self.scratch.copy_from_slice(bucket);
    }
}

impl Slots for ByteSlots {
    type Carry = ();

    fn put(&mut self, slot: usize, _: ()) {
        let span = self.span(slot);
        self.data[span].copy_from_slice(&self.scratch);
    }

    fn swap(&mut self, slot: usize, _: &mut ()) {
        let span = self.span(slot);
        self.data[span].swap_with_slice(&mut self.scratch);
    }

    fn shift(&mut self, from: usize, to: usize) {
        let span = self.span(from);
        self.data.copy_within(span, to * self.stride);
    }
}

impl RobinHood<IndexSlots> {
    /// The dense entry at `removed` is gone and everything after it moved
    /// down one position; point the affected slots at their new positions.
    pub(crate) fn close_dense_gap(&mut self, removed: usize) {
        for (slot, &d) in self.meta.iter().enumerate() {
            let pos = &mut self.slots.0[slot];
            if d != EMPTY && *pos > removed {
                *pos -= 1;
            }
        }
    }
}

/// Dense-array positions stored in the table.
#[derive(Clone, Debug)]
pub(crate) struct IndexSlots(Vec<usize>);

impl IndexSlots {
    pub(crate) fn try_new(cap: usize) -> Result<Self, Error> {
        Ok(Self(try_filled(cap, 0)?))
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> usize {
        self.0[slot]
    }
}

impl Slots for IndexSlots {
    type Carry = usize;

    fn put(&mut self, slot: usize, carry: usize) {
        self.0[slot] = carry;
    }

    fn swap(&mut self, slot: usize, carry: &mut usize) {
        core::mem::swap(&mut self.0[slot], carry);
    }

    fn shift(&mut self, from: usize, to: usize) {
        self.0[to] = self.0[from];
    }
}
