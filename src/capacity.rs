//! Capacity policy shared by every container, plus the allocation helpers
//! that turn a capacity into an owned region.

use crate::error::Error;

/// Smallest capacity any container allocates.
pub const MIN_CAPACITY: usize = 8;

/// Map a requested length to an allocation capacity.
///
/// Returns [`MIN_CAPACITY`] for anything below it, otherwise the smallest
/// power of two `>= requested`. Panics with "capacity overflow" when that
/// power of two does not fit in `usize`, like `Vec` does.
#[inline]
pub fn capacity_for(requested: usize) -> usize {
    match checked_capacity_for(requested) {
        Some(cap) => cap,
        None => panic!("{}", Error::CapacityOverflow { requested }),
    }
}

/// Fallible form of [`capacity_for`].
#[inline]
pub fn checked_capacity_for(requested: usize) -> Option<usize> {
    if requested < MIN_CAPACITY {
        return Some(MIN_CAPACITY);
    }
    // All bits below the highest set bit of `requested - 1`, plus one.
    let shift = (requested - 1).leading_zeros();
    if shift == 0 {
        return None;
    }
    Some((usize::MAX >> shift) + 1)
}

/// `capacity_for(len * factor)` with the multiplication checked.
#[inline]
pub(crate) fn scaled_capacity(len: usize, factor: usize) -> Result<usize, Error> {
    len.checked_mul(factor)
        .and_then(checked_capacity_for)
        .ok_or(Error::CapacityOverflow { requested: len })
}

/// Allocate `len` copies of `fill` without aborting on failure.
pub(crate) fn try_filled<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, Error> {
    let bytes = len
        .checked_mul(core::mem::size_of::<T>())
        .ok_or(Error::CapacityOverflow { requested: len })?;
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Error::Alloc { bytes })?;
    v.resize(len, fill);
    Ok(v)
}

/// Allocate a zeroed byte region for `cap` records of `stride` bytes.
pub(crate) fn try_region(cap: usize, stride: usize) -> Result<Vec<u8>, Error> {
    let bytes = cap
        .checked_mul(stride)
        .ok_or(Error::CapacityOverflow { requested: cap })?;
    try_filled(bytes, 0u8)
}
