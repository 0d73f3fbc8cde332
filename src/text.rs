//! TextBuffer: growable byte string that always keeps a trailing NUL.
//!
//! Growth follows the same policy as [`Buffer`](crate::Buffer) with a
//! one-byte stride, except that one slot past `len` is always reserved for
//! the terminator: `capacity > len` and `data[len] == 0` hold after every
//! operation. Ordering and hashing use C-string semantics: both stop at the
//! first NUL byte.

use crate::capacity::{checked_capacity_for, scaled_capacity, try_filled};
use crate::error::{fatal, Error};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

const HASH_MULTIPLIER: u64 = 31;

/// `strcmp`-style ordering of two byte strings, each cut at its first NUL.
pub fn text_cmp(a: &[u8], b: &[u8]) -> Ordering {
    until_nul(a).cmp(until_nul(b))
}

/// Multiplicative string hash: `sum(byte[i] * 31^i)` over the bytes before
/// the first NUL, with wrapping arithmetic and a running multiplier.
pub fn text_hash(bytes: &[u8]) -> u64 {
    let mut hash = 0u64;
    let mut m = 1u64;
    for &b in until_nul(bytes) {
        hash = hash.wrapping_add(u64::from(b).wrapping_mul(m));
        m = m.wrapping_mul(HASH_MULTIPLIER);
    }
    hash
}

#[inline]
fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[derive(Clone)]
pub struct TextBuffer {
    data: Vec<u8>, // capacity bytes; data[len] == 0
    len: usize,
}

impl TextBuffer {
    /// Empty text with room for `initial_len` bytes plus the terminator.
    pub fn new(initial_len: usize) -> Self {
        Self::try_new(initial_len).unwrap_or_else(|e| fatal(e))
    }

    pub fn try_new(initial_len: usize) -> Result<Self, Error> {
        let mut text = Self {
            data: Vec::new(),
            len: 0,
        };
        text.try_reserve(initial_len)?;
        Ok(text)
    }

    /// Byte length, excluding the terminator.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Allocated bytes, including the terminator slot.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn reserve(&mut self, min_len: usize) {
        if let Err(e) = self.try_reserve(min_len) {
            fatal(e)
        }
    }

    /// Make room for `min_len` bytes plus the terminator.
    pub fn try_reserve(&mut self, min_len: usize) -> Result<(), Error> {
        if self.capacity() > min_len {
            return Ok(());
        }
        let cap = min_len
            .checked_add(1)
            .and_then(checked_capacity_for)
            .ok_or(Error::CapacityOverflow { requested: min_len })?;
        let mut data = try_filled(cap, 0u8)?;
        data[..self.len].copy_from_slice(&self.data[..self.len]);
        self.data = data;
        Ok(())
    }

    /// Shrink to `capacity_for(len * 2)` once under a quarter full.
    pub fn trim(&mut self) {
        if self.capacity() / 4 <= self.len {
            return;
        }
        let cap = match scaled_capacity(self.len, 2) {
            Ok(cap) => cap,
            Err(e) => fatal(e),
        };
        if cap < self.capacity() {
            self.data.truncate(cap);
            self.data.shrink_to_fit();
        }
        debug_assert_eq!(self.data[self.len], 0);
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }

    /// Insert `seq` before byte `index`. Panics if `index > len`.
    pub fn insert(&mut self, seq: &[u8], index: usize) {
        if let Err(e) = self.try_insert(seq, index) {
            fatal(e)
        }
    }

    pub fn try_insert(&mut self, seq: &[u8], index: usize) -> Result<(), Error> {
        if index > self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let new_len = self
            .len
            .checked_add(seq.len())
            .ok_or(Error::CapacityOverflow { requested: self.len })?;
        self.try_reserve(new_len)?;
        self.data.copy_within(index..self.len, index + seq.len());
        self.data[index..index + seq.len()].copy_from_slice(seq);
        self.len = new_len;
        self.data[self.len] = 0;
        Ok(())
    }

    pub fn append(&mut self, seq: &[u8]) {
        self.insert(seq, self.len);
    }

    /// Remove `count` bytes starting at `index`. Ranges reaching past the
    /// end are ignored.
    pub fn erase(&mut self, index: usize, count: usize) {
        match index.checked_add(count) {
            Some(end) if end <= self.len => {
                self.data.copy_within(end..self.len, index);
                self.len -= count;
                self.data[self.len] = 0;
                self.trim();
            }
            _ => {}
        }
    }

    /// Text bytes without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Text bytes including the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data[..=self.len]
    }

    pub fn iter(&self) -> core::iter::Copied<core::slice::Iter<'_, u8>> {
        self.as_bytes().iter().copied()
    }

    pub fn as_str(&self) -> Result<&str, Error> {
        core::str::from_utf8(self.as_bytes()).map_err(|e| Error::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        })
    }

    /// [`text_hash`] of this text.
    pub fn hash_code(&self) -> u64 {
        text_hash(self.as_bytes())
    }

    pub fn to_utf16(&self) -> Result<Vec<u16>, Error> {
        Ok(self.as_str()?.encode_utf16().collect())
    }

    pub fn to_utf32(&self) -> Result<Vec<u32>, Error> {
        Ok(self.as_str()?.chars().map(u32::from).collect())
    }

    /// Decode UTF-16 units up to the first zero unit (or the end).
    pub fn from_utf16(units: &[u16]) -> Result<Self, Error> {
        let units = match units.iter().position(|&u| u == 0) {
            Some(end) => &units[..end],
            None => units,
        };
        let mut text = Self::try_new(units.len())?;
        let mut at = 0;
        let mut utf8 = [0u8; 4];
        for decoded in char::decode_utf16(units.iter().copied()) {
            match decoded {
                Ok(c) => {
                    text.try_insert(c.encode_utf8(&mut utf8).as_bytes(), text.len)?;
                    at += c.len_utf16();
                }
                Err(_) => return Err(Error::InvalidUtf16 { index: at }),
            }
        }
        Ok(text)
    }

    /// Encode UTF-32 code points up to the first zero (or the end).
    pub fn from_utf32(points: &[u32]) -> Result<Self, Error> {
        let mut text = Self::try_new(points.len())?;
        let mut utf8 = [0u8; 4];
        for &value in points.iter().take_while(|&&p| p != 0) {
            let c = char::from_u32(value).ok_or(Error::InvalidCodePoint { value })?;
            text.try_insert(c.encode_utf8(&mut utf8).as_bytes(), text.len)?;
        }
        Ok(text)
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        let mut text = Self::new(s.len());
        text.append(s.as_bytes());
        text
    }
}

impl fmt::Write for TextBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.try_insert(s.as_bytes(), self.len).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl PartialEq for TextBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TextBuffer {}

impl PartialOrd for TextBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextBuffer {
    fn cmp(&self, other: &Self) -> Ordering {
        text_cmp(self.as_bytes(), other.as_bytes())
    }
}

impl Hash for TextBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        until_nul(self.as_bytes()).hash(state);
    }
}
