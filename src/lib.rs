//! flat-containers: type-erased containers over fixed-stride byte records,
//! with one shared capacity policy and no per-element allocation.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small family of growable containers whose element type is
//!   known only by its size in bytes (the stride). Keys are whatever bytes
//!   a caller-supplied comparator and hasher choose to read.
//! - Layers:
//!   - capacity: power-of-two sizing (minimum 8) and fallible allocation
//!     helpers used by every container.
//!   - Buffer: contiguous array of `len * stride` bytes with positional
//!     insert/erase, automatic growth and shrink.
//!   - TextBuffer: byte string with a permanent trailing NUL, plus
//!     `text_cmp`/`text_hash` for NUL-terminated keys.
//!   - FlatMap: sorted Buffer searched by binary search.
//!   - RobinHood (internal): probe table of distances and slots; knows
//!     nothing about hashing or equality.
//!   - FlatHashMap: RobinHood storing whole buckets.
//!   - FlatOrderedHashMap: insertion-ordered Buffer plus a RobinHood of
//!     dense positions.
//!
//! Constraints
//! - Single owner; no interior mutability, no shared state between
//!   containers. `Clone` is a deep copy.
//! - Stored buckets are exactly `stride` bytes. Lookup probes may be
//!   shorter: only the bytes the comparator and hasher read are needed.
//! - At most one bucket per key in each map; pushing an existing key
//!   returns the stored bucket and leaves the map untouched.
//!
//! Capacity policy
//! - Capacities are powers of two, never below `MIN_CAPACITY`.
//! - Buffer/FlatMap/FlatOrderedHashMap dense side grow to the next power
//!   of two on demand and shrink to twice the length once less than a
//!   quarter full.
//! - Hash tables grow when the load would pass three quarters, to the
//!   capacity for twice the required length, and shrink to the capacity
//!   for the current length once less than a quarter full.
//!
//! Robin Hood invariants
//! - Every occupied slot records its distance from its ideal slot; a probe
//!   stops as soon as it is further from home than the resident.
//! - Removal is a backward shift: no tombstones, so distances stay exact.
//! - The ordered map removes by shifting the dense tail down, then
//!   decrementing every sparse position past the removed one.
//!
//! Error policy
//! - Every growing operation has a `try_*` form returning [`Error`].
//! - The plain forms treat an error as fatal: allocation failure goes to
//!   `handle_alloc_error`, anything else (zero or mismatched stride, capacity
//!   overflow, out-of-range insert) panics with the error message.
//! - Lookups and removals of absent keys are not errors; they return
//!   `None`/`false`.

mod bucket;
mod buffer;
mod capacity;
mod error;
mod flat_hash_map;
mod flat_map;
mod hash_map_proptest;
mod ordered_hash_map;
mod robin_hood;
mod text;

// Public surface
pub use bucket::{BucketCmp, BucketHash, PodKey};
pub use buffer::Buffer;
pub use capacity::{capacity_for, checked_capacity_for, MIN_CAPACITY};
pub use error::Error;
pub use flat_hash_map::FlatHashMap;
pub use flat_map::FlatMap;
pub use ordered_hash_map::FlatOrderedHashMap;
pub use text::{text_cmp, text_hash, TextBuffer};
