#![cfg(test)]

// Property tests for the two hash maps, kept inside the crate so they can
// call the structural `verify` checks.

use crate::bucket::PodKey;
use crate::error::Error;
use crate::flat_hash_map::FlatHashMap;
use crate::ordered_hash_map::FlatOrderedHashMap;
use proptest::prelude::*;
use std::collections::HashMap;

// Keys are drawn from a small range so inserts, hits and misses all occur;
// a narrow hash mask forces long collision runs on top of that.
#[derive(Clone, Debug)]
enum Op {
    Push(u16, u32),
    TryPush(u16, u32),
    Pop(u16),
    Get(u16),
    Mutate(u16, u32),
    Reserve(u8),
    Trim,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u16..64;
    let op = prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Push(k, v)),
        1 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::TryPush(k, v)),
        3 => key.clone().prop_map(Op::Pop),
        2 => key.clone().prop_map(Op::Get),
        1 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Mutate(k, v)),
        1 => any::<u8>().prop_map(Op::Reserve),
        1 => Just(Op::Trim),
    ];
    proptest::collection::vec(op, 1..200)
}

fn bucket(key: u16, value: u32) -> [u8; 6] {
    let mut b = [0u8; 6];
    b[..2].copy_from_slice(&key.to_ne_bytes());
    b[2..].copy_from_slice(&value.to_ne_bytes());
    b
}

fn value_of(b: &[u8]) -> u32 {
    bytemuck::pod_read_unaligned(&b[2..6])
}

// Weak hash: only the low three bits of the key survive.
fn clustered(bucket: &[u8]) -> u64 {
    u64::from(bucket[0] & 7)
}

// Property: FlatHashMap tracks std HashMap across random operations.
// - Duplicate pushes return the stored bucket and never overwrite.
// - `pop` copies out exactly the stored bucket.
// - `iter` yields each live bucket once; `len` agrees after each op.
// - Capacity stays a power of two, at least the minimum; after `reserve(n)`
//   n buckets fit under the three-quarter load bound.
// - Robin Hood invariants hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_flat_hash_map_state_machine(ops in arb_ops(), weak in any::<bool>()) {
        let hash: fn(&[u8]) -> u64 = if weak {
            clustered
        } else {
            |b: &[u8]| u64::from(PodKey::<u16>::read(b)).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        };
        let mut sut = FlatHashMap::new(6, 0, hash, PodKey::<u16>::new());
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Push(k, v) => {
                    let existing = sut.push(&bucket(k, v)).map(value_of);
                    prop_assert_eq!(existing, model.get(&k).copied());
                    model.entry(k).or_insert(v);
                }
                Op::TryPush(k, v) => {
                    let res = sut.try_push(&bucket(k, v));
                    if model.contains_key(&k) {
                        prop_assert_eq!(res, Err(Error::DuplicateKey));
                    } else {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(k, v);
                    }
                }
                Op::Pop(k) => {
                    let mut out = [0u8; 6];
                    let found = sut.pop(&k.to_ne_bytes(), &mut out);
                    match model.remove(&k) {
                        Some(v) => {
                            prop_assert!(found);
                            prop_assert_eq!(out, bucket(k, v));
                        }
                        None => prop_assert!(!found),
                    }
                }
                Op::Get(k) => {
                    let got = sut.get(&k.to_ne_bytes()).map(value_of);
                    prop_assert_eq!(got, model.get(&k).copied());
                    prop_assert_eq!(sut.contains(&k.to_ne_bytes()), model.contains_key(&k));
                }
                Op::Mutate(k, v) => {
                    if let Some(b) = sut.get_mut(&k.to_ne_bytes()) {
                        b[2..].copy_from_slice(&v.to_ne_bytes());
                    }
                    if let Some(slot) = model.get_mut(&k) {
                        *slot = v;
                    }
                }
                Op::Reserve(n) => {
                    sut.reserve(model.len() + usize::from(n));
                    let cap = sut.capacity();
                    prop_assert!(model.len() + usize::from(n) <= cap - cap / 4);
                }
                Op::Trim => sut.trim(),
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity().is_power_of_two());
            prop_assert!(sut.capacity() >= crate::capacity::MIN_CAPACITY);
            if let Err(e) = sut.verify() {
                return Err(TestCaseError::fail(e));
            }
            let mut stored: Vec<(u16, u32)> = sut
                .iter()
                .map(|b| (PodKey::<u16>::read(b), value_of(b)))
                .collect();
            stored.sort_unstable();
            let mut expected: Vec<(u16, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
            expected.sort_unstable();
            prop_assert_eq!(stored, expected);
        }
    }
}

// Property: FlatOrderedHashMap behaves like an insertion-ordered map.
// The model is a Vec of (key, value) in insertion order; removal keeps the
// relative order of the rest, reinsertion appends.
// - Iteration order matches the model exactly after every op.
// - `index_of`/`get_index` agree with the model's positions.
// - Sparse index points at every dense position exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_hash_map_state_machine(ops in arb_ops(), weak in any::<bool>()) {
        let hash: fn(&[u8]) -> u64 = if weak {
            clustered
        } else {
            |b: &[u8]| u64::from(PodKey::<u16>::read(b)).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        };
        let mut sut = FlatOrderedHashMap::new(6, 0, hash, PodKey::<u16>::new());
        let mut model: Vec<(u16, u32)> = Vec::new();

        for op in ops {
            let pos = |model: &Vec<(u16, u32)>, k: u16| model.iter().position(|&(mk, _)| mk == k);
            match op {
                Op::Push(k, v) | Op::TryPush(k, v) => {
                    let existing = sut.push(&bucket(k, v)).map(value_of);
                    match pos(&model, k) {
                        Some(i) => prop_assert_eq!(existing, Some(model[i].1)),
                        None => {
                            prop_assert_eq!(existing, None);
                            model.push((k, v));
                        }
                    }
                }
                Op::Pop(k) => {
                    let mut out = [0u8; 6];
                    let found = sut.pop(&k.to_ne_bytes(), &mut out);
                    match pos(&model, k) {
                        Some(i) => {
                            let (_, v) = model.remove(i);
                            prop_assert!(found);
                            prop_assert_eq!(out, bucket(k, v));
                        }
                        None => prop_assert!(!found),
                    }
                }
                Op::Get(k) => {
                    let i = pos(&model, k);
                    prop_assert_eq!(sut.index_of(&k.to_ne_bytes()), i);
                    if let Some(i) = i {
                        prop_assert_eq!(sut.get_index(i).map(value_of), Some(model[i].1));
                    }
                }
                Op::Mutate(k, v) => {
                    if let Some(b) = sut.get_mut(&k.to_ne_bytes()) {
                        b[2..].copy_from_slice(&v.to_ne_bytes());
                    }
                    if let Some(i) = pos(&model, k) {
                        model[i].1 = v;
                    }
                }
                Op::Reserve(n) => sut.reserve(model.len() + usize::from(n)),
                Op::Trim => sut.trim(),
            }

            prop_assert_eq!(sut.len(), model.len());
            if let Err(e) = sut.verify() {
                return Err(TestCaseError::fail(e));
            }
            let stored: Vec<(u16, u32)> = sut
                .iter()
                .map(|b| (PodKey::<u16>::read(b), value_of(b)))
                .collect();
            prop_assert_eq!(&stored, &model);
        }
    }
}
