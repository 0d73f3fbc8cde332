// Hash map suite (public API only).
//
// Each test states what behavior is being verified and the invariants it
// relies on. Core invariants exercised:
// - Uniqueness: at most one bucket per key; duplicate push returns the
//   stored bucket unchanged.
// - Capacity: always a power of two, at least 8; grows before load passes
//   three quarters, shrinks once below one quarter.
// - Lookup: any key-prefix probe finds the bucket; removed keys miss.
// - Order: FlatOrderedHashMap iterates in insertion order, also after
//   removals from the middle.
use bytemuck::{Pod, Zeroable};
use flat_containers::{
    text_cmp, text_hash, Error, FlatHashMap, FlatOrderedHashMap, PodKey, MIN_CAPACITY,
};

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

fn lookup(m: &Map, key: u32) -> Option<Entry> {
    m.get(&key.to_ne_bytes()).map(bytemuck::pod_read_unaligned)
}

// Test: grow on insert, shrink on remove.
// Assumes: initial capacity 8 for initial_len 0.
// Verifies: 20 inserts pass through 8 -> 16 -> 32; removing 1..=10 keeps
// 11..=20 reachable; removing down to 7 entries shrinks the table.
#[test]
fn grow_then_shrink_keeps_lookups_exact() {
    let mut m: Map = FlatHashMap::new(8, 0, PodKey::new(), PodKey::new());
    assert_eq!(m.capacity(), MIN_CAPACITY);
    let mut caps = vec![m.capacity()];
    for k in 1..=20u32 {
        assert!(m.push(bytemuck::bytes_of(&entry(k, k * 100))).is_none());
        if caps.last() != Some(&m.capacity()) {
            caps.push(m.capacity());
        }
    }
    assert_eq!(caps, vec![8, 16, 32]);
    for k in 1..=20u32 {
        assert_eq!(lookup(&m, k), Some(entry(k, k * 100)));
    }

    let mut out = [0u8; 8];
    for k in 1..=10u32 {
        assert!(m.pop(&k.to_ne_bytes(), &mut out));
        assert_eq!(bytemuck::pod_read_unaligned::<Entry>(&out), entry(k, k * 100));
    }
    for k in 1..=10u32 {
        assert_eq!(lookup(&m, k), None);
    }
    for k in 11..=20u32 {
        assert_eq!(lookup(&m, k), Some(entry(k, k * 100)));
    }

    // Still 10 of 32: no shrink until fewer than a quarter remain.
    assert_eq!(m.capacity(), 32);
    for k in 11..=13u32 {
        assert!(m.pop(&k.to_ne_bytes(), &mut out));
    }
    assert_eq!(m.len(), 7);
    assert_eq!(m.capacity(), 8);
    for k in 14..=20u32 {
        assert_eq!(lookup(&m, k), Some(entry(k, k * 100)));
    }
}

// Test: duplicate policy through both push forms.
#[test]
fn duplicate_push_is_rejected_without_overwrite() {
    let mut m: Map = FlatHashMap::new(8, 4, PodKey::new(), PodKey::new());
    m.push(bytemuck::bytes_of(&entry(9, 1)));
    let existing = m.push(bytemuck::bytes_of(&entry(9, 2))).map(|b| b.to_vec());
    assert_eq!(existing.as_deref(), Some(bytemuck::bytes_of(&entry(9, 1))));
    assert_eq!(
        m.try_push(bytemuck::bytes_of(&entry(9, 3))),
        Err(Error::DuplicateKey)
    );
    assert_eq!(lookup(&m, 9), Some(entry(9, 1)));
    assert_eq!(m.len(), 1);
}

// Test: a bucket of the wrong size is an error, not a silent truncation.
#[test]
fn wrong_stride_is_reported() {
    let mut m: Map = FlatHashMap::new(8, 0, PodKey::new(), PodKey::new());
    assert_eq!(
        m.try_push(&[0u8; 4]),
        Err(Error::StrideMismatch {
            expected: 8,
            actual: 4
        })
    );
    assert!(m.is_empty());
}

#[test]
#[should_panic(expected = "stride mismatch")]
fn push_with_wrong_stride_panics() {
    let mut m: Map = FlatHashMap::new(8, 0, PodKey::new(), PodKey::new());
    m.push(&[0u8; 12]);
}

// Test: NUL-terminated string keys through the text helpers.
// Assumes: buckets hold a 16-byte NUL-padded name followed by a u32.
// Verifies: lookups by a bare name probe, ordering independent of padding.
#[test]
fn text_keys_with_text_helpers() {
    fn named(name: &str, value: u32) -> [u8; 20] {
        let mut b = [0u8; 20];
        b[..name.len()].copy_from_slice(name.as_bytes());
        b[16..].copy_from_slice(&value.to_ne_bytes());
        b
    }
    let hash = |b: &[u8]| text_hash(&b[..b.len().min(16)]);
    let cmp = |a: &[u8], b: &[u8]| text_cmp(&a[..a.len().min(16)], &b[..b.len().min(16)]);
    let mut m = FlatOrderedHashMap::new(20, 0, hash, cmp);
    for (i, name) in ["delta", "alpha", "charlie", "bravo"].iter().enumerate() {
        assert!(m.push(&named(name, i as u32)).is_none());
    }
    let probe = b"charlie\0";
    let found = m.get(probe).map(|b| b[16..].to_vec());
    assert_eq!(found, Some(2u32.to_ne_bytes().to_vec()));
    assert_eq!(m.index_of(b"alpha\0"), Some(1));
    assert!(m.get(b"echo\0").is_none());
}

// Test: insertion order survives removals and growth.
#[test]
fn ordered_map_keeps_insertion_order() {
    let mut m = FlatOrderedHashMap::new(8, 0, PodKey::<u32>::new(), PodKey::<u32>::new());
    let order = [42u32, 7, 19, 3, 88, 61, 5, 23, 11, 70, 2, 99, 14];
    for &k in &order {
        m.push(bytemuck::bytes_of(&entry(k, k + 1)));
    }
    let mut out = [0u8; 8];
    for k in [19u32, 88, 2] {
        assert!(m.pop(&k.to_ne_bytes(), &mut out));
    }
    m.push(bytemuck::bytes_of(&entry(19, 0)));
    let keys: Vec<u32> = m.iter().map(PodKey::<u32>::read).collect();
    assert_eq!(keys, vec![42, 7, 3, 61, 5, 23, 11, 70, 99, 14, 19]);
    for (pos, &k) in keys.iter().enumerate() {
        assert_eq!(m.index_of(&k.to_ne_bytes()), Some(pos));
    }
}

// Test: clones are deep copies.
#[test]
fn clone_is_independent() {
    let mut a: Map = FlatHashMap::new(8, 0, PodKey::new(), PodKey::new());
    for k in 0..10u32 {
        a.push(bytemuck::bytes_of(&entry(k, k)));
    }
    let mut b = a.clone();
    let mut out = [0u8; 8];
    b.pop(&3u32.to_ne_bytes(), &mut out);
    b.get_mut(&4u32.to_ne_bytes()).unwrap()[4..].copy_from_slice(&40u32.to_ne_bytes());
    assert_eq!(lookup(&a, 3), Some(entry(3, 3)));
    assert_eq!(lookup(&a, 4), Some(entry(4, 4)));
    assert_eq!(lookup(&b, 3), None);
    assert_eq!(lookup(&b, 4), Some(entry(4, 40)));
}

// Test: reserve up front avoids rehashing during the fill.
#[test]
fn reserve_then_fill_keeps_capacity() {
    let mut m: Map = FlatHashMap::new(8, 0, PodKey::new(), PodKey::new());
    m.reserve(300);
    let cap = m.capacity();
    assert!(cap.is_power_of_two());
    assert!(300 <= cap - cap / 4);
    for k in 0..300u32 {
        m.push(bytemuck::bytes_of(&entry(k, 0)));
    }
    assert_eq!(m.capacity(), cap);
    assert_eq!(m.len(), 300);
}
