// HashMap integration suite.
//
// Each test documents the behavior being verified. Core invariants:
// - Uniqueness: put on an existing key overwrites in place.
// - Traversal: begin..end visits every live entry exactly once.
// - Ownership: every stored key and value is freed exactly once, and the
//   pool returns to zero when the map goes away.
// - Atomic failure: Full and OutOfMemory leave the map untouched.
use chained_hashmap::{
    Container, Descriptor, ForwardCursor, HashMap, Linked, Map, MapConfig, MapError, Pool,
    Standard,
};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

// Test: integer keys mapped to themselves.
// Verifies: traversal visits all 500 with key == value; erasing each key
// individually empties the map and shrinks it back to one bucket.
#[test]
fn integers_traverse_then_erase_all() {
    let mut m: HashMap<u32, u32> = HashMap::new();
    for k in 0..500 {
        m.put(&k, &k).unwrap();
    }
    assert_eq!(m.len(), 500);

    let mut seen = BTreeSet::new();
    let mut c = m.begin();
    let end = m.end();
    while c != end {
        let (k, v) = c.pair().unwrap();
        assert_eq!(k, v);
        assert!(seen.insert(*k), "visited twice: {k}");
        c.move_next();
    }
    assert_eq!(seen.len(), 500);

    for k in 0..500 {
        m.erase(&k);
    }
    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 1);
    assert_eq!(m.begin(), m.end());
}

// Test: string keys "0".."99" mapped to their integer value.
// Verifies: a trait-level traversal reproduces every pair exactly once.
#[test]
fn string_keys_foreach_reproduces_pairs() {
    let mut m: HashMap<String, i64> = HashMap::new();
    for i in 0..100 {
        m.put(&i.to_string(), &i).unwrap();
    }
    let mut got = BTreeMap::new();
    for (k, v) in chained_hashmap::algo::collect_pairs(&m) {
        assert!(got.insert(k.clone(), *v).is_none());
    }
    let want: BTreeMap<String, i64> = (0..100).map(|i| (i.to_string(), i)).collect();
    assert_eq!(got, want);
}

/// Counts frees of the values it manages.
#[derive(Clone, Default)]
struct CountingFree {
    frees: Rc<Cell<usize>>,
}

impl Descriptor for CountingFree {
    type Item = String;

    fn hash(&self, item: &String) -> u64 {
        item.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
    }

    fn equal(&self, a: &String, b: &String) -> bool {
        a == b
    }

    fn copy(&self, _pool: &Pool, src: &String) -> Result<String, MapError> {
        Ok(src.clone())
    }

    fn free(&self, _pool: &Pool, item: String) {
        self.frees.set(self.frees.get() + 1);
        drop(item);
    }
}

/// Byte buffers charged to the map's pool at their length.
#[derive(Clone, Default)]
struct Charged;

impl Descriptor for Charged {
    type Item = Vec<u8>;

    fn hash(&self, item: &Vec<u8>) -> u64 {
        item.iter().fold(0u64, |h, b| h.rotate_left(5) ^ u64::from(*b))
    }

    fn equal(&self, a: &Vec<u8>, b: &Vec<u8>) -> bool {
        a == b
    }

    fn copy(&self, pool: &Pool, src: &Vec<u8>) -> Result<Vec<u8>, MapError> {
        pool.alloc(src.len())?;
        Ok(src.clone())
    }

    fn free(&self, pool: &Pool, item: Vec<u8>) {
        pool.free(item.len());
    }
}

// Test: a descriptor that charges the pool in copy.
// Verifies: free receives the same pool, so overwrite, erase and drop hand
// every byte back; a charge the pool refuses fails the put atomically.
#[test]
fn descriptor_charges_are_returned_through_free() {
    let pool = Pool::with_limit(4096);
    let mut m: HashMap<u32, Vec<u8>, Standard<u32>, Charged> =
        HashMap::construct(Rc::clone(&pool), Standard::new(), Charged).unwrap();
    let empty = pool.in_use();
    for k in 0..8u8 {
        m.put(&u32::from(k), &vec![k; 100]).unwrap();
    }
    m.put(&0, &vec![9; 10]).unwrap();
    m.erase(&1);

    let before = pool.in_use();
    assert!(matches!(
        m.put(&99, &vec![0; 8192]),
        Err(MapError::OutOfMemory { .. })
    ));
    assert_eq!(pool.in_use(), before);
    assert!(!m.exist(&99));

    m.clear();
    assert_eq!(pool.in_use(), empty);
    drop(m);
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pool.live_blocks(), 0);
}

// Test: overwriting an existing key.
// Verifies: size does not grow, get returns the new value, and the old
// value is freed exactly once per overwrite.
#[test]
fn overwrite_frees_old_value_once() {
    let vd = CountingFree::default();
    let mut m: HashMap<u32, String, Standard<u32>, CountingFree> =
        HashMap::construct(Pool::unbounded(), Standard::new(), vd.clone()).unwrap();
    m.put(&1, &"a".to_string()).unwrap();
    for (n, v) in ["b", "c", "d"].into_iter().enumerate() {
        m.put(&1, &v.to_string()).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&1).map(String::as_str), Some(v));
        assert_eq!(vd.frees.get(), n + 1);
    }
    drop(m);
    assert_eq!(vd.frees.get(), 4);
}

// Test: a map with a capped bucket count.
// Verifies: growth stops at max_capacity and the next new key is rejected
// with Full; overwriting an existing key still succeeds.
#[test]
fn full_at_max_capacity() {
    let mut m: HashMap<u32, u32> = HashMap::with_config(
        Pool::unbounded(),
        Standard::new(),
        Standard::new(),
        MapConfig::new().with_max_capacity(7),
    )
    .unwrap();
    for k in 0..7 {
        m.put(&k, &k).unwrap();
    }
    assert_eq!(m.capacity(), 7);
    assert_eq!(m.put(&99, &0), Err(MapError::Full { capacity: 7 }));
    assert_eq!(m.len(), 7);
    assert!(!m.exist(&99));
    m.put(&3, &30).unwrap();
    assert_eq!(m.get(&3), Some(&30));
}

// Test: a pool too small for the working set.
// Verifies: OutOfMemory surfaces from put, the map keeps every entry it
// already had, and the pool never exceeds its limit.
#[test]
fn out_of_memory_from_bounded_pool() {
    let pool = Pool::with_limit(1024);
    let mut m: HashMap<u64, u64> =
        HashMap::construct(Rc::clone(&pool), Standard::new(), Standard::new()).unwrap();
    let mut stored = 0;
    let err = loop {
        match m.put(&stored, &stored) {
            Ok(_) => stored += 1,
            Err(e) => break e,
        }
    };
    assert!(matches!(err, MapError::OutOfMemory { .. }));
    assert_eq!(m.len() as u64, stored);
    assert!(pool.in_use() <= 1024);
    for k in 0..stored {
        assert_eq!(m.get(&k), Some(&k));
    }
    drop(m);
    assert_eq!(pool.in_use(), 0);
}

// Test: construction on a pool that cannot hold even one bucket.
#[test]
fn construct_fails_on_empty_pool() {
    let r: Result<HashMap<u8, u8>, _> =
        HashMap::construct(Pool::with_limit(0), Standard::new(), Standard::new());
    assert!(matches!(r, Err(MapError::OutOfMemory { .. })));
}

// Test: clear frees everything and the map stays usable.
#[test]
fn clear_then_reuse() {
    let pool = Pool::unbounded();
    let mut m: HashMap<String, Vec<u32>> =
        HashMap::construct(Rc::clone(&pool), Standard::new(), Standard::new()).unwrap();
    for i in 0..64u32 {
        m.put(&format!("{i}"), &vec![i; 4]).unwrap();
    }
    let empty_bytes = {
        let fresh: HashMap<String, Vec<u32>> =
            HashMap::construct(Pool::unbounded(), Standard::new(), Standard::new()).unwrap();
        fresh.pool().in_use()
    };
    Container::clear(&mut m);
    assert_eq!(m.len(), 0);
    assert_eq!(pool.in_use(), empty_bytes);
    m.put(&"again".to_string(), &vec![1]).unwrap();
    assert_eq!(m.len(), 1);
}

// Test: change_key through the Map trait.
// Verifies: the value follows the key and a collision at the new key is
// evicted.
#[test]
fn change_key_through_trait() {
    fn rekey<M: Map<Key = u32, Elem = u32>>(m: &mut M) {
        m.put(&1, &10).unwrap();
        m.put(&2, &20).unwrap();
        assert_eq!(m.change_key(&1, &2).unwrap(), &2);
        assert_eq!(m.size(), 1);
        assert_eq!(m.get(&2), Some(&10));
        assert!(!m.exist(&1));
    }
    let mut m: HashMap<u32, u32> = HashMap::new();
    rekey(&mut m);
}

// Test: at/iterator_key through the Map trait.
#[test]
fn at_and_iterator_key_through_trait() {
    fn lookup_b<M: Map<Key = String, Elem = u32>>(m: &M) {
        let c = m.at(&"b".to_string());
        assert_eq!(c.get(), Some(&2));
        assert_eq!(m.iterator_key(&c).map(String::as_str), Some("b"));
        let miss = m.at(&"zz".to_string());
        assert!(miss == m.end());
        assert!(ForwardCursor::is_end(&miss));
    }
    let mut m: HashMap<String, u32> = HashMap::new();
    for (i, s) in ["a", "b", "c"].iter().enumerate() {
        m.put(&s.to_string(), &(i as u32 + 1)).unwrap();
    }
    lookup_b(&m);
}

// Test: large values are stored linked without changing observable behavior.
#[test]
fn linked_values_behave_like_inline() {
    let pool = Pool::unbounded();
    let mut m: HashMap<u16, [u64; 16], Standard<u16>, Linked<Standard<[u64; 16]>>> =
        HashMap::construct(Rc::clone(&pool), Standard::new(), Linked(Standard::new())).unwrap();
    for k in 0..40u16 {
        m.put(&k, &[u64::from(k); 16]).unwrap();
    }
    for k in (0..40u16).step_by(3) {
        m.erase(&k);
    }
    for k in 0..40u16 {
        let want = (k % 3 != 0).then_some([u64::from(k); 16]);
        assert_eq!(m.get(&k).copied(), want);
    }
    drop(m);
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pool.live_blocks(), 0);
}

// Test: try_clone copies into the same pool and both copies are freed.
#[test]
fn try_clone_charges_same_pool() {
    let pool = Pool::unbounded();
    let mut m: HashMap<u32, String> =
        HashMap::construct(Rc::clone(&pool), Standard::new(), Standard::new()).unwrap();
    for k in 0..10 {
        m.put(&k, &format!("{k}")).unwrap();
    }
    let one = pool.in_use();
    let c = m.try_clone().unwrap();
    assert_eq!(pool.in_use(), 2 * one);
    assert_eq!(format!("{:?}", c.get(&4)), "Some(\"4\")");
    drop(m);
    drop(c);
    assert_eq!(pool.in_use(), 0);
}

#[test]
#[should_panic(expected = "erase: key is not present")]
fn erase_absent_key_panics() {
    let mut m: HashMap<u32, u32> = HashMap::new();
    m.put(&1, &1).unwrap();
    m.erase(&2);
}
