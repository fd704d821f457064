#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can call the
// structural invariant checker.

use crate::config::MapConfig;
use crate::descriptor::{Linked, Standard};
use crate::pool::Pool;
use crate::HashMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Erase(usize),
    Get(usize),
    Exist(String),
    ChangeKey(usize, usize),
    CursorErase(usize),
    Mutate(usize, i32),
    Shrink,
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[a-z]{0,5}".prop_map(Op::Exist),
            2 => (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::ChangeKey(a, b)),
            2 => idx.clone().prop_map(Op::CursorErase),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Shrink),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

type Model = BTreeMap<String, i32>;

fn contents<KD, VD>(m: &HashMap<String, i32, KD, VD>) -> Model
where
    KD: crate::Descriptor<Item = String>,
    VD: crate::Descriptor<Item = i32>,
{
    m.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Apply one op to both sides and compare.
fn step<KD, VD>(
    sut: &mut HashMap<String, i32, KD, VD>,
    model: &mut Model,
    pool: &[String],
    op: Op,
) -> Result<(), TestCaseError>
where
    KD: crate::Descriptor<Item = String>,
    VD: crate::Descriptor<Item = i32>,
{
    match op {
        Op::Put(i, v) => {
            let k = &pool[i];
            let stored = *sut.put(k, &v).expect("unbounded pool");
            prop_assert_eq!(stored, v);
            model.insert(k.clone(), v);
        }
        Op::Erase(i) => {
            let k = &pool[i];
            prop_assert_eq!(sut.exist(k), model.contains_key(k));
            if model.remove(k).is_some() {
                sut.erase(k);
                prop_assert!(!sut.exist(k));
            }
        }
        Op::Get(i) => {
            let k = &pool[i];
            prop_assert_eq!(sut.get(k), model.get(k));
            let c = sut.at(k);
            prop_assert_eq!(c.is_end(), !model.contains_key(k));
            prop_assert_eq!(sut.iterator_key(&c), model.get_key_value(k).map(|(k, _)| k));
        }
        Op::Exist(s) => {
            prop_assert_eq!(sut.exist(&s), model.contains_key(&s));
        }
        Op::ChangeKey(a, b) => {
            let (old, new) = (&pool[a], &pool[b]);
            if let Some(v) = model.remove(old) {
                let k = sut.change_key(old, new).expect("unbounded pool");
                prop_assert_eq!(k, new);
                model.insert(new.clone(), v);
                prop_assert_eq!(sut.get(new), Some(&v));
            }
        }
        Op::CursorErase(i) => {
            let k = &pool[i];
            let cap = sut.capacity();
            let mut c = sut.at_mut(k);
            if !c.is_end() {
                c.erase();
                prop_assert!(c.is_end());
                model.remove(k);
                prop_assert_eq!(sut.capacity(), cap, "cursor erase never shrinks");
            }
        }
        Op::Mutate(i, d) => {
            let k = &pool[i];
            if let Some(v) = sut.get_mut(k) {
                *v = v.wrapping_add(d);
            }
            if let Some(v) = model.get_mut(k) {
                *v = v.wrapping_add(d);
            }
        }
        Op::Shrink => {
            sut.shrink_to_fit().expect("unbounded pool");
        }
        Op::Clear => {
            sut.clear();
            model.clear();
            prop_assert_eq!(sut.capacity(), 1);
        }
        Op::Iterate => {
            let mut keys = BTreeSet::new();
            let mut c = sut.begin();
            while let Some((k, _)) = c.pair() {
                prop_assert!(keys.insert(k.clone()), "each entry visited once");
                c.move_next();
            }
            prop_assert_eq!(keys.len(), model.len());
            prop_assert_eq!(contents(sut), model.clone());
        }
    }
    sut.check_invariants();
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());
    prop_assert!(sut.len() <= sut.capacity() * sut.config().growth_threshold());
    Ok(())
}

// Property: state-machine equivalence against an ordered std map.
// - put inserts or overwrites; get/exist/at agree with the model.
// - erase and cursor erase remove exactly one entry.
// - change_key moves the value and evicts whatever sat at the new key.
// - traversal visits every live entry exactly once.
// - load never exceeds capacity * growth_threshold.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<String, i32> = HashMap::new();
        let mut model = Model::new();
        for op in ops {
            step(&mut sut, &mut model, &pool, op)?;
        }
        let p = std::rc::Rc::clone(sut.pool());
        drop(sut);
        prop_assert_eq!(p.in_use(), 0);
        prop_assert_eq!(p.live_blocks(), 0);
    }
}

// Constant hasher: every key lands in one chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants under worst-case collisions, with linked keys
// and a higher growth threshold.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<String, i32, Linked<Standard<String, ConstBuildHasher>>, Standard<i32>> =
            HashMap::with_config(
                Pool::unbounded(),
                Linked(Standard::with_hasher(ConstBuildHasher)),
                Standard::new(),
                MapConfig::new().with_growth_threshold(3),
            )
            .expect("valid config");
        let mut model = Model::new();
        for op in ops {
            step(&mut sut, &mut model, &pool, op)?;
        }
    }
}

// Property: a capped pool either accepts a put or rejects it leaving the
// map and the pool exactly as they were.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bounded_pool_failures_are_atomic(
        limit in 64usize..2048,
        keys in proptest::collection::vec(0u16..200, 1..60),
    ) {
        let pool = Pool::with_limit(limit);
        let Ok(mut sut) = HashMap::<u16, u16>::construct(pool.clone(), Standard::new(), Standard::new()) else {
            return Ok(());
        };
        let mut model = BTreeMap::new();
        for k in keys {
            let before = (sut.len(), sut.capacity(), pool.in_use());
            match sut.put(&k, &k) {
                Ok(_) => {
                    model.insert(k, k);
                }
                Err(_) => {
                    prop_assert_eq!((sut.len(), sut.capacity(), pool.in_use()), before);
                }
            }
            prop_assert!(pool.in_use() <= limit);
            sut.check_invariants();
        }
        let got: BTreeMap<u16, u16> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, model);
    }
}
