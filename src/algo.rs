//! Algorithms written against the capability traits only. None of them know
//! which container they run on.

use crate::error::MapError;
use crate::traits::{Container, ForwardCursor, Map};

/// Visit every element once, in the container's traversal order.
pub fn for_each<C, F>(container: &C, mut f: F)
where
    C: Container,
    F: FnMut(&C::Elem),
{
    let mut cur = container.begin();
    let end = container.end();
    while cur != end {
        if let Some(v) = cur.get() {
            f(v);
        }
        cur.move_next();
    }
}

pub fn count_if<C, P>(container: &C, mut pred: P) -> usize
where
    C: Container,
    P: FnMut(&C::Elem) -> bool,
{
    let mut n = 0;
    for_each(container, |v| {
        if pred(v) {
            n += 1;
        }
    });
    n
}

/// Cursor at the first element matching `pred`, or the end cursor.
pub fn find_value<C, P>(container: &C, mut pred: P) -> C::Cursor<'_>
where
    C: Container,
    P: FnMut(&C::Elem) -> bool,
{
    let mut cur = container.begin();
    while let Some(v) = cur.get() {
        if pred(v) {
            break;
        }
        cur.move_next();
    }
    cur
}

/// Borrow every `(key, value)` pair of a map.
pub fn collect_pairs<M: Map>(map: &M) -> Vec<(&M::Key, &M::Elem)> {
    let mut out = Vec::with_capacity(map.size());
    let mut cur = map.begin();
    while !cur.is_end() {
        if let (Some(k), Some(v)) = (map.iterator_key(&cur), cur.get()) {
            out.push((k, v));
        }
        cur.move_next();
    }
    out
}

/// Put every entry of `src` into `dst`, returning how many were copied.
/// Stops at the first failure; entries copied before it stay in `dst`.
pub fn copy_entries<S, D>(src: &S, dst: &mut D) -> Result<usize, MapError>
where
    S: Map,
    D: Map<Key = S::Key, Elem = S::Elem>,
{
    let mut n = 0;
    let mut cur = src.begin();
    while let (Some(k), Some(v)) = (src.iterator_key(&cur), cur.get()) {
        dst.put(k, v)?;
        n += 1;
        cur.move_next();
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::descriptor::Standard;
    use crate::pool::Pool;
    use crate::HashMap;
    use std::collections::BTreeSet;

    fn squares(n: u32) -> HashMap<u32, u32> {
        let mut m = HashMap::new();
        for k in 0..n {
            m.put(&k, &(k * k)).unwrap();
        }
        m
    }

    #[test]
    fn for_each_visits_all() {
        let m = squares(12);
        let mut seen = BTreeSet::new();
        for_each(&m, |v| {
            seen.insert(*v);
        });
        assert_eq!(seen, (0..12).map(|k| k * k).collect());
    }

    #[test]
    fn count_if_on_empty_and_full() {
        let empty: HashMap<u32, u32> = HashMap::new();
        assert_eq!(count_if(&empty, |_| true), 0);
        let m = squares(10);
        assert_eq!(count_if(&m, |v| v % 2 == 0), 5);
    }

    #[test]
    fn find_value_hits_and_misses() {
        let m = squares(10);
        let hit = find_value(&m, |v| *v == 49);
        assert_eq!(m.iterator_key(&hit), Some(&7));
        let miss = find_value(&m, |v| *v == 50);
        assert_eq!(miss, m.end());
    }

    #[test]
    fn collect_pairs_matches_iter() {
        let m = squares(20);
        let mut a = collect_pairs(&m);
        let mut b: Vec<_> = m.iter().collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn copy_entries_between_maps() {
        let src = squares(15);
        let mut dst: HashMap<u32, u32> = HashMap::new();
        dst.put(&3, &0).unwrap();
        assert_eq!(copy_entries(&src, &mut dst).unwrap(), 15);
        assert_eq!(dst.len(), 15);
        assert_eq!(dst.get(&3), Some(&9));
    }

    #[test]
    fn copy_entries_stops_when_destination_is_full() {
        let src = squares(10);
        let mut dst: HashMap<u32, u32> = HashMap::with_config(
            Pool::unbounded(),
            Standard::new(),
            Standard::new(),
            MapConfig::new().with_max_capacity(3),
        )
        .unwrap();
        assert_eq!(
            copy_entries(&src, &mut dst),
            Err(MapError::Full { capacity: 3 })
        );
        assert_eq!(dst.len(), 3);
    }
}
