//! Bucket table: the array of chain heads plus the doubly-linked list that
//! threads through the non-empty buckets only.

use slotmap::new_key_type;

new_key_type! {
    /// Arena key of one node.
    pub struct NodeKey;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Bucket {
    pub(crate) head: Option<NodeKey>,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl Bucket {
    pub(crate) const EMPTY: Bucket = Bucket {
        head: None,
        prev: None,
        next: None,
    };
}

/// Invariant: bucket `i` is on the occupied list iff `slots[i].head` is some.
#[derive(Debug)]
pub(crate) struct BucketTable {
    slots: Vec<Bucket>,
    occupied: Option<usize>,
}

impl BucketTable {
    pub(crate) fn single() -> Self {
        Self {
            slots: vec![Bucket::EMPTY],
            occupied: None,
        }
    }

    /// Allocate a table of `capacity` empty buckets, reporting failure.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, std::collections::TryReserveError> {
        debug_assert!(capacity >= 1);
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize(capacity, Bucket::EMPTY);
        Ok(Self {
            slots,
            occupied: None,
        })
    }

    /// Bytes charged to the pool for a table of `capacity` buckets.
    pub(crate) fn bytes_for(capacity: usize) -> usize {
        capacity.saturating_mul(core::mem::size_of::<Bucket>())
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn index_for(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn head(&self, index: usize) -> Option<NodeKey> {
        self.slots[index].head
    }

    #[inline]
    pub(crate) fn set_head(&mut self, index: usize, head: Option<NodeKey>) {
        self.slots[index].head = head;
    }

    #[inline]
    pub(crate) fn first_occupied(&self) -> Option<usize> {
        self.occupied
    }

    #[inline]
    pub(crate) fn next_occupied(&self, index: usize) -> Option<usize> {
        self.slots[index].next
    }

    /// Push `index` onto the front of the occupied list.
    pub(crate) fn link(&mut self, index: usize) {
        let old = self.occupied;
        if let Some(h) = old {
            self.slots[h].prev = Some(index);
        }
        let b = &mut self.slots[index];
        b.prev = None;
        b.next = old;
        self.occupied = Some(index);
    }

    /// Remove `index` from the occupied list.
    pub(crate) fn unlink(&mut self, index: usize) {
        let Bucket { prev, next, .. } = self.slots[index];
        match prev {
            Some(p) => self.slots[p].next = next,
            None => {
                debug_assert_eq!(self.occupied, Some(index));
                self.occupied = next;
            }
        }
        if let Some(n) = next {
            self.slots[n].prev = prev;
        }
        let b = &mut self.slots[index];
        b.prev = None;
        b.next = None;
    }

    #[cfg(test)]
    pub(crate) fn occupied_indices(&self) -> OccupiedIndices<'_> {
        OccupiedIndices {
            table: self,
            cur: self.occupied,
        }
    }
}

#[cfg(test)]
pub(crate) struct OccupiedIndices<'a> {
    table: &'a BucketTable,
    cur: Option<usize>,
}

#[cfg(test)]
impl<'a> Iterator for OccupiedIndices<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = self.cur?;
        self.cur = self.table.next_occupied(i);
        Some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::collections::BTreeSet;

    fn keys(n: usize) -> Vec<NodeKey> {
        let mut sm: SlotMap<NodeKey, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn occupied(t: &BucketTable) -> BTreeSet<usize> {
        t.occupied_indices().collect()
    }

    #[test]
    fn link_and_unlink_keep_list_consistent() {
        let k = keys(3);
        let mut t = BucketTable::try_with_capacity(5).unwrap();
        for (i, idx) in [1usize, 3, 4].into_iter().enumerate() {
            t.set_head(idx, Some(k[i]));
            t.link(idx);
        }
        assert_eq!(occupied(&t), BTreeSet::from([1, 3, 4]));

        // middle, head, tail
        t.unlink(3);
        t.set_head(3, None);
        assert_eq!(occupied(&t), BTreeSet::from([1, 4]));
        t.unlink(4);
        t.set_head(4, None);
        assert_eq!(occupied(&t), BTreeSet::from([1]));
        t.unlink(1);
        t.set_head(1, None);
        assert!(t.first_occupied().is_none());
    }

    #[test]
    fn index_is_hash_mod_capacity() {
        let t = BucketTable::try_with_capacity(7).unwrap();
        assert_eq!(t.capacity(), 7);
        assert_eq!(t.index_for(15), 1);
        assert_eq!(BucketTable::single().index_for(u64::MAX), 0);
    }

    #[test]
    fn huge_table_reports_failure() {
        assert!(BucketTable::try_with_capacity(usize::MAX / 2).is_err());
    }
}
