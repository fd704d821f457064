//! RawTable: the separately chained hash table engine.
//!
//! Nodes live in a `SlotMap` arena and are linked into bucket chains by
//! `NodeKey`. The bucket table keeps a second list threading only the
//! non-empty buckets so that full traversal costs O(occupied + len) rather
//! than O(capacity).
//!
//! Invariants
//! - `capacity() >= 1` and `len() <= capacity() * growth_threshold`.
//! - Every node is reachable from exactly one bucket, the one at
//!   `node.hash % capacity()`.
//! - A bucket is on the occupied list iff its chain is non-empty.
//! - Every fallible step of a mutation (descriptor copies, pool charges,
//!   table reservation) runs before the table changes shape, so an `Err`
//!   leaves the table as it was.
//!
//! Each node caches the key hash computed at insertion; rehash and cursor
//! advance use the cached value and never call back into the descriptor.

use crate::bucket::{BucketTable, NodeKey};
use crate::config::MapConfig;
use crate::descriptor::{linked_bytes, Descriptor, Slot};
use crate::error::MapError;
use crate::pool::Pool;
use slotmap::SlotMap;
use std::rc::Rc;

pub(crate) struct Node<K, V> {
    next: Option<NodeKey>,
    hash: u64,
    key: Slot<K>,
    value: Slot<V>,
}

pub(crate) type NodeOf<KD, VD> = Node<<KD as Descriptor>::Item, <VD as Descriptor>::Item>;

pub(crate) struct RawTable<KD: Descriptor, VD: Descriptor> {
    kd: KD,
    vd: VD,
    pool: Rc<Pool>,
    config: MapConfig,
    table: BucketTable,
    nodes: SlotMap<NodeKey, NodeOf<KD, VD>>,
}

impl<KD: Descriptor, VD: Descriptor> RawTable<KD, VD> {
    pub(crate) fn new(
        pool: Rc<Pool>,
        kd: KD,
        vd: VD,
        config: MapConfig,
    ) -> Result<Self, MapError> {
        config.validate()?;
        pool.alloc(BucketTable::bytes_for(1))?;
        Ok(Self {
            kd,
            vd,
            pool,
            config,
            table: BucketTable::single(),
            nodes: SlotMap::with_key(),
        })
    }

    /// Bytes charged to the pool per node, including linked slot storage.
    pub(crate) fn node_bytes() -> usize {
        core::mem::size_of::<NodeOf<KD, VD>>() + linked_bytes::<KD>() + linked_bytes::<VD>()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub(crate) fn config(&self) -> &MapConfig {
        &self.config
    }

    pub(crate) fn pool(&self) -> &Rc<Pool> {
        &self.pool
    }

    pub(crate) fn key_descriptor(&self) -> &KD {
        &self.kd
    }

    pub(crate) fn value_descriptor(&self) -> &VD {
        &self.vd
    }

    fn load_limit(&self) -> usize {
        self.capacity().saturating_mul(self.config.growth_threshold())
    }

    fn shrink_due(&self) -> bool {
        let cap = self.capacity();
        cap > 1 && self.len() <= (cap >> 2).saturating_mul(self.config.growth_threshold())
    }

    // ----- node access -----

    #[inline]
    pub(crate) fn contains_node(&self, nk: NodeKey) -> bool {
        self.nodes.contains_key(nk)
    }

    #[inline]
    pub(crate) fn key(&self, nk: NodeKey) -> &KD::Item {
        self.nodes[nk].key.get()
    }

    #[inline]
    pub(crate) fn value(&self, nk: NodeKey) -> &VD::Item {
        self.nodes[nk].value.get()
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, nk: NodeKey) -> &mut VD::Item {
        self.nodes[nk].value.get_mut()
    }

    /// Locate `key`, returning its chain predecessor and its node.
    fn find(&self, hash: u64, key: &KD::Item) -> Option<(Option<NodeKey>, NodeKey)> {
        let mut prev = None;
        let mut cur = self.table.head(self.table.index_for(hash));
        while let Some(nk) = cur {
            let node = &self.nodes[nk];
            if node.hash == hash && self.kd.equal(node.key.get(), key) {
                return Some((prev, nk));
            }
            prev = Some(nk);
            cur = node.next;
        }
        None
    }

    pub(crate) fn lookup(&self, key: &KD::Item) -> Option<NodeKey> {
        let hash = self.kd.hash(key);
        self.find(hash, key).map(|(_, nk)| nk)
    }

    /// Chain predecessor of a live node, found by identity.
    fn prev_of(&self, nk: NodeKey) -> Option<NodeKey> {
        let index = self.table.index_for(self.nodes[nk].hash);
        let mut prev = None;
        let mut cur = self.table.head(index);
        while let Some(k) = cur {
            if k == nk {
                return prev;
            }
            prev = Some(k);
            cur = self.nodes[k].next;
        }
        unreachable!("node is not on the chain of its bucket");
    }

    // ----- traversal -----

    pub(crate) fn first_node(&self) -> Option<NodeKey> {
        self.table
            .first_occupied()
            .and_then(|b| self.table.head(b))
    }

    pub(crate) fn next_node(&self, nk: NodeKey) -> Option<NodeKey> {
        let node = &self.nodes[nk];
        if node.next.is_some() {
            return node.next;
        }
        let index = self.table.index_for(node.hash);
        self.table
            .next_occupied(index)
            .and_then(|b| self.table.head(b))
    }

    // ----- chain surgery -----

    fn push_node(&mut self, index: usize, nk: NodeKey) {
        let head = self.table.head(index);
        if head.is_none() {
            self.table.link(index);
        }
        self.nodes[nk].next = head;
        self.table.set_head(index, Some(nk));
    }

    /// Take a node off its chain without releasing it.
    fn unchain(&mut self, prev: Option<NodeKey>, nk: NodeKey) {
        let (next, hash) = {
            let node = &self.nodes[nk];
            (node.next, node.hash)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => {
                let index = self.table.index_for(hash);
                self.table.set_head(index, next);
                if next.is_none() {
                    self.table.unlink(index);
                }
            }
        }
        self.nodes[nk].next = None;
    }

    fn release(&self, node: NodeOf<KD, VD>) {
        self.kd.free(&self.pool, node.key.into_inner());
        self.vd.free(&self.pool, node.value.into_inner());
        self.pool.free(Self::node_bytes());
    }

    fn remove_at(&mut self, prev: Option<NodeKey>, nk: NodeKey) {
        self.unchain(prev, nk);
        let node = self
            .nodes
            .remove(nk)
            .expect("unchained node must still be in the arena");
        self.release(node);
    }

    // ----- capacity management -----

    /// Relocate every node into a fresh table of `new_capacity` buckets.
    fn rehash(&mut self, new_capacity: usize) -> Result<(), MapError> {
        let old_capacity = self.capacity();
        let mut fresh = BucketTable::try_with_capacity(new_capacity)?;
        // Both tables are live while nodes move across.
        self.pool.alloc(BucketTable::bytes_for(new_capacity))?;

        let mut bucket = self.table.first_occupied();
        while let Some(b) = bucket {
            let mut cur = self.table.head(b);
            while let Some(nk) = cur {
                let node = &mut self.nodes[nk];
                cur = node.next;
                let index = fresh.index_for(node.hash);
                let head = fresh.head(index);
                if head.is_none() {
                    fresh.link(index);
                }
                node.next = head;
                fresh.set_head(index, Some(nk));
            }
            bucket = self.table.next_occupied(b);
        }
        self.table = fresh;
        self.pool.free(BucketTable::bytes_for(old_capacity));

        log::trace!(
            "rehash: {} -> {} buckets, {} entries",
            old_capacity,
            new_capacity,
            self.len()
        );
        Ok(())
    }

    fn grow(&mut self) -> Result<(), MapError> {
        let cap = self.capacity();
        let max = self.config.max_capacity();
        if cap >= max {
            return Err(MapError::Full { capacity: cap });
        }
        let new_capacity = cap.saturating_mul(2).saturating_add(1).min(max);
        self.rehash(new_capacity)
    }

    fn shrink_once(&mut self) -> Result<(), MapError> {
        let new_capacity = (self.capacity() >> 1).max(1);
        self.rehash(new_capacity)
    }

    /// Shrink after a keyed erase. Failure keeps the larger table.
    fn maybe_shrink(&mut self) {
        if self.shrink_due() {
            let cap = self.capacity();
            if let Err(err) = self.shrink_once() {
                log::warn!("hash map shrink from {} buckets failed: {}", cap, err);
            }
        }
    }

    pub(crate) fn shrink_to_fit(&mut self) -> Result<(), MapError> {
        while self.shrink_due() {
            self.shrink_once()?;
        }
        Ok(())
    }

    // ----- operations -----

    /// Insert or overwrite; returns the node holding `key`.
    pub(crate) fn put(&mut self, key: &KD::Item, value: &VD::Item) -> Result<NodeKey, MapError> {
        let hash = self.kd.hash(key);
        if let Some((_, nk)) = self.find(hash, key) {
            self.set_value(nk, value)?;
            return Ok(nk);
        }

        self.pool.alloc(Self::node_bytes())?;
        let key_copy = match self.kd.copy(&self.pool, key) {
            Ok(k) => k,
            Err(err) => {
                self.pool.free(Self::node_bytes());
                return Err(err);
            }
        };
        let value_copy = match self.vd.copy(&self.pool, value) {
            Ok(v) => v,
            Err(err) => {
                self.kd.free(&self.pool, key_copy);
                self.pool.free(Self::node_bytes());
                return Err(err);
            }
        };
        if self.len() >= self.load_limit() {
            if let Err(err) = self.grow() {
                self.kd.free(&self.pool, key_copy);
                self.vd.free(&self.pool, value_copy);
                self.pool.free(Self::node_bytes());
                return Err(err);
            }
        }

        let nk = self.nodes.insert(Node {
            next: None,
            hash,
            key: Slot::new(key_copy, KD::INDIRECT),
            value: Slot::new(value_copy, VD::INDIRECT),
        });
        let index = self.table.index_for(hash);
        self.push_node(index, nk);
        Ok(nk)
    }

    /// Replace the value stored at a live node.
    pub(crate) fn set_value(&mut self, nk: NodeKey, value: &VD::Item) -> Result<(), MapError> {
        let fresh = self.vd.copy(&self.pool, value)?;
        let old = self.nodes[nk].value.replace(fresh);
        self.vd.free(&self.pool, old);
        Ok(())
    }

    /// Remove `key`, then shrink if the load dropped to a quarter.
    ///
    /// Panics if `key` is not present.
    pub(crate) fn erase(&mut self, key: &KD::Item) {
        let hash = self.kd.hash(key);
        let Some((prev, nk)) = self.find(hash, key) else {
            panic!("erase: key is not present in the map");
        };
        self.remove_at(prev, nk);
        self.maybe_shrink();
    }

    /// Remove a node reached through a cursor. Does not shrink.
    pub(crate) fn erase_node(&mut self, nk: NodeKey) {
        let prev = self.prev_of(nk);
        self.remove_at(prev, nk);
    }

    /// Rekey the entry at `old` to `new`, evicting any other entry at `new`.
    ///
    /// Panics if `old` is not present.
    pub(crate) fn change_key(
        &mut self,
        old: &KD::Item,
        new: &KD::Item,
    ) -> Result<NodeKey, MapError> {
        let old_hash = self.kd.hash(old);
        let Some((_, nk)) = self.find(old_hash, old) else {
            panic!("change_key: key is not present in the map");
        };
        let new_hash = self.kd.hash(new);
        let key_copy = self.kd.copy(&self.pool, new)?;

        if let Some((cprev, ck)) = self.find(new_hash, new) {
            if ck != nk {
                self.remove_at(cprev, ck);
            }
        }

        // Eviction may have changed the predecessor.
        let prev = self.prev_of(nk);
        self.unchain(prev, nk);
        let old_key = {
            let node = &mut self.nodes[nk];
            node.hash = new_hash;
            node.key.replace(key_copy)
        };
        self.kd.free(&self.pool, old_key);
        let index = self.table.index_for(new_hash);
        self.push_node(index, nk);
        Ok(nk)
    }

    fn free_all_nodes(&mut self) {
        for (_, node) in self.nodes.drain() {
            self.kd.free(&self.pool, node.key.into_inner());
            self.vd.free(&self.pool, node.value.into_inner());
            self.pool.free(Self::node_bytes());
        }
    }

    /// Free every entry and fall back to a single bucket.
    pub(crate) fn clear(&mut self) {
        self.free_all_nodes();
        let cap = self.capacity();
        self.table = BucketTable::single();
        self.pool
            .shrink(BucketTable::bytes_for(cap), BucketTable::bytes_for(1));
    }

    /// Deep copy through the descriptors into a new table on the same pool.
    pub(crate) fn try_clone(&self) -> Result<Self, MapError>
    where
        KD: Clone,
        VD: Clone,
    {
        let mut out = Self::new(
            Rc::clone(&self.pool),
            self.kd.clone(),
            self.vd.clone(),
            self.config,
        )?;
        let mut cur = self.first_node();
        while let Some(nk) = cur {
            out.put(self.key(nk), self.value(nk))?;
            cur = self.next_node(nk);
        }
        Ok(out)
    }

    /// Check structural invariants; used by tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        assert!(self.capacity() >= 1);
        assert!(self.len() <= self.load_limit());
        let mut seen = HashSet::new();
        let mut occupied = HashSet::new();
        for b in self.table.occupied_indices() {
            assert!(occupied.insert(b), "bucket listed twice");
            let mut cur = self.table.head(b);
            assert!(cur.is_some(), "empty bucket on occupied list");
            while let Some(nk) = cur {
                assert_eq!(self.table.index_for(self.nodes[nk].hash), b);
                assert!(seen.insert(nk), "node reachable twice");
                cur = self.nodes[nk].next;
            }
        }
        for i in 0..self.capacity() {
            assert_eq!(self.table.head(i).is_some(), occupied.contains(&i));
        }
        assert_eq!(seen.len(), self.len());
    }
}

impl<KD: Descriptor, VD: Descriptor> Drop for RawTable<KD, VD> {
    fn drop(&mut self) {
        self.free_all_nodes();
        self.pool.free(BucketTable::bytes_for(self.capacity()));
    }
}
