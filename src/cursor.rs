//! Cursors over a `HashMap`.
//!
//! A cursor is an owner plus an optional node: `None` is the end position,
//! shared by every end cursor of the same map. Advancing walks the node's
//! chain, then hops to the head of the next occupied bucket.
//!
//! Order is unspecified and any structural change to the map may reorder it.
//! `Cursor` borrows the map immutably, so it cannot outlive such a change.
//! `CursorMut` borrows it mutably and can overwrite or erase the entry it
//! points at; erasing leaves it at end.

use crate::bucket::NodeKey;
use crate::descriptor::Descriptor;
use crate::error::MapError;
use crate::raw_table::RawTable;
use crate::reentrancy::DebugReentrancy;
use crate::traits::ForwardCursor;
use core::fmt;
use core::iter::FusedIterator;

/// Read-only cursor.
pub struct Cursor<'a, KD: Descriptor, VD: Descriptor> {
    raw: &'a RawTable<KD, VD>,
    node: Option<NodeKey>,
}

impl<'a, KD: Descriptor, VD: Descriptor> Cursor<'a, KD, VD> {
    pub(crate) fn new(raw: &'a RawTable<KD, VD>, node: Option<NodeKey>) -> Self {
        Self { raw, node }
    }

    pub(crate) fn raw(&self) -> &'a RawTable<KD, VD> {
        self.raw
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn key(&self) -> Option<&'a KD::Item> {
        let raw = self.raw;
        self.node.map(|nk| raw.key(nk))
    }

    pub fn value(&self) -> Option<&'a VD::Item> {
        let raw = self.raw;
        self.node.map(|nk| raw.value(nk))
    }

    pub fn pair(&self) -> Option<(&'a KD::Item, &'a VD::Item)> {
        let raw = self.raw;
        self.node.map(|nk| (raw.key(nk), raw.value(nk)))
    }

    #[inline]
    pub fn move_next(&mut self) {
        if let Some(nk) = self.node {
            self.node = self.raw.next_node(nk);
        }
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> Clone for Cursor<'a, KD, VD> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> Copy for Cursor<'a, KD, VD> {}

impl<'a, KD: Descriptor, VD: Descriptor> PartialEq for Cursor<'a, KD, VD> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.raw, other.raw) && self.node == other.node
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> Eq for Cursor<'a, KD, VD> {}

impl<'a, KD: Descriptor, VD: Descriptor> fmt::Debug for Cursor<'a, KD, VD> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("owner", &(self.raw as *const RawTable<KD, VD>))
            .field("node", &self.node)
            .finish()
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> ForwardCursor<'a> for Cursor<'a, KD, VD> {
    type Item = VD::Item;

    fn get(&self) -> Option<&'a VD::Item> {
        self.value()
    }

    fn move_next(&mut self) {
        Cursor::move_next(self)
    }

    fn is_end(&self) -> bool {
        Cursor::is_end(self)
    }
}

/// Iterator over `(&key, &value)` pairs.
pub struct Iter<'a, KD: Descriptor, VD: Descriptor> {
    cursor: Cursor<'a, KD, VD>,
    remaining: usize,
}

impl<'a, KD: Descriptor, VD: Descriptor> Iter<'a, KD, VD> {
    pub(crate) fn new(cursor: Cursor<'a, KD, VD>, remaining: usize) -> Self {
        Self { cursor, remaining }
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> Iterator for Iter<'a, KD, VD> {
    type Item = (&'a KD::Item, &'a VD::Item);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.cursor.pair()?;
        self.cursor.move_next();
        self.remaining -= 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, KD: Descriptor, VD: Descriptor> ExactSizeIterator for Iter<'a, KD, VD> {}

impl<'a, KD: Descriptor, VD: Descriptor> FusedIterator for Iter<'a, KD, VD> {}

/// Cursor with write access to the entry it points at.
pub struct CursorMut<'a, KD: Descriptor, VD: Descriptor> {
    raw: &'a mut RawTable<KD, VD>,
    reentrancy: &'a DebugReentrancy,
    node: Option<NodeKey>,
}

impl<'a, KD: Descriptor, VD: Descriptor> CursorMut<'a, KD, VD> {
    pub(crate) fn new(
        raw: &'a mut RawTable<KD, VD>,
        reentrancy: &'a DebugReentrancy,
        node: Option<NodeKey>,
    ) -> Self {
        Self {
            raw,
            reentrancy,
            node,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn key(&self) -> Option<&KD::Item> {
        self.node.map(|nk| self.raw.key(nk))
    }

    pub fn value(&self) -> Option<&VD::Item> {
        self.node.map(|nk| self.raw.value(nk))
    }

    pub fn value_mut(&mut self) -> Option<&mut VD::Item> {
        match self.node {
            Some(nk) => Some(self.raw.value_mut(nk)),
            None => None,
        }
    }

    pub fn move_next(&mut self) {
        if let Some(nk) = self.node {
            self.node = self.raw.next_node(nk);
        }
    }

    /// Overwrite the value at the cursor through the value descriptor.
    ///
    /// Panics at end.
    pub fn set(&mut self, value: &VD::Item) -> Result<(), MapError> {
        let Some(nk) = self.node else {
            panic!("set: cursor is at end");
        };
        let _g = self.reentrancy.enter("cursor set");
        self.raw.set_value(nk, value)
    }

    /// Erase the entry at the cursor and move to end.
    ///
    /// Unlike `HashMap::erase`, this never shrinks the table; call
    /// `HashMap::shrink_to_fit` afterwards to reclaim buckets.
    ///
    /// Panics at end.
    pub fn erase(&mut self) {
        let Some(nk) = self.node.take() else {
            panic!("erase: cursor is at end");
        };
        let _g = self.reentrancy.enter("cursor erase");
        debug_assert!(self.raw.contains_node(nk));
        self.raw.erase_node(nk);
    }
}
