//! Pool: single-threaded byte-budget allocator shared by the containers of a
//! scope.
//!
//! The pool does not hand out memory itself. Containers charge it for every
//! block they keep alive (bucket tables, nodes) and return the charge when
//! the block goes away. A pool created with a limit refuses charges that
//! would exceed it, which is how allocation failure surfaces as
//! `MapError::OutOfMemory` without relying on the global allocator failing.

use crate::error::MapError;
use core::cell::Cell;
use core::marker::PhantomData;
use std::rc::Rc;

#[derive(Debug)]
pub struct Pool {
    limit: Option<usize>,
    in_use: Cell<usize>,
    peak: Cell<usize>,
    live_blocks: Cell<usize>,
    // Keep !Send + !Sync in line with single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl Pool {
    fn with_optional_limit(limit: Option<usize>) -> Rc<Self> {
        Rc::new(Self {
            limit,
            in_use: Cell::new(0),
            peak: Cell::new(0),
            live_blocks: Cell::new(0),
            _nosend: PhantomData,
        })
    }

    /// A pool that never refuses a charge.
    pub fn unbounded() -> Rc<Self> {
        Self::with_optional_limit(None)
    }

    /// A pool that refuses charges once `bytes` are in use.
    pub fn with_limit(bytes: usize) -> Rc<Self> {
        Self::with_optional_limit(Some(bytes))
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently charged.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// High-water mark of `in_use`.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    /// Number of blocks charged through `alloc` and not yet freed.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.get()
    }

    fn admit(&self, extra: usize) -> Result<usize, MapError> {
        let now = self
            .in_use
            .get()
            .checked_add(extra)
            .ok_or(MapError::OutOfMemory { requested: extra })?;
        match self.limit {
            Some(limit) if now > limit => Err(MapError::OutOfMemory { requested: extra }),
            _ => Ok(now),
        }
    }

    fn set_in_use(&self, now: usize) {
        self.in_use.set(now);
        if now > self.peak.get() {
            self.peak.set(now);
        }
    }

    /// Charge a new block of `bytes`.
    pub fn alloc(&self, bytes: usize) -> Result<(), MapError> {
        let now = self.admit(bytes)?;
        self.set_in_use(now);
        self.live_blocks.set(self.live_blocks.get() + 1);
        Ok(())
    }

    /// Resize an existing block. Shrinking always succeeds.
    pub fn realloc(&self, old: usize, new: usize) -> Result<(), MapError> {
        if new <= old {
            self.shrink(old, new);
            return Ok(());
        }
        let now = self.admit(new - old)?;
        self.set_in_use(now);
        Ok(())
    }

    /// Shrink an existing block from `old` to `new` bytes.
    pub fn shrink(&self, old: usize, new: usize) {
        debug_assert!(new <= old);
        self.release(old.saturating_sub(new));
    }

    /// Return a block of `bytes` previously charged with `alloc`.
    pub fn free(&self, bytes: usize) {
        self.release(bytes);
        let blocks = self.live_blocks.get();
        debug_assert!(blocks > 0, "pool block underflow");
        self.live_blocks.set(blocks.saturating_sub(1));
    }

    fn release(&self, bytes: usize) {
        let cur = self.in_use.get();
        debug_assert!(cur >= bytes, "pool byte underflow");
        self.in_use.set(cur.saturating_sub(bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::Pool;
    use crate::error::MapError;

    #[test]
    fn unbounded_tracks_usage_and_peak() {
        let p = Pool::unbounded();
        p.alloc(100).unwrap();
        p.alloc(50).unwrap();
        assert_eq!(p.in_use(), 150);
        assert_eq!(p.live_blocks(), 2);
        p.free(100);
        assert_eq!(p.in_use(), 50);
        assert_eq!(p.peak(), 150);
        assert_eq!(p.live_blocks(), 1);
        assert_eq!(p.limit(), None);
    }

    #[test]
    fn limit_refuses_without_side_effects() {
        let p = Pool::with_limit(64);
        p.alloc(60).unwrap();
        assert_eq!(p.alloc(8), Err(MapError::OutOfMemory { requested: 8 }));
        assert_eq!(p.in_use(), 60);
        assert_eq!(p.live_blocks(), 1);
    }

    #[test]
    fn realloc_grows_within_limit_and_shrinks_freely() {
        let p = Pool::with_limit(100);
        p.alloc(40).unwrap();
        p.realloc(40, 100).unwrap();
        assert_eq!(p.in_use(), 100);
        assert!(p.realloc(100, 101).is_err());
        assert_eq!(p.in_use(), 100);
        p.realloc(100, 10).unwrap();
        assert_eq!(p.in_use(), 10);
        assert_eq!(p.live_blocks(), 1);
    }
}
