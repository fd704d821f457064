//! Debug-only reentrancy guard.
//!
//! Descriptor callbacks (`hash`, `equal`, `copy`, `free`) are user code and
//! run while the table may be mid-mutation. A descriptor that calls back
//! into the map it serves would observe a half-linked chain, so every public
//! entry point that can invoke a descriptor enters this guard first. In debug
//! builds a nested entry panics and names both operations; in release builds
//! the guard compiles away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker of the operation currently running.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Keep !Send + !Sync in line with single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    #[allow(unused_variables)]
    pub fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!(
                    "reentrancy detected: `{}` called while `{}` is running",
                    op, outer
                );
            }
            self.active.set(Some(op));
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }

    /// Name of the running operation, if any. Always `None` in release builds.
    #[cfg(test)]
    pub fn active(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            return self.active.get();
        }

        #[cfg(not(debug_assertions))]
        {
            return None;
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebugReentrancy;

    #[test]
    fn sequential_entries_are_ok() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter("put");
        }
        let _g = r.enter("erase");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn tracks_active_operation() {
        let r = DebugReentrancy::new();
        assert_eq!(r.active(), None);
        let g = r.enter("get");
        assert_eq!(r.active(), Some("get"));
        drop(g);
        assert_eq!(r.active(), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_with_both_names() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter("put");
            let _inner = r.enter("get");
        }));
        let err = res.expect_err("expected reentrancy to panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("`get` called while `put` is running"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let r = DebugReentrancy::new();
        let _g1 = r.enter("put");
        let _g2 = r.enter("get");
        assert_eq!(r.active(), None);
    }
}
