//! chained-hashmap: a single-threaded, separately chained hash map whose
//! keys and values are handled through type descriptors, with explicit
//! byte-budget pools and scopes that own and tear down resources.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a generic map that never assumes anything about its key or value
//!   types beyond what a `Descriptor` provides (hash, equality, copy, free),
//!   so the same engine serves plain values, boxed payloads and types with
//!   custom ownership.
//! - Layers:
//!   - `BucketTable`: bucket heads plus an intrusive doubly linked list of
//!     occupied buckets, so traversal skips empty buckets in O(1).
//!   - `RawTable<KD, VD>`: the chained table over a slot-map node arena.
//!     Owns growth, shrinking, rehashing and all pool accounting.
//!   - `HashMap<K, V, KD, VD>`: public face. Adds the debug reentrancy guard,
//!     cursors, and the capability traits (`Container`, `Map`, `One`,
//!     `Elements`).
//!   - `Pool` and `Scope`: memory budget and resource lifetime. A map charges
//!     its pool for its bucket table and every node; a scope frees what it
//!     owns in reverse attach order when dropped.
//!
//! Constraints
//! - Single-threaded: `Pool`, `Scope` and the guard are `!Send`/`!Sync`.
//! - Every fallible step of an operation (pool charge, descriptor copy,
//!   table reservation) runs before the map is touched; on `Err` the map
//!   and the pool are exactly as they were.
//! - Keys are unique under `KD::equal`. `put` on an existing key overwrites
//!   the value in place and frees the old one exactly once.
//! - Load factor: `len <= capacity * growth_threshold` after every
//!   operation. Growth goes to `capacity * 2 + 1` buckets, clamped to
//!   `max_capacity`.
//! - Contract violations (erasing an absent key, rekeying an absent key,
//!   erasing at an end cursor, resolving a foreign cursor) panic.
//!
//! Hasher and rehashing invariants
//! - Each node stores the hash computed when its key was written; rehashing
//!   reuses it and never calls `KD::hash`.
//!
//! Reentrancy policy
//! - Keyed operations hold a debug-only guard while descriptor callbacks
//!   may run against a transiently inconsistent table. Calling back into the
//!   same map from `hash`/`equal`/`copy` panics in debug builds.
//!
//! Cursor semantics
//! - `Cursor` borrows the map immutably, so no structural change can happen
//!   while it is alive. `CursorMut` can overwrite or erase the entry it sits
//!   on; erasing leaves it at end and never shrinks the table
//!   (`shrink_to_fit` reclaims buckets afterwards).
//!
//! Notes and non-goals
//! - No thread safety, no persistence, no ordered traversal.
//! - The pool is a budget, not an allocator: memory itself comes from the
//!   global allocator, the pool only accounts for it.

pub mod algo;
mod bucket;
mod config;
mod cursor;
mod descriptor;
mod error;
mod hash_map;
mod hash_map_proptest;
mod pool;
mod raw_table;
mod reentrancy;
mod scope;
mod traits;

// Public surface
pub use config::{MapConfig, MAX_SIZE};
pub use cursor::{Cursor, CursorMut, Iter};
pub use descriptor::{Cloned, Descriptor, Linked, Slot, Standard, INLINE_LIMIT};
pub use error::MapError;
pub use hash_map::HashMap;
pub use pool::Pool;
pub use scope::{Attached, ResourceKey, Scope};
pub use traits::{Container, Elements, ForwardCursor, Map, One};
