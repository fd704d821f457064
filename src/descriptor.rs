//! Type descriptors: the per-type contract the map uses to hash, compare,
//! copy and free its keys and values, plus the inline-or-linked storage
//! choice for a slot.
//!
//! The storage mode is an associated const, so the map picks between
//! `Slot::Inline` and `Slot::Linked` per descriptor type at compile time.

use crate::error::MapError;
use crate::pool::Pool;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;

/// Items larger than this are stored behind a `Box` by default.
pub const INLINE_LIMIT: usize = 4 * mem::size_of::<usize>();

/// Contract for one key or value type.
pub trait Descriptor {
    type Item;

    /// Store items behind a pointer instead of inline in the node.
    const INDIRECT: bool = mem::size_of::<Self::Item>() > INLINE_LIMIT;

    fn name(&self) -> &'static str {
        core::any::type_name::<Self::Item>()
    }

    /// Bytes one slot occupies inside a node.
    fn size(&self) -> usize {
        if Self::INDIRECT {
            mem::size_of::<Box<Self::Item>>()
        } else {
            mem::size_of::<Self::Item>()
        }
    }

    fn hash(&self, item: &Self::Item) -> u64;

    fn equal(&self, a: &Self::Item, b: &Self::Item) -> bool;

    /// Produce an owned copy of `src` for storage in a container backed by
    /// `pool`.
    fn copy(&self, pool: &Pool, src: &Self::Item) -> Result<Self::Item, MapError>;

    /// Release an item the container no longer stores. `pool` is the pool
    /// `copy` was given, so charges taken there can be returned here.
    fn free(&self, _pool: &Pool, item: Self::Item) {
        drop(item);
    }
}

/// Extra heap bytes a slot of `D` owns outside the node.
pub(crate) fn linked_bytes<D: Descriptor>() -> usize {
    if D::INDIRECT {
        mem::size_of::<D::Item>()
    } else {
        0
    }
}

/// Descriptor for any `T: Hash + Eq + Clone`, hashing through `S`.
pub struct Standard<T, S = DefaultHashBuilder> {
    hasher: S,
    _pd: PhantomData<fn() -> T>,
}

impl<T> Standard<T> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<T, S> Standard<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            _pd: PhantomData,
        }
    }
}

impl<T> Default for Standard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Clone> Clone for Standard<T, S> {
    fn clone(&self) -> Self {
        Self::with_hasher(self.hasher.clone())
    }
}

impl<T, S> fmt::Debug for Standard<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Standard")
            .field(&core::any::type_name::<T>())
            .finish()
    }
}

impl<T, S> Descriptor for Standard<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    type Item = T;

    fn hash(&self, item: &T) -> u64 {
        self.hasher.hash_one(item)
    }

    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn copy(&self, _pool: &Pool, src: &T) -> Result<T, MapError> {
        Ok(src.clone())
    }
}

/// Descriptor for values that are only ever copied: any `T: Clone`.
///
/// The map never hashes or compares values, so `hash` is constant and
/// `equal` is identity. Do not use it on the key side.
pub struct Cloned<T> {
    _pd: PhantomData<fn() -> T>,
}

impl<T> Cloned<T> {
    pub fn new() -> Self {
        Self { _pd: PhantomData }
    }
}

impl<T> Default for Cloned<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Cloned<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Cloned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cloned")
            .field(&core::any::type_name::<T>())
            .finish()
    }
}

impl<T: Clone> Descriptor for Cloned<T> {
    type Item = T;

    fn hash(&self, _item: &T) -> u64 {
        0
    }

    fn equal(&self, a: &T, b: &T) -> bool {
        core::ptr::eq(a, b)
    }

    fn copy(&self, _pool: &Pool, src: &T) -> Result<T, MapError> {
        Ok(src.clone())
    }
}

/// Wraps a descriptor and forces linked (boxed) storage regardless of size.
#[derive(Clone, Debug, Default)]
pub struct Linked<D>(pub D);

impl<D: Descriptor> Descriptor for Linked<D> {
    type Item = D::Item;

    const INDIRECT: bool = true;

    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn hash(&self, item: &D::Item) -> u64 {
        self.0.hash(item)
    }

    fn equal(&self, a: &D::Item, b: &D::Item) -> bool {
        self.0.equal(a, b)
    }

    fn copy(&self, pool: &Pool, src: &D::Item) -> Result<D::Item, MapError> {
        self.0.copy(pool, src)
    }

    fn free(&self, pool: &Pool, item: D::Item) {
        self.0.free(pool, item)
    }
}

/// Storage for one key or value inside a node.
#[derive(Debug)]
pub enum Slot<T> {
    Inline(T),
    Linked(Box<T>),
}

impl<T> Slot<T> {
    pub fn new(item: T, indirect: bool) -> Self {
        if indirect {
            Slot::Linked(Box::new(item))
        } else {
            Slot::Inline(item)
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        match self {
            Slot::Inline(v) => v,
            Slot::Linked(b) => b,
        }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        match self {
            Slot::Inline(v) => v,
            Slot::Linked(b) => b,
        }
    }

    /// Swap in a new item, keeping the storage mode (and the box, if linked).
    pub fn replace(&mut self, item: T) -> T {
        mem::replace(self.get_mut(), item)
    }

    pub fn into_inner(self) -> T {
        match self {
            Slot::Inline(v) => v,
            Slot::Linked(b) => *b,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, Slot::Linked(_))
    }
}
