//! Capability traits generic code programs against.
//!
//! - `One`: lifecycle of anything a `Scope` can own.
//! - `Container`: size, traversal and clearing, element-type agnostic.
//! - `Map`: keyed operations layered on `Container`.
//! - `Elements<T>`: dyn-compatible "any container of `T`" view for code that
//!   only iterates.
//!
//! The three groups are independent; `HashMap` implements all of them.

use crate::descriptor::Descriptor;
use crate::error::MapError;
use core::any::Any;

/// Lifecycle of a scope-owned resource.
pub trait One: Any {
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Release the resource and everything it owns.
    fn free(self: Box<Self>) {
        drop(self);
    }
}

/// Forward-only position inside a container.
///
/// Two cursors are equal iff they belong to the same container and sit at
/// the same position; every end cursor of a container equals every other.
pub trait ForwardCursor<'a>: PartialEq {
    type Item: 'a;

    /// Element at the cursor, `None` at end.
    fn get(&self) -> Option<&'a Self::Item>;

    /// Step forward. A no-op at end.
    fn move_next(&mut self);

    fn is_end(&self) -> bool {
        self.get().is_none()
    }
}

pub trait Container {
    type Elem;
    type ElemDescriptor: Descriptor<Item = Self::Elem>;
    type Cursor<'a>: ForwardCursor<'a, Item = Self::Elem>
    where
        Self: 'a;

    fn size(&self) -> usize;

    /// Implementation ceiling on `size()`.
    fn max_size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn begin(&self) -> Self::Cursor<'_>;

    fn end(&self) -> Self::Cursor<'_>;

    fn clear(&mut self);

    /// Descriptor of the element type, for copying or freeing extracted values.
    fn elem_descriptor(&self) -> &Self::ElemDescriptor;
}

pub trait Map: Container {
    type Key;
    type KeyDescriptor: Descriptor<Item = Self::Key>;

    /// Insert or overwrite, returning the stored value.
    fn put(&mut self, key: &Self::Key, value: &Self::Elem) -> Result<&mut Self::Elem, MapError>;

    fn get(&self, key: &Self::Key) -> Option<&Self::Elem>;

    /// Cursor at `key`, or the end cursor.
    fn at(&self, key: &Self::Key) -> Self::Cursor<'_>;

    /// Remove `key`. Panics if absent.
    fn erase(&mut self, key: &Self::Key);

    fn exist(&self, key: &Self::Key) -> bool;

    /// Rekey an entry. Panics if `old` is absent.
    fn change_key(&mut self, old: &Self::Key, new: &Self::Key) -> Result<&Self::Key, MapError>;

    /// Key at a cursor produced by this map; `None` at end.
    fn iterator_key<'a>(&'a self, cursor: &Self::Cursor<'a>) -> Option<&'a Self::Key>;

    fn key_descriptor(&self) -> &Self::KeyDescriptor;
}

/// Type-erased read-only view over the elements of a container.
pub trait Elements<T> {
    fn count(&self) -> usize;

    fn elements(&self) -> Box<dyn Iterator<Item = &T> + '_>;
}
