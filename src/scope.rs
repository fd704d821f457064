//! Scope: owns a set of resources and frees them, newest first, when it is
//! dropped.
//!
//! Scopes nest: `enter` attaches a child scope sharing the parent's pool, so
//! dropping the parent cascades through every child and everything they own.

use crate::pool::Pool;
use crate::traits::One;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use slotmap::{new_key_type, SlotMap};
use std::rc::Rc;

new_key_type! {
    /// Registry key of a resource inside one scope.
    pub struct ResourceKey;
}

/// Typed handle to a resource attached to a scope.
pub struct Attached<T> {
    key: ResourceKey,
    _pd: PhantomData<fn() -> T>,
}

impl<T> Attached<T> {
    fn new(key: ResourceKey) -> Self {
        Self {
            key,
            _pd: PhantomData,
        }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }
}

impl<T> Clone for Attached<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Attached<T> {}

impl<T> PartialEq for Attached<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Attached<T> {}

impl<T> fmt::Debug for Attached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attached").field(&self.key).finish()
    }
}

pub struct Scope {
    pool: Rc<Pool>,
    resources: SlotMap<ResourceKey, Box<dyn One>>,
    // Attach order; teardown walks it backwards.
    order: Vec<ResourceKey>,
}

impl Scope {
    pub fn new(pool: Rc<Pool>) -> Self {
        Self {
            pool,
            resources: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn pool(&self) -> &Rc<Pool> {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Take ownership of `resource`; it is freed when the scope drops.
    pub fn attach<T: One>(&mut self, resource: T) -> Attached<T> {
        let key = self.resources.insert(Box::new(resource));
        self.order.push(key);
        Attached::new(key)
    }

    pub fn contains<T: One>(&self, handle: Attached<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get<T: One>(&self, handle: Attached<T>) -> Option<&T> {
        self.resources
            .get(handle.key)?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: One>(&mut self, handle: Attached<T>) -> Option<&mut T> {
        self.resources
            .get_mut(handle.key)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    fn remove<T: One>(&mut self, handle: Attached<T>) -> Option<Box<dyn One>> {
        if !self.contains(handle) {
            return None;
        }
        self.order.retain(|k| *k != handle.key);
        self.resources.remove(handle.key)
    }

    /// Hand a resource back to the caller without freeing it.
    pub fn detach<T: One>(&mut self, handle: Attached<T>) -> Option<T> {
        let boxed: Box<dyn Any> = self.remove(handle)?.into_any();
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    /// Detach and free a resource. Returns false if the handle is stale.
    pub fn free<T: One>(&mut self, handle: Attached<T>) -> bool {
        match self.remove(handle) {
            Some(resource) => {
                log::debug!("scope: freeing {}", resource.name());
                resource.free();
                true
            }
            None => false,
        }
    }

    /// Attach a child scope sharing this scope's pool.
    pub fn enter(&mut self) -> Attached<Scope> {
        let child = Scope::new(Rc::clone(&self.pool));
        self.attach(child)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(Pool::unbounded())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("resources", &self.resources.len())
            .field("pool_in_use", &self.pool.in_use())
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.order.is_empty() {
            log::debug!("scope: tearing down {} resources", self.order.len());
        }
        while let Some(key) = self.order.pop() {
            if let Some(resource) = self.resources.remove(key) {
                resource.free();
            }
        }
    }
}

impl One for Scope {
    fn name(&self) -> &'static str {
        "scope"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
