//! HashMap: public face of the chained table. Wraps `RawTable` with the
//! debug reentrancy guard and implements the capability traits.

use crate::config::{MapConfig, MAX_SIZE};
use crate::cursor::{Cursor, CursorMut, Iter};
use crate::descriptor::{Descriptor, Standard};
use crate::error::MapError;
use crate::pool::Pool;
use crate::raw_table::RawTable;
use crate::reentrancy::DebugReentrancy;
use crate::scope::{Attached, Scope};
use crate::traits::{Container, Elements, Map, One};
use core::any::Any;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;
use std::rc::Rc;

/// Separately chained hash map storing keys and values through descriptors.
///
/// `put` copies its arguments through the descriptors and overwrites in
/// place on an existing key. The table grows to `capacity * 2 + 1` buckets
/// when a new key would exceed `capacity * growth_threshold` entries, and a
/// keyed `erase` halves it once the load falls to a quarter of that.
pub struct HashMap<K, V, KD = Standard<K>, VD = Standard<V>>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    raw: RawTable<KD, VD>,
    reentrancy: DebugReentrancy,
    _pd: PhantomData<(K, V)>,
}

impl<K, V> HashMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    /// A map on its own unbounded pool, using `Standard` descriptors.
    ///
    /// `Standard` needs `Hash + Eq` on the value type too. For values that
    /// are only `Clone`, such as floats, build with
    /// `construct(pool, Standard::new(), Cloned::new())`.
    pub fn new() -> Self {
        Self::construct(Pool::unbounded(), Standard::new(), Standard::new())
            .expect("an unbounded pool with the default config accepts the initial table")
    }
}

impl<K, V> Default for HashMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, KD, VD> HashMap<K, V, KD, VD>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    /// Build an unattached map charging `pool`.
    pub fn construct(pool: Rc<Pool>, kd: KD, vd: VD) -> Result<Self, MapError> {
        Self::with_config(pool, kd, vd, MapConfig::default())
    }

    pub fn with_config(
        pool: Rc<Pool>,
        kd: KD,
        vd: VD,
        config: MapConfig,
    ) -> Result<Self, MapError> {
        Ok(Self {
            raw: RawTable::new(pool, kd, vd, config)?,
            reentrancy: DebugReentrancy::new(),
            _pd: PhantomData,
        })
    }

    /// Build a map on the scope's pool and attach it to the scope.
    pub fn create(scope: &mut Scope, kd: KD, vd: VD) -> Result<Attached<Self>, MapError>
    where
        Self: One,
    {
        Self::create_with_config(scope, kd, vd, MapConfig::default())
    }

    pub fn create_with_config(
        scope: &mut Scope,
        kd: KD,
        vd: VD,
        config: MapConfig,
    ) -> Result<Attached<Self>, MapError>
    where
        Self: One,
    {
        let map = Self::with_config(Rc::clone(scope.pool()), kd, vd, config)?;
        Ok(scope.attach(map))
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn max_size(&self) -> usize {
        MAX_SIZE
    }

    pub fn config(&self) -> &MapConfig {
        self.raw.config()
    }

    pub fn pool(&self) -> &Rc<Pool> {
        self.raw.pool()
    }

    pub fn key_descriptor(&self) -> &KD {
        self.raw.key_descriptor()
    }

    pub fn value_descriptor(&self) -> &VD {
        self.raw.value_descriptor()
    }

    /// Insert a copy of `key -> value`, or overwrite the value of an
    /// existing key. On error the map is unchanged.
    pub fn put(&mut self, key: &K, value: &V) -> Result<&mut V, MapError> {
        let _g = self.reentrancy.enter("put");
        let nk = self.raw.put(key, value)?;
        Ok(self.raw.value_mut(nk))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let _g = self.reentrancy.enter("get");
        self.raw.lookup(key).map(|nk| self.raw.value(nk))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let _g = self.reentrancy.enter("get_mut");
        match self.raw.lookup(key) {
            Some(nk) => Some(self.raw.value_mut(nk)),
            None => None,
        }
    }

    pub fn exist(&self, key: &K) -> bool {
        let _g = self.reentrancy.enter("exist");
        self.raw.lookup(key).is_some()
    }

    /// Remove `key` and free its storage through the descriptors.
    ///
    /// Panics if `key` is not present; check with `exist` first.
    pub fn erase(&mut self, key: &K) {
        let _g = self.reentrancy.enter("erase");
        self.raw.erase(key);
    }

    /// Rekey the entry at `old` to a copy of `new`. An entry already at
    /// `new` is evicted first.
    ///
    /// Panics if `old` is not present.
    pub fn change_key(&mut self, old: &K, new: &K) -> Result<&K, MapError> {
        let _g = self.reentrancy.enter("change_key");
        let nk = self.raw.change_key(old, new)?;
        Ok(self.raw.key(nk))
    }

    /// Free every entry and drop back to a single bucket.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.raw.clear();
    }

    /// Apply the shrink policy until it no longer holds.
    pub fn shrink_to_fit(&mut self) -> Result<(), MapError> {
        self.raw.shrink_to_fit()
    }

    pub fn begin(&self) -> Cursor<'_, KD, VD> {
        Cursor::new(&self.raw, self.raw.first_node())
    }

    pub fn end(&self) -> Cursor<'_, KD, VD> {
        Cursor::new(&self.raw, None)
    }

    /// Cursor at `key`, or at end if absent.
    pub fn at(&self, key: &K) -> Cursor<'_, KD, VD> {
        let _g = self.reentrancy.enter("at");
        Cursor::new(&self.raw, self.raw.lookup(key))
    }

    /// Mutable cursor at the first entry.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, KD, VD> {
        let node = self.raw.first_node();
        CursorMut::new(&mut self.raw, &self.reentrancy, node)
    }

    /// Mutable cursor at `key`, or at end if absent.
    pub fn at_mut(&mut self, key: &K) -> CursorMut<'_, KD, VD> {
        let node = {
            let _g = self.reentrancy.enter("at_mut");
            self.raw.lookup(key)
        };
        CursorMut::new(&mut self.raw, &self.reentrancy, node)
    }

    /// Key at a cursor produced by this map.
    ///
    /// Panics if the cursor belongs to another map.
    pub fn iterator_key<'a>(&'a self, cursor: &Cursor<'a, KD, VD>) -> Option<&'a K> {
        assert!(
            core::ptr::eq(cursor.raw(), &self.raw),
            "iterator_key: cursor belongs to another map"
        );
        cursor.key()
    }

    pub fn iter(&self) -> Iter<'_, KD, VD> {
        Iter::new(self.begin(), self.len())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Deep copy through the descriptors into a new unattached map on the
    /// same pool. A failed copy frees whatever it had built.
    pub fn try_clone(&self) -> Result<Self, MapError>
    where
        KD: Clone,
        VD: Clone,
    {
        let _g = self.reentrancy.enter("try_clone");
        Ok(Self {
            raw: self.raw.try_clone()?,
            reentrancy: DebugReentrancy::new(),
            _pd: PhantomData,
        })
    }

    /// View as an element-only container.
    pub fn as_elements(&self) -> &dyn Elements<V> {
        self
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.raw.check_invariants();
    }
}

impl<'a, K, V, KD, VD> IntoIterator for &'a HashMap<K, V, KD, VD>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, KD, VD>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, KD, VD> fmt::Debug for HashMap<K, V, KD, VD>
where
    K: fmt::Debug,
    V: fmt::Debug,
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, KD, VD> One for HashMap<K, V, KD, VD>
where
    K: 'static,
    V: 'static,
    KD: Descriptor<Item = K> + 'static,
    VD: Descriptor<Item = V> + 'static,
{
    fn name(&self) -> &'static str {
        "hash_map"
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

impl<K, V, KD, VD> Container for HashMap<K, V, KD, VD>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    type Elem = V;
    type ElemDescriptor = VD;
    type Cursor<'a>
        = Cursor<'a, KD, VD>
    where
        Self: 'a;

    fn size(&self) -> usize {
        self.len()
    }

    fn max_size(&self) -> usize {
        MAX_SIZE
    }

    fn begin(&self) -> Self::Cursor<'_> {
        HashMap::begin(self)
    }

    fn end(&self) -> Self::Cursor<'_> {
        HashMap::end(self)
    }

    fn clear(&mut self) {
        HashMap::clear(self)
    }

    fn elem_descriptor(&self) -> &VD {
        self.value_descriptor()
    }
}

impl<K, V, KD, VD> Map for HashMap<K, V, KD, VD>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    type Key = K;
    type KeyDescriptor = KD;

    fn put(&mut self, key: &K, value: &V) -> Result<&mut V, MapError> {
        HashMap::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn at(&self, key: &K) -> Self::Cursor<'_> {
        HashMap::at(self, key)
    }

    fn erase(&mut self, key: &K) {
        HashMap::erase(self, key)
    }

    fn exist(&self, key: &K) -> bool {
        HashMap::exist(self, key)
    }

    fn change_key(&mut self, old: &K, new: &K) -> Result<&K, MapError> {
        HashMap::change_key(self, old, new)
    }

    fn iterator_key<'a>(&'a self, cursor: &Self::Cursor<'a>) -> Option<&'a K> {
        HashMap::iterator_key(self, cursor)
    }

    fn key_descriptor(&self) -> &KD {
        HashMap::key_descriptor(self)
    }
}

impl<K, V, KD, VD> Elements<V> for HashMap<K, V, KD, VD>
where
    KD: Descriptor<Item = K>,
    VD: Descriptor<Item = V>,
{
    fn count(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &V> + '_> {
        Box::new(self.values())
    }
}
