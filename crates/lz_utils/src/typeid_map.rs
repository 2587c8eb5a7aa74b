use core::any::TypeId;
use core::fmt::Debug;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::hash::NoOpHashState;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`].
///
/// `TypeId` is already a hash, so the map uses [`NoOpHashState`] and the
/// lookup cost is a single probe. `new` is `const`, which lets the map live
/// directly inside a `static Mutex`.
///
/// # Examples
///
/// ```
/// use lz_utils::TypeIdMap;
///
/// let mut map = TypeIdMap::new();
/// assert!(map.try_insert_type::<u8>(|| "byte"));
/// assert!(!map.try_insert_type::<u8>(|| "again"));
/// assert_eq!(map.get_type::<u8>(), Some(&"byte"));
/// ```
pub struct TypeIdMap<V>(HashMap<TypeId, V, NoOpHashState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty map.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(NoOpHashState))
    }

    /// Inserts the value produced by `f` unless `type_id` is already present.
    ///
    /// Returns `true` if the value was inserted. `f` runs only in that case.
    #[inline]
    pub fn try_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// [`try_insert`](Self::try_insert) keyed by `T`.
    #[inline(always)]
    pub fn try_insert_type<T: ?Sized + 'static>(&mut self, f: impl FnOnce() -> V) -> bool {
        self.try_insert(TypeId::of::<T>(), f)
    }

    /// Returns the value for `type_id`, inserting the result of `f` first if absent.
    #[inline]
    pub fn get_or_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> &mut V {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => entry.insert(f()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    #[inline(always)]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeId::of::<T>())
    }

    /// Removes `type_id`, returning its value if it was present.
    #[inline]
    pub fn remove(&mut self, type_id: &TypeId) -> Option<V> {
        self.0.remove(type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the registered types in arbitrary order.
    #[inline]
    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeId> {
        self.0.keys()
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Debug> Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::TypeIdMap;
    use core::any::TypeId;

    #[test]
    fn get_or_insert_keeps_first_value() {
        let mut map = TypeIdMap::new();
        *map.get_or_insert(TypeId::of::<i32>(), || 1) += 10;
        *map.get_or_insert(TypeId::of::<i32>(), || 100) += 10;
        assert_eq!(map.get_type::<i32>(), Some(&21));
    }

    #[test]
    fn remove_and_contains() {
        let mut map = TypeIdMap::new();
        map.try_insert_type::<f64>(|| ());
        map.try_insert_type::<u64>(|| ());
        assert_eq!(map.len(), 2);
        assert!(map.contains_type::<f64>());

        assert_eq!(map.remove(&TypeId::of::<f64>()), Some(()));
        assert!(!map.contains_type::<f64>());
        assert_eq!(map.types().count(), 1);
    }

    #[test]
    fn const_new_in_static() {
        static EMPTY: TypeIdMap<u8> = TypeIdMap::new();
        assert!(EMPTY.is_empty());
        assert_eq!(EMPTY.get_type::<u8>(), None);
    }
}
