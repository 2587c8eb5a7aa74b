//! Hash containers, re-exports *hashbrown* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{NoOpHashState, NoOpHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
///
/// Iteration order only depends on the inserted keys, never on process state.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`] by default.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_state_is_deterministic() {
        use core::hash::BuildHasher;

        let a = FixedHashState.hash_one("field.0");
        let b = FixedHashState.hash_one("field.0");
        assert_eq!(a, b);
        assert_ne!(a, FixedHashState.hash_one("field.1"));
    }

    #[test]
    fn map_alias_uses_fixed_state() {
        let mut map: HashMap<&str, u32> = HashMap::default();
        map.insert("count", 3);
        assert_eq!(map.get("count"), Some(&3));

        let set: HashSet<u8> = [1, 2, 2].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
