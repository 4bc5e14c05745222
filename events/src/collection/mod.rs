//! Specialized collection types used for the variable-cardinality data this
//! crate moves around (a run's trade ids, a symbol's subscriber set, ...).
//!
//! - [`FnvIndexMap<K, V>`] / [`FnvIndexSet<T>`] - `IndexMap`/`IndexSet` with
//!   the FNV hasher, which outperforms the default `SipHash` for the short
//!   keys (symbols, order ids) common in this codebase.

/// Fast IndexMap using FNV hasher for better performance with small keys.
pub type FnvIndexMap<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

/// Fast IndexSet using FNV hasher for better performance with small keys.
pub type FnvIndexSet<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_index_map_preserves_insertion_order() {
        let mut map: FnvIndexMap<&str, i32> = FnvIndexMap::default();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
    }
}
