use bit_set::BitSet;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// A set which remembers the order in which its elements were inserted. Equality of two
/// such sets disregards that order.
pub type OrderedSet<S> = indexmap::IndexSet<S, fxhash::FxBuildHasher>;
/// A map which remembers the order in which its keys were inserted.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Adds all elements of `bits` to `to` and reports whether `to` changed in the process.
pub fn add_all(to: &mut BitSet, bits: &BitSet) -> bool {
    if bits.is_subset(to) {
        return false;
    }
    to.union_with(bits);
    true
}
