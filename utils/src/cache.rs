use std::{collections::HashMap, hash::Hash, sync::Arc};

use arc_swap::ArcSwap;

/// A run-scoped memo that only ever grows.
///
/// Readers never block. Writers go through an RCU loop that keeps the first value stored
/// for a key, so concurrent resolutions of the same key agree on one answer.
#[derive(Debug)]
pub struct AppendOnlyCache<K, V> {
    entries: ArcSwap<HashMap<K, V>>,
}

impl<K, V> Default for AppendOnlyCache<K, V> {
    fn default() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }
}

impl<K, V> AppendOnlyCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.load().get(key).cloned()
    }

    /// Stores `value` unless the key is already present. Returns whichever value ends up
    /// cached.
    pub fn insert_if_absent(&self, key: K, value: V) -> V {
        let mut stored = value.clone();

        self.entries.rcu(|current| match current.get(&key) {
            Some(existing) => {
                stored = existing.clone();
                Arc::clone(current)
            }
            None => {
                stored = value.clone();
                let mut next = (**current).clone();
                next.insert(key.clone(), value.clone());
                Arc::new(next)
            }
        });

        stored
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}
