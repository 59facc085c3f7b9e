use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Insertion-ordered set of keys.
///
/// Serializes as a plain array in insertion order so that persisted state and
/// ledger snapshots round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<K>", into = "Vec<K>")]
#[serde(bound(
    serialize = "K: Serialize + Clone",
    deserialize = "K: Deserialize<'de> + Hash + Eq + Clone"
))]
pub struct OrderedSet<K: Hash + Eq> {
    members: HashSet<K>,
    keys: Vec<K>,
}

impl<K: Hash + Eq + Clone> Default for OrderedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone> OrderedSet<K> {
    pub fn new() -> Self {
        OrderedSet {
            members: HashSet::new(),
            keys: Vec::new(),
        }
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.members.insert(key.clone()) {
            self.keys.push(key);
            true
        } else {
            false
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.members.contains(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.keys.retain(|k| keep(k));
        self.members = self.keys.iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.keys.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Hash + Eq + Clone> From<Vec<K>> for OrderedSet<K> {
    fn from(keys: Vec<K>) -> Self {
        keys.into_iter().collect()
    }
}

impl<K: Hash + Eq + Clone> From<OrderedSet<K>> for Vec<K> {
    fn from(set: OrderedSet<K>) -> Self {
        set.keys
    }
}

impl<K: Hash + Eq + Clone> FromIterator<K> for OrderedSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}
