//! Bidirectional index between object keys and dense integer ids.

use std::collections::HashMap;

use crate::record::ObjectKey;

/// Maps object keys to a dense `0..n` range and back.
///
/// Dense ids follow the sorted key order, so two indexes built from the same
/// key set are identical regardless of the order the keys arrived in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseIndex {
    keys: Vec<ObjectKey>,
    ids: HashMap<ObjectKey, usize>,
}

impl DenseIndex {
    /// Build an index from any key collection. Duplicates are collapsed.
    pub fn new<I: IntoIterator<Item = ObjectKey>>(keys: I) -> Self {
        let mut keys: Vec<ObjectKey> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        let ids = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        Self { keys, ids }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Dense id of a key.
    pub fn id(&self, key: &ObjectKey) -> Option<usize> {
        self.ids.get(key).copied()
    }

    /// Key of a dense id.
    pub fn key(&self, id: usize) -> Option<ObjectKey> {
        self.keys.get(id).copied()
    }

    /// All keys in dense-id (sorted) order.
    pub fn keys(&self) -> &[ObjectKey] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_index_is_order_independent() {
        let a = DenseIndex::new(vec![ObjectKey::new(3, 1), ObjectKey::new(1, 2), ObjectKey::new(1, 1)]);
        let b = DenseIndex::new(vec![ObjectKey::new(1, 1), ObjectKey::new(3, 1), ObjectKey::new(1, 2)]);
        assert_eq!(a, b);
        assert_eq!(a.id(&ObjectKey::new(1, 1)), Some(0));
        assert_eq!(a.id(&ObjectKey::new(3, 1)), Some(2));
        assert_eq!(a.key(1), Some(ObjectKey::new(1, 2)));
    }

    #[test]
    fn test_dense_index_round_trip_and_missing() {
        let index = DenseIndex::new(vec![ObjectKey::new(2, 2), ObjectKey::new(2, 2)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.key(index.id(&ObjectKey::new(2, 2)).unwrap()), Some(ObjectKey::new(2, 2)));
        assert_eq!(index.id(&ObjectKey::new(9, 9)), None);
        assert_eq!(index.key(5), None);
    }
}
