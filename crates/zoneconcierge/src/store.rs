/*!
   Minimal byte-keyed store abstraction used by the keeper.

   The host chain provides the actual storage. Mutations are assumed to
   run inside the host's ordered state transition, so no locking happens
   at this layer.
*/

use std::collections::BTreeMap;

/// Read access to a byte-keyed store.
pub trait ReadStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Read and write access to a byte-keyed store.
pub trait KvStore: ReadStore {
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Deleting a missing key is a no-op.
    fn delete(&mut self, key: &[u8]);
}

impl<S: ReadStore + ?Sized> ReadStore for &S {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn has(&self, key: &[u8]) -> bool {
        (**self).has(key)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for &mut S {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn has(&self, key: &[u8]) -> bool {
        (**self).has(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &[u8]) {
        (**self).delete(key)
    }
}

/// In-memory store, ordered by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReadStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}

impl KvStore for MemStore {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }
}

/**
   A view over a parent store where every key is transparently prefixed
   with a fixed namespace.
*/
#[derive(Debug)]
pub struct PrefixStore<S> {
    parent: S,
    prefix: Vec<u8>,
}

impl<S> PrefixStore<S> {
    pub fn new(parent: S, prefix: &[u8]) -> Self {
        Self {
            parent,
            prefix: prefix.to_vec(),
        }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full_key = Vec::with_capacity(self.prefix.len() + key.len());
        full_key.extend_from_slice(&self.prefix);
        full_key.extend_from_slice(key);
        full_key
    }
}

impl<S: ReadStore> ReadStore for PrefixStore<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.parent.get(&self.full_key(key))
    }

    fn has(&self, key: &[u8]) -> bool {
        self.parent.has(&self.full_key(key))
    }
}

impl<S: KvStore> KvStore for PrefixStore<S> {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        let full_key = self.full_key(key);
        self.parent.set(&full_key, value)
    }

    fn delete(&mut self, key: &[u8]) {
        let full_key = self.full_key(key);
        self.parent.delete(&full_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn prefix_store_namespaces_keys() {
        let mut store = MemStore::new();

        PrefixStore::new(&mut store, b"a/").set(b"key", b"1");
        PrefixStore::new(&mut store, b"b/").set(b"key", b"2");

        assert_eq!(store.get(b"a/key"), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b/key"), Some(b"2".to_vec()));
        assert!(!store.has(b"key"));

        let view = PrefixStore::new(&store, b"a/");
        assert!(view.has(b"key"));
        assert!(!view.has(b"other"));
    }

    #[test]
    fn deleting_missing_key_is_noop() {
        let mut store = MemStore::new();
        store.set(b"present", b"x");

        PrefixStore::new(&mut store, b"p/").delete(b"missing");
        store.delete(b"also-missing");

        assert_eq!(store.len(), 1);
    }
}
