use super::cow::Trie;
use parking_lot::Mutex;
use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

/// Thread-safe front over the copy-on-write trie: any number of readers,
/// one writer at a time. Readers copy the root handle under the root latch
/// and then work against that private snapshot, so they never wait on a
/// writer beyond the pointer copy.
#[derive(Default)]
pub struct TrieStore {
    /// protects reading and swapping the root handle, held only for the copy
    root: Mutex<Trie>,
    /// serialises writers, held for the whole write
    write_lock: Mutex<()>,
}

/// Keeps the snapshot a value was read from alive, so the value stays valid
/// after the store's root moves on.
pub struct ValueGuard<T> {
    _snapshot: Trie,
    value: Arc<T>,
}

impl<T> Deref for ValueGuard<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}

impl TrieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read key against a private snapshot of the current root. None when
    /// the key is absent or holds a value of another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<ValueGuard<T>> {
        let snapshot = self.root.lock().clone();
        let value = snapshot.get_payload(key)?.downcast::<T>().ok()?;
        Some(ValueGuard {
            _snapshot: snapshot,
            value,
        })
    }

    /// Map key to value, overriding any previous value.
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) {
        let _write = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let trie = snapshot.put(key, value);
        *self.root.lock() = trie;
    }

    /// Remove the value at key.
    pub fn remove(&self, key: &str) {
        let _write = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let trie = snapshot.remove(key);
        *self.root.lock() = trie;
    }
}
