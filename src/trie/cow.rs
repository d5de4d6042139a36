use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) type Payload = Arc<dyn Any + Send + Sync>;

/// One node of the trie. A node is never mutated once published: every
/// operation clones the nodes on the touched path and shares the rest by
/// reference. The node is value-bearing iff `value` is present.
#[derive(Default)]
struct TrieNode {
    children: BTreeMap<u8, Arc<TrieNode>>,
    value: Option<Payload>,
}

enum Removed {
    /// the terminal node lost its value and had no children
    Pruned,
    Replaced(TrieNode),
}

impl TrieNode {
    fn put(&self, key: &[u8], payload: Payload) -> TrieNode {
        match key.split_first() {
            None => TrieNode {
                children: self.children.clone(),
                value: Some(payload),
            },
            Some((&byte, rest)) => {
                let child = match self.children.get(&byte) {
                    Some(child) => child.put(rest, payload),
                    None => TrieNode::fresh(rest, payload),
                };
                let mut children = self.children.clone();
                children.insert(byte, Arc::new(child));
                TrieNode {
                    children,
                    value: self.value.clone(),
                }
            }
        }
    }

    /// a chain of new nodes ending in the value
    fn fresh(key: &[u8], payload: Payload) -> TrieNode {
        match key.split_first() {
            None => TrieNode {
                children: BTreeMap::new(),
                value: Some(payload),
            },
            Some((&byte, rest)) => {
                let mut children = BTreeMap::new();
                children.insert(byte, Arc::new(TrieNode::fresh(rest, payload)));
                TrieNode {
                    children,
                    value: None,
                }
            }
        }
    }

    /// None when no value is stored at key. The terminal node is pruned if
    /// childless and demoted to a plain node otherwise; ancestors keep
    /// their remaining children even when that leaves them empty.
    fn remove(&self, key: &[u8]) -> Option<Removed> {
        match key.split_first() {
            None => {
                self.value.as_ref()?;
                if self.children.is_empty() {
                    Some(Removed::Pruned)
                } else {
                    Some(Removed::Replaced(TrieNode {
                        children: self.children.clone(),
                        value: None,
                    }))
                }
            }
            Some((&byte, rest)) => {
                let child = self.children.get(&byte)?;
                let removed = child.remove(rest)?;
                let mut children = self.children.clone();
                match removed {
                    Removed::Pruned => {
                        children.remove(&byte);
                    }
                    Removed::Replaced(child) => {
                        children.insert(byte, Arc::new(child));
                    }
                }
                Some(Removed::Replaced(TrieNode {
                    children,
                    value: self.value.clone(),
                }))
            }
        }
    }
}

/// A persistent map from strings to values of any type. Operations never
/// modify the trie they run on; they hand back a new one sharing every
/// untouched subtree with the old, so earlier versions stay fully usable.
#[derive(Clone)]
pub struct Trie {
    root: Arc<TrieNode>,
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            root: Arc::new(TrieNode::default()),
        }
    }

    /// Get the value stored at key. None when the key is absent or the
    /// stored value is not a T.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.find(key)?.value.as_ref()?.downcast_ref::<T>()
    }

    /// Map key to value in a new trie, overriding any previous value of any
    /// type at that key.
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) -> Trie {
        let payload: Payload = Arc::new(value);
        Trie {
            root: Arc::new(self.root.put(key.as_bytes(), payload)),
        }
    }

    /// Remove the value at key. When no value is stored there the result
    /// keeps the current root handle.
    pub fn remove(&self, key: &str) -> Trie {
        match self.root.remove(key.as_bytes()) {
            None => Trie {
                root: Arc::clone(&self.root),
            },
            Some(Removed::Replaced(root)) => Trie {
                root: Arc::new(root),
            },
            Some(Removed::Pruned) => Trie::new(),
        }
    }

    pub(super) fn get_payload(&self, key: &str) -> Option<Payload> {
        self.find(key)?.value.clone()
    }

    fn find(&self, key: &str) -> Option<&TrieNode> {
        let mut node = self.root.as_ref();
        for &byte in key.as_bytes() {
            node = node.children.get(&byte)?.as_ref();
        }
        Some(node)
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_put_test() {
        let trie = Trie::new();
        let trie = trie.put::<u32>("test-int", 233);
        let trie = trie.put::<u64>("test-int2", 23333333);
        let trie = trie.put::<String>("test-string", "test".to_string());
        let trie = trie.put::<String>("", "empty-key".to_string());
        assert_eq!(trie.get::<String>(""), Some(&"empty-key".to_string()));
    }

    #[test]
    fn put_get_one_path() {
        let trie = Trie::new();
        let trie = trie.put::<u32>("111", 111);
        let trie = trie.put::<u32>("11", 11);
        let trie = trie.put::<u32>("1111", 1111);
        let trie = trie.put::<u32>("11", 22);
        assert_eq!(trie.get::<u32>("11"), Some(&22));
        assert_eq!(trie.get::<u32>("111"), Some(&111));
        assert_eq!(trie.get::<u32>("1111"), Some(&1111));
    }

    #[test]
    fn basic_remove_test() {
        let trie = Trie::new();
        let trie = trie.put::<u32>("test", 2333);
        let trie = trie.put::<u32>("te", 23);
        let trie = trie.put::<u32>("tes", 233);
        // remove outside-in
        let trie = trie.remove("test");
        let trie = trie.remove("tes");
        let trie = trie.remove("te");
        assert_eq!(trie.get::<u32>("te"), None);
        assert_eq!(trie.get::<u32>("tes"), None);
        assert_eq!(trie.get::<u32>("test"), None);

        let trie = Trie::new();
        let trie = trie.put::<u32>("test", 2333);
        let trie = trie.put::<u32>("te", 23);
        let trie = trie.put::<u32>("tes", 233);
        // remove inside-out
        let trie = trie.remove("te");
        let trie = trie.remove("tes");
        let trie = trie.remove("test");
        assert_eq!(trie.get::<u32>("te"), None);
        assert_eq!(trie.get::<u32>("tes"), None);
        assert_eq!(trie.get::<u32>("test"), None);
    }

    #[test]
    fn remove_missing_keeps_root() {
        let trie = Trie::new().put::<u32>("test", 2333);
        let same = trie.remove("te");
        assert!(Arc::ptr_eq(&trie.root, &same.root));
        let same = trie.remove("testing");
        assert!(Arc::ptr_eq(&trie.root, &same.root));
        // idempotent in observed behaviour
        let once = trie.remove("test");
        let twice = once.remove("test");
        assert_eq!(once.get::<u32>("test"), None);
        assert_eq!(twice.get::<u32>("test"), None);
        assert!(Arc::ptr_eq(&once.root, &twice.root));
    }

    #[test]
    fn mismatch_type_test() {
        let trie = Trie::new().put::<u32>("test", 2333);
        assert_eq!(trie.get::<String>("test"), None);
        assert_eq!(trie.get::<u64>("test"), None);
        assert_eq!(trie.get::<u32>("test"), Some(&2333));
    }

    #[test]
    fn copy_on_write_remove_test() {
        let empty = Trie::new();
        let trie1 = empty.put::<u32>("test", 2333);
        let trie2 = trie1.put::<u32>("te", 23);
        let trie3 = trie2.put::<u32>("tes", 233);

        let trie4 = trie3.remove("te");
        let trie5 = trie3.remove("tes");
        let trie6 = trie3.remove("test");

        assert_eq!(trie3.get::<u32>("te"), Some(&23));
        assert_eq!(trie3.get::<u32>("tes"), Some(&233));
        assert_eq!(trie3.get::<u32>("test"), Some(&2333));

        assert_eq!(trie4.get::<u32>("te"), None);
        assert_eq!(trie4.get::<u32>("tes"), Some(&233));
        assert_eq!(trie4.get::<u32>("test"), Some(&2333));

        assert_eq!(trie5.get::<u32>("te"), Some(&23));
        assert_eq!(trie5.get::<u32>("tes"), None);
        assert_eq!(trie5.get::<u32>("test"), Some(&2333));

        assert_eq!(trie6.get::<u32>("te"), Some(&23));
        assert_eq!(trie6.get::<u32>("tes"), Some(&233));
        assert_eq!(trie6.get::<u32>("test"), None);
    }

    #[test]
    fn copy_on_write_override_test() {
        let empty = Trie::new();
        let trie1 = empty.put::<u32>("test", 2333);
        let trie2 = trie1.put::<u32>("te", 23);
        let trie3 = trie2.put::<u32>("tes", 233);

        // override with another type
        let trie4 = trie3.put::<String>("te", "23".to_string());
        let trie5 = trie3.put::<String>("tes", "233".to_string());
        let trie6 = trie3.put::<String>("test", "2333".to_string());

        assert_eq!(trie3.get::<u32>("te"), Some(&23));
        assert_eq!(trie3.get::<u32>("tes"), Some(&233));
        assert_eq!(trie3.get::<u32>("test"), Some(&2333));

        assert_eq!(trie4.get::<String>("te"), Some(&"23".to_string()));
        assert_eq!(trie4.get::<u32>("te"), None);
        assert_eq!(trie4.get::<u32>("tes"), Some(&233));
        assert_eq!(trie4.get::<u32>("test"), Some(&2333));

        assert_eq!(trie5.get::<u32>("te"), Some(&23));
        assert_eq!(trie5.get::<String>("tes"), Some(&"233".to_string()));
        assert_eq!(trie5.get::<u32>("test"), Some(&2333));

        assert_eq!(trie6.get::<u32>("te"), Some(&23));
        assert_eq!(trie6.get::<u32>("tes"), Some(&233));
        assert_eq!(trie6.get::<String>("test"), Some(&"2333".to_string()));
        assert_eq!(trie6.get::<u32>("test"), None);
    }

    #[test]
    fn empty_key_test() {
        let empty = Trie::new();
        let trie1 = empty.put::<u32>("test", 2333);
        let trie2 = trie1.put::<u32>("te", 23);
        let trie3 = trie2.put::<u32>("", 233);

        let trie4 = trie3.put::<String>("te", "23".to_string());
        let trie5 = trie3.put::<String>("", "233".to_string());

        assert_eq!(trie3.get::<u32>("te"), Some(&23));
        assert_eq!(trie3.get::<u32>(""), Some(&233));
        assert_eq!(trie3.get::<u32>("test"), Some(&2333));

        assert_eq!(trie4.get::<String>("te"), Some(&"23".to_string()));
        assert_eq!(trie4.get::<u32>(""), Some(&233));

        assert_eq!(trie5.get::<u32>("te"), Some(&23));
        assert_eq!(trie5.get::<String>(""), Some(&"233".to_string()));

        // removing the root value keeps the children reachable
        let trie6 = trie3.remove("");
        assert_eq!(trie6.get::<u32>(""), None);
        assert_eq!(trie6.get::<u32>("te"), Some(&23));
        assert_eq!(trie6.get::<u32>("test"), Some(&2333));
    }

    #[test]
    fn pointer_stability_test() {
        let trie = Trie::new().put::<u32>("test", 2333);
        let ptr_before = trie.get::<u32>("test").unwrap() as *const u32;
        let trie = trie.put::<u32>("tes", 233);
        let trie = trie.put::<u32>("te", 23);
        let trie = trie.remove("tes");
        let ptr_after = trie.get::<u32>("test").unwrap() as *const u32;
        assert_eq!(ptr_before, ptr_after);
    }

    #[test]
    fn non_cloneable_test() {
        struct Opaque(u32);
        let trie = Trie::new();
        let trie = trie.put::<Opaque>("tes", Opaque(233));
        let trie = trie.put::<Opaque>("te", Opaque(23));
        let trie = trie.put::<Opaque>("test", Opaque(2333));
        assert_eq!(trie.get::<Opaque>("te").unwrap().0, 23);
        assert_eq!(trie.get::<Opaque>("tes").unwrap().0, 233);
        assert_eq!(trie.get::<Opaque>("test").unwrap().0, 2333);
        let trie = trie.remove("te");
        let trie = trie.remove("tes");
        let trie = trie.remove("test");
        assert!(trie.get::<Opaque>("te").is_none());
        assert!(trie.get::<Opaque>("tes").is_none());
        assert!(trie.get::<Opaque>("test").is_none());
    }

    #[test]
    fn mixed_test() {
        let mut trie = Trie::new();
        for i in 0..2333u32 {
            let key = format!("{:05}", i);
            let value = format!("value-{:08}", i);
            trie = trie.put::<String>(&key, value);
        }
        let trie_full = trie.clone();
        for i in (0..2333u32).step_by(2) {
            let key = format!("{:05}", i);
            let value = format!("new-value-{:08}", i);
            trie = trie.put::<String>(&key, value);
        }
        let trie_override = trie.clone();
        for i in (0..2333u32).step_by(3) {
            let key = format!("{:05}", i);
            trie = trie.remove(&key);
        }
        let trie_final = trie;

        for i in 0..2333u32 {
            let key = format!("{:05}", i);
            let value = format!("value-{:08}", i);
            assert_eq!(trie_full.get::<String>(&key), Some(&value));
        }
        for i in 0..2333u32 {
            let key = format!("{:05}", i);
            let value = if i % 2 == 0 {
                format!("new-value-{:08}", i)
            } else {
                format!("value-{:08}", i)
            };
            assert_eq!(trie_override.get::<String>(&key), Some(&value));
        }
        for i in 0..2333u32 {
            let key = format!("{:05}", i);
            if i % 3 == 0 {
                assert_eq!(trie_final.get::<String>(&key), None);
            } else if i % 2 == 0 {
                let value = format!("new-value-{:08}", i);
                assert_eq!(trie_final.get::<String>(&key), Some(&value));
            } else {
                let value = format!("value-{:08}", i);
                assert_eq!(trie_final.get::<String>(&key), Some(&value));
            }
        }
    }
}
