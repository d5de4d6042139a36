mod cow;
mod store;

pub use cow::Trie;
pub use store::{TrieStore, ValueGuard};
