use std::convert::TryFrom;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::error::{ChainError, Result};

/// Compact identifier of an interned word.
pub(crate) type WordId = u32;

/// Engine-owned word storage.
///
/// Word bytes are appended to a single growing buffer so that the many short words seen
/// during ingestion share one amortised allocation instead of one each. The index maps a
/// content hash to the most recent word with that hash; older words with the same hash are
/// reachable through `next`, and every candidate is compared by content before it is
/// returned. Everything is released together when the owning chain is dropped or reset.
#[derive(Debug, Clone)]
pub(crate) struct Vocabulary {
    data: String,
    /// `offsets[i]..offsets[i + 1]` spans word `i` inside `data`.
    offsets: Vec<usize>,
    /// Collision chain: previous word sharing the same hash bucket.
    next: Vec<Option<WordId>>,
    index: FxHashMap<u64, WordId>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    pub(crate) fn new() -> Self {
        Self {
            data: String::new(),
            offsets: vec![0],
            next: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Returns the id of `word`, storing it first if it has not been seen.
    pub(crate) fn intern(&mut self, word: &str) -> Result<WordId> {
        let hash = hash_word(word);
        let head = self.index.get(&hash).copied();
        if let Some(id) = self.scan(head, word) {
            return Ok(id);
        }
        let id = WordId::try_from(self.len())
            .map_err(|_| ChainError::Internal("vocabulary size exceeded u32::MAX".into()))?;
        self.data.push_str(word);
        self.offsets.push(self.data.len());
        self.next.push(head);
        self.index.insert(hash, id);
        Ok(id)
    }

    /// Looks up an already interned word.
    pub(crate) fn find(&self, word: &str) -> Option<WordId> {
        let head = self.index.get(&hash_word(word)).copied();
        self.scan(head, word)
    }

    pub(crate) fn get(&self, id: WordId) -> &str {
        let idx = id as usize;
        &self.data[self.offsets[idx]..self.offsets[idx + 1]]
    }

    pub(crate) fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.offsets.truncate(1);
        self.next.clear();
        self.index.clear();
    }

    fn scan(&self, mut cursor: Option<WordId>, word: &str) -> Option<WordId> {
        while let Some(id) = cursor {
            if self.get(id) == word {
                return Some(id);
            }
            cursor = self.next[id as usize];
        }
        None
    }
}

fn hash_word(word: &str) -> u64 {
    let mut hasher = FxHasher::default();
    word.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates_words() {
        let mut vocab = Vocabulary::new();
        let a = vocab.intern("alpha").unwrap();
        let b = vocab.intern("beta").unwrap();
        assert_ne!(a, b);
        assert_eq!(vocab.intern("alpha").unwrap(), a);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.get(a), "alpha");
        assert_eq!(vocab.get(b), "beta");
    }

    #[test]
    fn colliding_hashes_are_told_apart_by_content() {
        let mut vocab = Vocabulary::new();
        let a = vocab.intern("first").unwrap();
        // Force "second" into the same bucket as "first".
        let hash = hash_word("second");
        vocab.index.insert(hash, a);
        let b = vocab.intern("second").unwrap();
        assert_ne!(a, b);
        assert_eq!(vocab.find("second"), Some(b));
        assert_eq!(vocab.next[b as usize], Some(a));
        assert_eq!(vocab.scan(Some(b), "first"), Some(a));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut vocab = Vocabulary::new();
        vocab.intern("word").unwrap();
        vocab.clear();
        assert_eq!(vocab.len(), 0);
        assert!(vocab.find("word").is_none());
        assert_eq!(vocab.intern("other").unwrap(), 0);
        assert_eq!(vocab.get(0), "other");
    }
}
