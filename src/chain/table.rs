use rustc_hash::FxHashMap;

use super::bag::WordBag;
use super::vocab::WordId;
use crate::error::{ChainError, Result};

/// Ordered sequence of exactly `order` word ids used as a lookup key.
///
/// Hashing goes through the standard slice hash, which mixes the length and every element
/// in order; map lookups always confirm a hash hit with a full equality check.
pub(crate) type StateKey = Box<[WordId]>;

/// Mapping from state keys to the bag of successors observed after them.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateTable {
    states: FxHashMap<StateKey, WordBag>,
}

impl StateTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Exact-key lookup.
    pub(crate) fn lookup(&self, key: &[WordId]) -> Result<&WordBag> {
        self.states.get(key).ok_or(ChainError::NotFound)
    }

    /// Appends `word` to the bag stored under `key`, creating the state on first sight.
    ///
    /// The key is only copied when the state is new, and a state never exists without at
    /// least one successor.
    pub(crate) fn record(&mut self, key: &[WordId], word: WordId) {
        if let Some(bag) = self.states.get_mut(key) {
            bag.insert(word);
            return;
        }
        let mut bag = WordBag::new();
        bag.insert(word);
        self.states.insert(key.into(), bag);
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Total number of recorded (key, successor) observations.
    pub(crate) fn transition_count(&self) -> usize {
        self.states.values().map(WordBag::len).sum()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.states.reserve(additional);
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&[WordId], &WordBag)> + '_ {
        self.states.iter().map(|(key, bag)| (&key[..], bag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_under_the_same_key() {
        let mut table = StateTable::new();
        table.record(&[1, 2], 3);
        table.record(&[1, 2], 4);
        table.record(&[2, 1], 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.transition_count(), 3);
        let bag = table.lookup(&[1, 2]).unwrap();
        assert_eq!(bag.iter().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn lookup_distinguishes_order_and_length() {
        let mut table = StateTable::new();
        table.record(&[1, 2], 3);
        assert!(matches!(table.lookup(&[2, 1]), Err(ChainError::NotFound)));
        assert!(matches!(table.lookup(&[1]), Err(ChainError::NotFound)));
        assert!(matches!(table.lookup(&[1, 2, 3]), Err(ChainError::NotFound)));
    }

    #[test]
    fn every_stored_bag_is_non_empty() {
        let mut table = StateTable::new();
        for i in 0..32u32 {
            table.record(&[i % 5, i % 3], i);
        }
        assert!(table.iter().all(|(_, bag)| !bag.is_empty()));
        table.clear();
        assert!(table.is_empty());
    }
}
