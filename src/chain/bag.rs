use std::io::{self, Write};

use rand::Rng;

use super::vocab::{Vocabulary, WordId};

/// Every successor observed after one state, duplicates kept explicitly.
///
/// Sampling a uniform position therefore picks a word with probability proportional to
/// the number of times it was observed. A bag stored in the chain is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WordBag {
    words: Vec<WordId>,
}

impl WordBag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, word: WordId) {
        self.words.push(word);
    }

    /// Draws one stored word; `None` only for an empty bag.
    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<WordId> {
        if self.is_empty() {
            return None;
        }
        Some(self.words[rng.gen_range(0..self.len())])
    }

    pub(crate) fn len(&self) -> usize {
        self.words.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = WordId> + '_ {
        self.words.iter().copied()
    }

    /// Writes `<count> <word_1> ... <word_count>` in insertion order.
    pub(crate) fn write_to<W: Write + ?Sized>(
        &self,
        vocab: &Vocabulary,
        out: &mut W,
    ) -> io::Result<()> {
        write!(out, "{}", self.words.len())?;
        for &id in &self.words {
            write!(out, " {}", vocab.get(id))?;
        }
        Ok(())
    }
}
