//! Word-level Markov chain engine.
//!
//! A [`MarkovChain`] of order `n` maps every run of `n` consecutive words seen during
//! ingestion to the bag of words that followed it. Building feeds normalized words through
//! [`MarkovChain::add_word`]; generation walks a sliding window forward with
//! [`MarkovChain::generate_word`]. Chains persist to a whitespace-delimited text format
//! through [`MarkovChain::save`] and [`MarkovChain::load`].
//!
//! ```
//! use markov_text::MarkovChain;
//!
//! # fn main() -> markov_text::Result<()> {
//! let mut chain = MarkovChain::with_seed(2, 7);
//! chain.add_words(["the", "cat", "sat", "down"])?;
//! chain.flush();
//! assert_eq!(chain.generate_word(&["the", "cat"])?, "sat");
//!
//! let mut saved = Vec::new();
//! chain.save(&mut saved)?;
//! let mut restored = MarkovChain::default();
//! restored.load(saved.as_slice())?;
//! assert_eq!(restored.order(), 2);
//! # Ok(())
//! # }
//! ```

mod bag;
mod table;
mod vocab;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ChainError, Result};
use crate::metrics::ChainStats;
use crate::serialization::{self, ParsedChain};
use crate::splitter::is_separator;

pub(crate) use table::StateTable;
pub(crate) use vocab::{Vocabulary, WordId};

/// Markov chain over words with a fixed order.
///
/// An order of zero marks an uninitialised chain: it can be populated by [`load`] or given
/// an order with [`set_order`], but every other operation fails with
/// [`ChainError::InvalidOrder`].
///
/// [`load`]: MarkovChain::load
/// [`set_order`]: MarkovChain::set_order
#[derive(Debug, Clone)]
pub struct MarkovChain {
    order: usize,
    /// Most recent words seen during ingestion, at most `order` of them.
    window: VecDeque<WordId>,
    vocab: Vocabulary,
    table: StateTable,
    rng: StdRng,
}

impl Default for MarkovChain {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MarkovChain {
    /// Creates an empty chain of the given order with an entropy-seeded generator.
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self::with_rng(order, StdRng::from_entropy())
    }

    /// Creates an empty chain whose sampling is reproducible for a fixed `seed`.
    #[must_use]
    pub fn with_seed(order: usize, seed: u64) -> Self {
        Self::with_rng(order, StdRng::seed_from_u64(seed))
    }

    /// Creates an empty chain drawing from the supplied generator.
    #[must_use]
    pub fn with_rng(order: usize, rng: StdRng) -> Self {
        Self {
            order,
            window: VecDeque::with_capacity(order),
            vocab: Vocabulary::new(),
            table: StateTable::new(),
            rng,
        }
    }

    /// Replaces the random generator with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Returns the chain order (zero when uninitialised).
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Sets a new order, discarding every state, word and the ingestion window.
    ///
    /// Keys of different lengths never share one table.
    pub fn set_order(&mut self, order: usize) {
        self.clear();
        self.order = order;
        self.window.reserve(order);
    }

    /// Ingests one word.
    ///
    /// Until `order` words have been seen the word only fills the window. After that the
    /// current window is recorded as a state whose successor is `word`, and the window
    /// slides forward by one.
    pub fn add_word(&mut self, word: &str) -> Result<()> {
        if self.order == 0 {
            return Err(ChainError::InvalidOrder);
        }
        validate_word(word)?;
        let id = self.vocab.intern(word)?;
        if self.window.len() < self.order {
            self.window.push_back(id);
            return Ok(());
        }
        self.table.record(self.window.make_contiguous(), id);
        self.window.pop_front();
        self.window.push_back(id);
        Ok(())
    }

    /// Ingests every word of `words` in order.
    pub fn add_words<I, S>(&mut self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.add_word(word.as_ref())?;
        }
        Ok(())
    }

    /// Draws a successor of `key`, weighted by how often each successor was observed.
    ///
    /// Fails with [`ChainError::CannotGenerate`] when `key` was never recorded, which
    /// includes keys whose length differs from the chain order.
    pub fn generate_word<S: AsRef<str>>(&mut self, key: &[S]) -> Result<String> {
        if self.order == 0 {
            return Err(ChainError::InvalidOrder);
        }
        let cannot_generate = || ChainError::CannotGenerate {
            key: key.iter().map(|word| word.as_ref().to_owned()).collect(),
        };
        if key.len() != self.order {
            return Err(cannot_generate());
        }
        let ids = key
            .iter()
            .map(|word| self.vocab.find(word.as_ref()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(cannot_generate)?;
        let bag = match self.table.lookup(&ids) {
            Ok(bag) => bag,
            Err(ChainError::NotFound) => return Err(cannot_generate()),
            Err(err) => return Err(err),
        };
        let id = bag
            .sample(&mut self.rng)
            .ok_or_else(|| ChainError::Internal("state without successors".into()))?;
        Ok(self.vocab.get(id).to_owned())
    }

    /// Forgets the ingestion window so the next word starts a fresh context.
    ///
    /// Call between independent sources; recorded states are kept.
    pub fn flush(&mut self) {
        self.window.clear();
    }

    /// Writes the chain in the persisted text format.
    pub fn save<W: Write>(&self, mut output: W) -> Result<()> {
        serialization::write_chain(self, &mut output)?;
        output.flush()?;
        Ok(())
    }

    /// Saves the chain to `path`, creating or truncating the file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| ChainError::io(err, Some(path.into())))?;
        self.save(BufWriter::new(file)).map_err(|err| match err {
            ChainError::Io { source, path: None } => ChainError::io(source, Some(path.into())),
            other => other,
        })
    }

    /// Replaces the chain contents with a chain read from `input`.
    ///
    /// Input before the header token is skipped. On any failure the chain is left empty
    /// with order zero; a partially parsed chain is never kept.
    pub fn load<R: BufRead>(&mut self, input: R) -> Result<()> {
        self.clear();
        self.order = 0;
        let ParsedChain {
            order,
            vocab,
            table,
        } = serialization::parse_chain(input)?;
        debug!(
            "loaded chain: order {} states {} words {}",
            order,
            table.len(),
            vocab.len()
        );
        self.order = order;
        self.vocab = vocab;
        self.table = table;
        Ok(())
    }

    /// Loads a chain from the file at `path`.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                self.clear();
                self.order = 0;
                return Err(ChainError::io(err, Some(path.into())));
            }
        };
        self.load(BufReader::new(file)).map_err(|err| match err {
            ChainError::Io { source, path: None } => ChainError::io(source, Some(path.into())),
            other => other,
        })
    }

    /// Returns `true` when no state has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of distinct states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.table.len()
    }

    /// Total number of recorded (state, successor) observations.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.table.transition_count()
    }

    /// Number of distinct words known to the chain.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    /// Successors recorded after `key`, in observation order and with repetitions.
    pub fn successors<S: AsRef<str>>(&self, key: &[S]) -> Result<Vec<&str>> {
        let ids = key
            .iter()
            .map(|word| self.vocab.find(word.as_ref()))
            .collect::<Option<Vec<_>>>()
            .ok_or(ChainError::NotFound)?;
        let bag = self.table.lookup(&ids)?;
        Ok(bag.iter().map(|id| self.vocab.get(id)).collect())
    }

    /// Iterates over every state as `(key, successors)`, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = (Vec<&str>, Vec<&str>)> + '_ {
        self.table.iter().map(move |(key, bag)| {
            let key = key.iter().map(|&id| self.vocab.get(id)).collect();
            let successors = bag.iter().map(|id| self.vocab.get(id)).collect();
            (key, successors)
        })
    }

    /// Summarises the chain contents.
    #[must_use]
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            order: self.order,
            states: self.table.len(),
            transitions: self.table.transition_count(),
            vocabulary: self.vocab.len(),
            widest_state: self.table.iter().map(|(_, bag)| bag.len()).max().unwrap_or(0),
        }
    }

    pub(crate) fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub(crate) fn table(&self) -> &StateTable {
        &self.table
    }

    fn clear(&mut self) {
        self.window.clear();
        self.vocab.clear();
        self.table.clear();
    }
}

fn validate_word(word: &str) -> Result<()> {
    if word.is_empty()
        || word.bytes().any(is_separator)
        || serialization::is_reserved_token(word)
    {
        return Err(ChainError::InvalidWord(word.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_states(chain: &MarkovChain) -> Vec<(Vec<String>, Vec<String>)> {
        let mut states: Vec<_> = chain
            .states()
            .map(|(key, successors)| {
                let key = key.into_iter().map(str::to_owned).collect();
                let mut successors: Vec<String> =
                    successors.into_iter().map(str::to_owned).collect();
                successors.sort();
                (key, successors)
            })
            .collect();
        states.sort();
        states
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| (*word).to_owned()).collect()
    }

    #[test]
    fn order_two_scenario_builds_expected_states() {
        let mut chain = MarkovChain::with_seed(2, 1);
        chain.add_words(["a", "b", "c", "b", "d"]).unwrap();
        chain.flush();

        assert_eq!(
            sorted_states(&chain),
            vec![
                (strings(&["a", "b"]), strings(&["c"])),
                (strings(&["b", "c"]), strings(&["b"])),
                (strings(&["c", "b"]), strings(&["d"])),
            ]
        );
        assert_eq!(chain.generate_word(&["a", "b"]).unwrap(), "c");
        let err = chain.generate_word(&["x", "y"]).unwrap_err();
        assert!(matches!(err, ChainError::CannotGenerate { key } if key == ["x", "y"]));
    }

    #[test]
    fn ingesting_l_words_records_l_minus_n_transitions() {
        let words: Vec<String> = (0..50).map(|i| format!("w{}", i % 7)).collect();
        for order in 1..=5 {
            let mut chain = MarkovChain::with_seed(order, 3);
            chain.add_words(&words).unwrap();
            assert_eq!(chain.transition_count(), words.len() - order);
        }
    }

    #[test]
    fn repeated_keys_accumulate() {
        let mut chain = MarkovChain::with_seed(1, 3);
        chain.add_words(["a", "b", "a", "c", "a", "b"]).unwrap();
        let mut successors = chain.successors(&["a"]).unwrap();
        successors.sort_unstable();
        assert_eq!(successors, vec!["b", "b", "c"]);
    }

    #[test]
    fn flush_keeps_sources_apart() {
        let mut chain = MarkovChain::with_seed(2, 5);
        chain.add_words(["one", "two", "three"]).unwrap();
        chain.flush();
        chain.add_words(["four", "five", "six"]).unwrap();
        chain.flush();

        let first = ["one", "two", "three"];
        for (key, _) in chain.states() {
            let from_first = key.iter().filter(|word| first.contains(*word)).count();
            assert!(from_first == 0 || from_first == key.len(), "{key:?} spans sources");
        }
        assert_eq!(chain.transition_count(), 2);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut once = MarkovChain::with_seed(2, 9);
        let mut twice = MarkovChain::with_seed(2, 9);
        for chain in [&mut once, &mut twice] {
            chain.add_words(["a", "b", "c"]).unwrap();
        }
        once.flush();
        twice.flush();
        twice.flush();
        for chain in [&mut once, &mut twice] {
            chain.add_words(["d", "e", "f"]).unwrap();
        }
        assert_eq!(sorted_states(&once), sorted_states(&twice));
    }

    #[test]
    fn zero_order_rejects_use() {
        let mut chain = MarkovChain::default();
        assert!(matches!(chain.add_word("a"), Err(ChainError::InvalidOrder)));
        assert!(matches!(
            chain.generate_word(&["a"]),
            Err(ChainError::InvalidOrder)
        ));
        assert!(matches!(
            chain.save(Vec::new()),
            Err(ChainError::InvalidOrder)
        ));
    }

    #[test]
    fn set_order_discards_existing_states() {
        let mut chain = MarkovChain::with_seed(2, 1);
        chain.add_words(["a", "b", "c"]).unwrap();
        chain.set_order(3);
        assert_eq!(chain.order(), 3);
        assert!(chain.is_empty());
        assert_eq!(chain.vocabulary_size(), 0);
        chain.add_words(["a", "b", "c", "d"]).unwrap();
        assert!(chain.states().all(|(key, _)| key.len() == 3));
    }

    #[test]
    fn words_the_format_cannot_carry_are_rejected() {
        let mut chain = MarkovChain::with_seed(1, 1);
        for word in ["", "two words", "tab\x0Bbed", "->", "MARKOV_TEXT_CHAIN_END"] {
            assert!(
                matches!(chain.add_word(word), Err(ChainError::InvalidWord(_))),
                "{word:?} should be rejected"
            );
        }
        assert_eq!(chain.vocabulary_size(), 0);
    }

    #[test]
    fn key_of_wrong_length_cannot_generate() {
        let mut chain = MarkovChain::with_seed(2, 1);
        chain.add_words(["a", "b", "c"]).unwrap();
        assert!(matches!(
            chain.generate_word(&["b"]),
            Err(ChainError::CannotGenerate { .. })
        ));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let words = ["x", "a", "x", "b", "x", "c", "x", "d", "x"];
        let mut left = MarkovChain::with_seed(1, 42);
        let mut right = MarkovChain::with_seed(1, 42);
        left.add_words(words).unwrap();
        right.add_words(words).unwrap();
        let draws_left: Vec<_> = (0..20)
            .map(|_| left.generate_word(&["x"]).unwrap())
            .collect();
        let draws_right: Vec<_> = (0..20)
            .map(|_| right.generate_word(&["x"]).unwrap())
            .collect();
        assert_eq!(draws_left, draws_right);
    }

    #[test]
    fn save_then_load_restores_every_state() {
        let mut chain = MarkovChain::with_seed(2, 4);
        chain
            .add_words(["the", "cat", "sat", "the", "cat", "ran", "the", "cat", "sat"])
            .unwrap();
        chain.flush();
        chain.add_words(["a", "dog", "sat", "down"]).unwrap();

        let mut saved = Vec::new();
        chain.save(&mut saved).unwrap();
        let mut restored = MarkovChain::default();
        restored.load(saved.as_slice()).unwrap();

        assert_eq!(restored.order(), chain.order());
        assert_eq!(restored.stats(), chain.stats());
        assert_eq!(sorted_states(&restored), sorted_states(&chain));
    }

    #[test]
    fn failed_load_leaves_an_empty_chain() {
        let mut source = MarkovChain::with_seed(1, 2);
        source.add_words(["x", "y", "z"]).unwrap();
        let mut saved = Vec::new();
        source.save(&mut saved).unwrap();

        let mut chain = MarkovChain::with_seed(3, 2);
        chain.load(saved.as_slice()).unwrap();
        assert_eq!(chain.order(), 1);
        assert_eq!(chain.state_count(), 2);

        let truncated = "MARKOV_TEXT_CHAIN_BEGIN\n2\n1\na b -> 2 c\n";
        let err = chain.load(truncated.as_bytes()).unwrap_err();
        assert!(matches!(err, ChainError::TruncatedInput(_)));
        assert_eq!(chain.order(), 0);
        assert!(chain.is_empty());
        assert_eq!(chain.vocabulary_size(), 0);
        assert!(matches!(chain.add_word("a"), Err(ChainError::InvalidOrder)));
    }

    #[test]
    fn stats_summarise_contents() {
        let mut chain = MarkovChain::with_seed(1, 1);
        chain.add_words(["a", "b", "a", "c", "a"]).unwrap();
        let stats = chain.stats();
        assert_eq!(stats.order, 1);
        assert_eq!(stats.states, 3);
        assert_eq!(stats.transitions, 4);
        assert_eq!(stats.vocabulary, 3);
        assert_eq!(stats.widest_state, 2);
    }
}
