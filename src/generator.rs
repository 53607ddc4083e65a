//! Text generation by walking a chain from a set of seed words.

use std::collections::VecDeque;
use std::io::Write;

use log::debug;

use crate::chain::MarkovChain;
use crate::config::GenerateConfig;
use crate::error::{ChainError, Result};
use crate::normalize::normalize_word;

/// Sliding-window walk over a chain.
///
/// The window always holds exactly `order` words; each generated word is appended and the
/// oldest one dropped.
#[derive(Debug)]
pub struct TextGenerator<'a> {
    chain: &'a mut MarkovChain,
    window: VecDeque<String>,
}

impl<'a> TextGenerator<'a> {
    /// Starts a walk from the last `order` words of `seeds`.
    ///
    /// Seeds are expected to be normalised already; see [`prepare_seeds`].
    pub fn new<S: AsRef<str>>(chain: &'a mut MarkovChain, seeds: &[S]) -> Result<Self> {
        let order = chain.order();
        if order == 0 {
            return Err(ChainError::InvalidOrder);
        }
        if seeds.len() < order {
            return Err(ChainError::InvalidConfig(format!(
                "chain order is {order} but only {} seed words were provided",
                seeds.len()
            )));
        }
        let window = seeds[seeds.len() - order..]
            .iter()
            .map(|word| word.as_ref().to_owned())
            .collect();
        Ok(Self { chain, window })
    }

    /// Current context words, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &str> + '_ {
        self.window.iter().map(String::as_str)
    }

    /// Generates the next word and slides the window past it.
    pub fn next_word(&mut self) -> Result<String> {
        let word = self.chain.generate_word(self.window.make_contiguous())?;
        self.window.pop_front();
        self.window.push_back(word.clone());
        Ok(word)
    }
}

/// Normalises seed words the same way training input is normalised.
///
/// Seeds that normalise to nothing are dropped; fewer than `order` survivors is an
/// [`ChainError::InvalidConfig`] error.
pub fn prepare_seeds<S: AsRef<str>>(seeds: &[S], order: usize) -> Result<Vec<String>> {
    let mut accepted = Vec::with_capacity(seeds.len());
    for seed in seeds {
        match normalize_word(seed.as_ref().as_bytes())? {
            Some(word) => accepted.push(word),
            None => debug!("ignoring seed word {:?}", seed.as_ref()),
        }
    }
    if accepted.len() < order {
        return Err(ChainError::InvalidConfig(format!(
            "chain order is {order}, {} usable seed words is too few",
            accepted.len()
        )));
    }
    Ok(accepted)
}

/// Writes words separated by spaces, breaking the line after every `per_line` words.
#[derive(Debug)]
struct LineWriter<W> {
    out: W,
    per_line: usize,
    column: usize,
}

impl<W: Write> LineWriter<W> {
    fn new(out: W, per_line: usize) -> Self {
        Self {
            out,
            per_line: per_line.max(1),
            column: 0,
        }
    }

    fn push(&mut self, word: &str) -> Result<()> {
        if self.column > 0 {
            self.out.write_all(b" ")?;
        }
        self.out.write_all(word.as_bytes())?;
        self.column += 1;
        if self.column == self.per_line {
            self.out.write_all(b"\n")?;
            self.column = 0;
        }
        Ok(())
    }

    /// Terminates a partially filled line.
    fn end_line(&mut self) -> Result<()> {
        if self.column > 0 {
            self.out.write_all(b"\n")?;
            self.column = 0;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Echoes the seeds, then writes `cfg.word_count` generated words to `out`.
///
/// Words are written as they are produced, so when generation fails midway the words
/// already written stay in `out` and the error is returned afterwards. Returns the number
/// of generated words.
pub fn generate_text<S, W>(
    chain: &mut MarkovChain,
    seeds: &[S],
    cfg: &GenerateConfig,
    out: W,
) -> Result<usize>
where
    S: AsRef<str>,
    W: Write,
{
    cfg.validate()?;
    if chain.order() == 0 {
        return Err(ChainError::InvalidOrder);
    }
    if let Some(seed) = cfg.seed {
        chain.reseed(seed);
    }
    let seeds = prepare_seeds(seeds, chain.order())?;
    let mut writer = LineWriter::new(out, cfg.words_per_line);
    for seed in &seeds {
        writer.push(seed)?;
    }
    writer.end_line()?;

    let mut walk = TextGenerator::new(chain, &seeds)?;
    let mut generated = 0;
    while generated < cfg.word_count {
        match walk.next_word() {
            Ok(word) => writer.push(&word)?,
            Err(err) => {
                writer.end_line()?;
                return Err(err);
            }
        }
        generated += 1;
    }
    writer.end_line()?;
    Ok(generated)
}
