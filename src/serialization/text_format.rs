//! Plain-text chain format.
//!
//! ```text
//! MARKOV_TEXT_CHAIN_BEGIN
//! <order>
//! <bucket count hint>
//! <key_1> ... <key_order> -> <count> <next_1> ... <next_count>
//! MARKOV_TEXT_CHAIN_END
//! ```
//!
//! Tokens are separated by any run of word separators (see [`is_separator`]), so line
//! breaks are cosmetic. Input
//! preceding the header is ignored, which lets a chain follow other output in one stream.

use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::chain::{MarkovChain, StateTable, Vocabulary, WordId};
use crate::error::{ChainError, Result};
use crate::splitter::is_separator;

/// Token opening a serialised chain.
pub const CHAIN_HEADER: &str = "MARKOV_TEXT_CHAIN_BEGIN";
/// Token closing a serialised chain.
pub const CHAIN_TRAILER: &str = "MARKOV_TEXT_CHAIN_END";
/// Token separating a state key from its successors.
pub const CHAIN_DELIMITER: &str = "->";

/// Upper bound on the table reservation requested by a bucket count hint.
const MAX_RESERVED_STATES: usize = 1 << 20;

/// Returns `true` for tokens with structural meaning in the format.
#[must_use]
pub fn is_reserved_token(token: &str) -> bool {
    token == CHAIN_HEADER || token == CHAIN_TRAILER || token == CHAIN_DELIMITER
}

/// Chain contents decoded from a stream, not yet installed into a [`MarkovChain`].
#[derive(Debug)]
pub(crate) struct ParsedChain {
    pub(crate) order: usize,
    pub(crate) vocab: Vocabulary,
    pub(crate) table: StateTable,
}

/// Serialises `chain`; an uninitialised chain has nothing meaningful to write.
pub(crate) fn write_chain<W: Write + ?Sized>(chain: &MarkovChain, out: &mut W) -> Result<()> {
    if chain.order() == 0 {
        return Err(ChainError::InvalidOrder);
    }
    let vocab = chain.vocab();
    let table = chain.table();

    writeln!(out, "{CHAIN_HEADER}")?;
    writeln!(out, "{}", chain.order())?;
    writeln!(out, "{}", table.len())?;
    for (key, bag) in table.iter() {
        for &id in key {
            write!(out, "{} ", vocab.get(id))?;
        }
        write!(out, "{CHAIN_DELIMITER} ")?;
        bag.write_to(vocab, out)?;
        writeln!(out)?;
    }
    writeln!(out, "{CHAIN_TRAILER}")?;
    debug!(
        "wrote chain: order {} states {}",
        chain.order(),
        table.len()
    );
    Ok(())
}

/// Parses one chain from `input`, reading up to and including the trailer.
pub(crate) fn parse_chain<R: BufRead>(input: R) -> Result<ParsedChain> {
    let mut scanner = TokenScanner::new(input);
    loop {
        match scanner.next_token()? {
            Some(token) if token == CHAIN_HEADER => break,
            Some(_) => continue,
            None => {
                return Err(ChainError::TruncatedInput(format!(
                    "no {CHAIN_HEADER} header found"
                )))
            }
        }
    }

    let order = read_count(&mut scanner, "chain order")?;
    if order == 0 {
        return Err(ChainError::WrongOrder("chain order must be positive".into()));
    }
    let hint = read_count(&mut scanner, "bucket count hint")?;

    let mut vocab = Vocabulary::new();
    let mut table = StateTable::new();
    if hint > MAX_RESERVED_STATES {
        warn!("bucket count hint {hint} exceeds {MAX_RESERVED_STATES}; reserving the cap");
    }
    table.reserve(hint.min(MAX_RESERVED_STATES));

    let mut key: Vec<WordId> = Vec::with_capacity(order);
    loop {
        key.clear();
        loop {
            let token = scanner.next_token()?.ok_or_else(|| {
                ChainError::TruncatedInput(format!("input ended before {CHAIN_TRAILER}"))
            })?;
            match token.as_str() {
                CHAIN_DELIMITER => break,
                CHAIN_TRAILER if key.is_empty() => {
                    debug!(
                        "parsed chain: order {} states {} transitions {}",
                        order,
                        table.len(),
                        table.transition_count()
                    );
                    return Ok(ParsedChain {
                        order,
                        vocab,
                        table,
                    });
                }
                CHAIN_TRAILER => {
                    return Err(ChainError::WrongOrder(format!(
                        "state key of {} words cut off by {CHAIN_TRAILER}, chain order is {order}",
                        key.len()
                    )))
                }
                CHAIN_HEADER => {
                    return Err(ChainError::CorruptFormat(format!(
                        "unexpected {CHAIN_HEADER} inside chain body"
                    )))
                }
                word => {
                    if key.len() == order {
                        return Err(ChainError::WrongOrder(format!(
                            "state key runs past {order} words without {CHAIN_DELIMITER}"
                        )));
                    }
                    key.push(vocab.intern(word)?);
                }
            }
        }
        if key.len() != order {
            return Err(ChainError::WrongOrder(format!(
                "state key has {} words, chain order is {order}",
                key.len()
            )));
        }

        let count = read_count(&mut scanner, "successor count")?;
        if count == 0 {
            return Err(ChainError::CorruptFormat(
                "state declares no successors".into(),
            ));
        }
        for remaining in (1..=count).rev() {
            let token = match scanner.next_token()? {
                Some(token) if token != CHAIN_TRAILER => token,
                _ => {
                    return Err(ChainError::TruncatedInput(format!(
                        "state is missing {remaining} of {count} successors"
                    )))
                }
            };
            if is_reserved_token(&token) {
                return Err(ChainError::CorruptFormat(format!(
                    "reserved token {token:?} used as a successor"
                )));
            }
            let id = vocab.intern(&token)?;
            table.record(&key, id);
        }
    }
}

/// Reads the next token as an unsigned integer.
fn read_count<R: BufRead>(scanner: &mut TokenScanner<R>, what: &str) -> Result<usize> {
    match scanner.next_token()? {
        None => Err(ChainError::TruncatedInput(format!("missing {what}"))),
        Some(token) if token == CHAIN_TRAILER => Err(ChainError::TruncatedInput(format!(
            "missing {what} before {CHAIN_TRAILER}"
        ))),
        Some(token) => token.parse::<usize>().map_err(|_| {
            ChainError::CorruptFormat(format!("{what} {token:?} is not an unsigned integer"))
        }),
    }
}

/// Splits a byte stream into whitespace-delimited tokens, skipping empty ones.
struct TokenScanner<R> {
    reader: R,
    token: Vec<u8>,
}

impl<R: BufRead> TokenScanner<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            token: Vec::new(),
        }
    }

    fn next_token(&mut self) -> Result<Option<String>> {
        self.token.clear();
        loop {
            let buffer = match self.reader.fill_buf() {
                Ok(buffer) => buffer,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if buffer.is_empty() {
                break;
            }
            let mut consumed = 0usize;
            let mut complete = false;
            for &byte in buffer {
                consumed += 1;
                if is_separator(byte) {
                    if !self.token.is_empty() {
                        complete = true;
                        break;
                    }
                } else {
                    self.token.push(byte);
                }
            }
            self.reader.consume(consumed);
            if complete {
                break;
            }
        }
        if self.token.is_empty() {
            return Ok(None);
        }
        String::from_utf8(std::mem::take(&mut self.token))
            .map(Some)
            .map_err(|err| ChainError::CorruptFormat(format!("token is not UTF-8: {err}")))
    }
}
