//! Helpers for (de)serialising chains in the whitespace-delimited text format.

pub mod text_format;

pub(crate) use text_format::{parse_chain, write_chain, ParsedChain};
pub use text_format::{is_reserved_token, CHAIN_DELIMITER, CHAIN_HEADER, CHAIN_TRAILER};
