//! Word normalisation applied before words reach the chain.
//!
//! Rules, applied per character of a raw word:
//! - ASCII letters fold to lowercase; ASCII digits pass through.
//! - A hyphen survives only if it is the first hyphen of the word and is neither its first
//!   nor its last byte.
//! - Other ASCII characters are dropped.
//! - Two-byte Cyrillic letters (`А`..`я`, `Ё`, `ё`) fold to lowercase; every other
//!   multi-byte character is dropped.
//!
//! Words that end up empty, or as a lone hyphen, are discarded.

use crate::error::{ChainError, Result};

const HYPHEN: char = '-';

/// Normalises a raw word, returning `None` when nothing usable remains.
///
/// Fails with [`ChainError::Encoding`] when `raw` is not valid UTF-8.
pub fn normalize_word(raw: &[u8]) -> Result<Option<String>> {
    let text = std::str::from_utf8(raw).map_err(|err| {
        ChainError::Encoding(format!(
            "{err} in {:?}",
            String::from_utf8_lossy(raw).into_owned()
        ))
    })?;

    let last = raw.len().saturating_sub(1);
    let mut result = String::with_capacity(raw.len());
    let mut hyphen_seen = false;
    for (offset, ch) in text.char_indices() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' => result.push(ch.to_ascii_lowercase()),
            HYPHEN if !hyphen_seen && offset != 0 && offset != last => {
                hyphen_seen = true;
                result.push(HYPHEN);
            }
            _ if ch.is_ascii() => {}
            _ => {
                if let Some(folded) = fold_cyrillic(ch) {
                    result.push(folded);
                }
            }
        }
    }

    if result.is_empty() || result == "-" {
        return Ok(None);
    }
    Ok(Some(result))
}

/// Lowercases the Russian alphabet; anything else yields `None`.
fn fold_cyrillic(ch: char) -> Option<char> {
    match ch {
        'А'..='Я' => char::from_u32(ch as u32 + 0x20),
        'Ё' => Some('ё'),
        'а'..='я' | 'ё' => Some(ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> Option<String> {
        normalize_word(raw.as_bytes()).expect("valid UTF-8")
    }

    #[test]
    fn folds_case_and_strips_punctuation() {
        assert_eq!(normalize("Hello-World!").as_deref(), Some("hello-world"));
        assert_eq!(normalize("\"Quote,\"").as_deref(), Some("quote"));
        assert_eq!(normalize("R2D2").as_deref(), Some("r2d2"));
    }

    #[test]
    fn keeps_only_the_first_interior_hyphen() {
        assert_eq!(normalize("A--B").as_deref(), Some("a-b"));
        assert_eq!(normalize("one-two-three").as_deref(), Some("one-twothree"));
        assert_eq!(normalize("-lead").as_deref(), Some("lead"));
        assert_eq!(normalize("trail-").as_deref(), Some("trail"));
    }

    #[test]
    fn discards_empty_and_lone_hyphen_results() {
        assert_eq!(normalize("-"), None);
        assert_eq!(normalize("!-?"), None);
        assert_eq!(normalize("..."), None);
    }

    #[test]
    fn folds_cyrillic_and_drops_other_scripts() {
        assert_eq!(normalize("Привет").as_deref(), Some("привет"));
        assert_eq!(normalize("ЁЛКА").as_deref(), Some("ёлка"));
        assert_eq!(normalize("Ωmega").as_deref(), Some("mega"));
        assert_eq!(normalize("日本"), None);
        assert_eq!(normalize("слово№дело").as_deref(), Some("словодело"));
    }

    #[test]
    fn rejects_malformed_utf8() {
        let err = normalize_word(&[b'a', 0xD0]).unwrap_err();
        assert!(matches!(err, ChainError::Encoding(_)));
    }
}
