//! # Text Normalizer
//!
//! Canonicalizes raw query and corpus strings into the comparable form every
//! downstream component expects: ASCII letters only, lower-cased, single
//! spaces, no leading or trailing whitespace.

use deunicode::deunicode_char;
use regex::Regex;

use crate::error::Result;

/// Symbols stripped outright instead of being transliterated.
const SUPPLEMENTARY_SYMBOLS: &[char] = &['¶', '¬', '©', '£', 'ª', '√', '®'];

/// Normalizer with pre-compiled patterns.
///
/// Cheap to share: it holds only compiled regexes and is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    re_non_alpha: Regex,
    re_whitespace: Regex,
}

impl TextNormalizer {
    /// Constructs a new `TextNormalizer`.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::RegexError` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_non_alpha: Regex::new(r"[^A-Za-z\s]")?,
            re_whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Normalizes `text`, returning `None` when nothing comparable remains.
    ///
    /// Non-ASCII letters are transliterated, every other non-letter
    /// (digits and punctuation included) becomes a space, the result is
    /// lower-cased and whitespace runs collapse to one space.
    ///
    /// # Examples
    /// ```
    /// use nrr_core::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new().unwrap();
    /// assert_eq!(normalizer.normalize("  Crème Brûlée, No. 2!").as_deref(), Some("creme brulee no"));
    /// assert_eq!(normalizer.normalize("1234"), None);
    /// ```
    #[must_use]
    pub fn normalize(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        let ascii = transliterate(text);
        let letters = self.re_non_alpha.replace_all(&ascii, " ");
        let lowered = letters.to_lowercase();
        let collapsed = self.re_whitespace.replace_all(lowered.trim(), " ");

        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed.into_owned())
        }
    }

    /// Normalizes an optional cell, treating `None` as missing.
    #[must_use]
    pub fn normalize_opt(&self, text: Option<&str>) -> Option<String> {
        text.and_then(|t| self.normalize(t))
    }
}

/// Maps `text` to ASCII. Letters are transliterated, combining marks
/// vanish and any other non-ASCII character becomes a space.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if c.is_whitespace() || SUPPLEMENTARY_SYMBOLS.contains(&c) {
            out.push(' ');
        } else {
            match deunicode_char(c) {
                Some("") => {}
                Some(ascii) if c.is_alphabetic() => out.push_str(ascii),
                _ => out.push(' '),
            }
        }
    }
    out
}
