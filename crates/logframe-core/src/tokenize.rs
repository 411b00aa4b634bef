//! Word tokenizer.
//!
//! A token is a maximal run of word characters (Unicode alphanumerics and
//! `_`). Everything else separates tokens, so no token is ever empty.

use once_cell::sync::Lazy;
use regex::{Matches, Regex};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Lazy, single-pass iterator over the word tokens of a text.
///
/// Tokens borrow from the input and keep their original case. Calling
/// [`tokens`] again on the same text restarts the sequence.
pub struct Tokens<'t> {
    inner: Matches<'static, 't>,
}

impl<'t> Iterator for Tokens<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|m| m.as_str())
    }
}

/// Tokenize `text`.
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens {
        inner: WORD.find_iter(text),
    }
}

/// Number of tokens in `text`, without allocating.
pub fn count_tokens(text: &str) -> usize {
    tokens(text).count()
}
