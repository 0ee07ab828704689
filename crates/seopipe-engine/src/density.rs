//! Keyword matching and density math.
//!
//! This module is intentionally:
//! - **pure**: no I/O, no shared state
//! - **deterministic**: identical input always produces identical output
//! - **count-based**: exact token matching only, no stemming or similarity

use crate::textprep::tokenize;
use seopipe_core::{Error, KeywordDensity, Result};
use std::collections::BTreeMap;

/// Count occurrences of `keyword` in `tokens`.
///
/// Multi-word keywords use a sliding window with step 1, so overlapping
/// matches count independently: tokens `a b a b` contain keyword `a b`
/// twice. A keyword with no words (empty or punctuation-only) is invalid
/// input, never a silent zero.
pub fn count_occurrences(tokens: &[String], keyword: &str) -> Result<u64> {
    let words = keyword_words(keyword)?;
    Ok(count_window(tokens, &words))
}

/// The keyword's word sequence: same tokenization policy as content, so a
/// hyphenated keyword matches its punctuation-split form in the text.
fn keyword_words(keyword: &str) -> Result<Vec<String>> {
    let words = tokenize(keyword);
    if words.is_empty() {
        return Err(Error::InvalidInput(format!(
            "keyword {keyword:?} contains no words"
        )));
    }
    Ok(words)
}

fn count_window(tokens: &[String], words: &[String]) -> u64 {
    let k = words.len();
    if k == 0 || tokens.len() < k {
        return 0;
    }
    let mut count = 0u64;
    for i in 0..=(tokens.len() - k) {
        if tokens[i..i + k] == words[..] {
            count += 1;
        }
    }
    count
}

/// Round half-up to one decimal place. Input is a non-negative percentage.
fn round1(x: f64) -> f64 {
    (x * 10.0 + 0.5).floor() / 10.0
}

/// Compute per-keyword occurrence counts and densities over `content`.
///
/// Content is tokenized once; `density = 100 * count / total_words`,
/// rounded half-up to one decimal. Total words are always measured over the
/// whole content, never per section. With no tokens in `content`, every
/// keyword reports count 0 and density 0.0. Duplicate keywords collapse to
/// one entry.
pub fn keyword_density(
    content: &str,
    keywords: &[String],
) -> Result<BTreeMap<String, KeywordDensity>> {
    // Reject malformed keywords up front, before any counting: an empty
    // keyword must fail loudly even when content is empty.
    let mut parsed: Vec<(&String, Vec<String>)> = Vec::with_capacity(keywords.len());
    for kw in keywords {
        parsed.push((kw, keyword_words(kw)?));
    }

    let tokens = tokenize(content);
    let total_words = tokens.len() as u64;

    let mut out = BTreeMap::new();
    for (kw, words) in parsed {
        let count = if total_words == 0 {
            0
        } else {
            count_window(&tokens, &words)
        };
        let density = if total_words == 0 {
            0.0
        } else {
            round1(count as f64 / total_words as f64 * 100.0)
        };
        out.insert(kw.clone(), KeywordDensity { count, density });
    }
    Ok(out)
}
