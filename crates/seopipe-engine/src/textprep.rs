//! Minimal, deterministic tokenization.
//!
//! Policy: lowercase, then treat every non-alphanumeric character as a token
//! separator. Runs of separators collapse; empty fragments are discarded.
//! No stemming, no stop words, no locale awareness beyond Unicode
//! whitespace/punctuation splitting.

/// Split `text` into an ordered, lowercased token sequence.
///
/// Empty or whitespace-only input yields an empty vec.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            // Full Unicode lowercasing; a single char may lowercase to several.
            for lc in ch.to_lowercase() {
                cur.push(lc);
            }
        } else if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// Canonical total-word measure: the token count of `text`.
pub fn word_count(text: &str) -> usize {
    tokenize(text).len()
}
