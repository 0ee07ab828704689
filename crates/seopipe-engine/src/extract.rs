//! Structured-output recovery from free-form LLM text.
//!
//! LLM responses wrap their JSON payload in narrative prose, code fences,
//! or an envelope object. Recovery is an ordered cascade of independent,
//! pure parse strategies; each yields either a syntactically valid JSON
//! object or "no match", never a partial one. The cascade stops at the
//! first hit. Field-level schema validation is a separate concern layered
//! on top (see `schema`).

use seopipe_core::{Error, ParseDiagnostics, Result};
use serde_json::Value;

/// Envelope payloads can nest ("result" strings carrying more envelopes);
/// recursion is bounded rather than trusted.
const MAX_ENVELOPE_DEPTH: usize = 4;

/// Recover a single JSON object from `raw`.
///
/// Fails with `Error::Parse` (length + head/tail snippets) only after all
/// strategies are exhausted.
pub fn extract_structured(raw: &str) -> Result<Value> {
    extract_structured_with_trace(raw).map(|(v, _)| v)
}

/// Same cascade, but also reports which strategy produced the object.
pub fn extract_structured_with_trace(raw: &str) -> Result<(Value, &'static str)> {
    cascade(raw, 0)
}

fn cascade(raw: &str, depth: usize) -> Result<(Value, &'static str)> {
    if depth > MAX_ENVELOPE_DEPTH {
        return Err(Error::Parse(ParseDiagnostics::from_raw(raw)));
    }
    let attempts: [(&'static str, fn(&str, usize) -> Option<Value>); 6] = [
        ("envelope", attempt_envelope),
        ("direct", |r, _| attempt_direct(r)),
        ("fenced_block", |r, _| attempt_fenced(r)),
        ("narrative_strip", |r, _| attempt_narrative_strip(r)),
        ("brace_scan", |r, _| attempt_brace_scan(r)),
        ("whole_text", |r, _| attempt_whole(r)),
    ];
    for (name, attempt) in attempts {
        if let Some(v) = attempt(raw, depth) {
            return Ok((v, name));
        }
    }
    Err(Error::Parse(ParseDiagnostics::from_raw(raw)))
}

fn parse_object(s: &str) -> Option<Value> {
    let v: Value = serde_json::from_str(s).ok()?;
    v.is_object().then_some(v)
}

/// Strategy 1: `{"type":"result","result":...}` envelope unwrap.
///
/// An object payload is returned directly; a string payload re-enters the
/// whole cascade (it is usually a serialized object, possibly wrapped
/// again).
fn attempt_envelope(raw: &str, depth: usize) -> Option<Value> {
    let v: Value = serde_json::from_str(raw.trim()).ok()?;
    let obj = v.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("result") {
        return None;
    }
    match obj.get("result")? {
        Value::Object(inner) => Some(Value::Object(inner.clone())),
        Value::String(inner) => cascade(inner, depth + 1).ok().map(|(v, _)| v),
        _ => None,
    }
}

/// Strategy 2: the trimmed input is exactly one JSON object.
fn attempt_direct(raw: &str) -> Option<Value> {
    let t = raw.trim();
    if !(t.starts_with('{') && t.ends_with('}')) {
        return None;
    }
    parse_object(t)
}

/// Strategy 3: a ```json (or plain ```) fenced block.
fn attempt_fenced(raw: &str) -> Option<Value> {
    let after = if let Some(start) = raw.find("```json") {
        &raw[start + "```json".len()..]
    } else if let Some(start) = raw.find("```") {
        &raw[start + "```".len()..]
    } else {
        return None;
    };
    let end = after.find("```")?;
    parse_object(after[..end].trim())
}

/// Strategy 4: a known narrative lead-in precedes the object.
///
/// Only fires when the prefix looks like narration ("I have completed...",
/// "Here is the...", markdown headings); arbitrary prefixes are left to the
/// brace scan.
fn attempt_narrative_strip(raw: &str) -> Option<Value> {
    let idx = raw.find('{')?;
    let prefix = raw[..idx].trim();
    if prefix.is_empty() || !looks_like_narrative(prefix) {
        return None;
    }
    parse_object(raw[idx..].trim())
}

fn looks_like_narrative(prefix: &str) -> bool {
    const LEAD_INS: [&str; 8] = [
        "i have", "i've", "here is", "here's", "here are", "sure", "below is", "okay",
    ];
    let lc = prefix.to_lowercase();
    if lc.lines().any(|l| l.trim_start().starts_with('#')) {
        return true;
    }
    LEAD_INS.iter().any(|p| lc.starts_with(p))
}

/// Strategy 5: scan from the first `{` to its matching `}` with
/// string/escape awareness, then parse that slice.
///
/// Finds the true end of a syntactically complete object even when
/// trailing prose follows, without being confused by braces inside string
/// literals.
fn attempt_brace_scan(raw: &str) -> Option<Value> {
    let slice = balanced_object_slice(raw)?;
    parse_object(slice)
}

/// The byte range of the first balanced `{...}` in `raw`, or `None` when
/// no opening brace closes.
fn balanced_object_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy 6: last resort, parse the whole trimmed text.
fn attempt_whole(raw: &str) -> Option<Value> {
    parse_object(raw.trim())
}
