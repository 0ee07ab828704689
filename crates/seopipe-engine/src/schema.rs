//! Field-alias normalization for duck-typed LLM response shapes.
//!
//! Models return the same fact under drifting key names (`total_score` one
//! run, `overall_score` the next). Normalization is one explicit alias
//! table applied to the extracted object, not `or`-fallbacks scattered
//! through call sites.

use serde_json::Value;

/// One canonical key and the aliases accepted for it, in preference order.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

/// Alias table for the SEO scoring shape the surrounding system consumes.
pub const SCORE_ALIASES: &[AliasEntry] = &[
    AliasEntry {
        canonical: "total_score",
        aliases: &["overall_score", "score"],
    },
    AliasEntry {
        canonical: "max_score",
        aliases: &["maximum_score", "out_of"],
    },
    AliasEntry {
        canonical: "percentage",
        aliases: &["percent", "score_percentage"],
    },
    AliasEntry {
        canonical: "recommendations",
        aliases: &["suggestions", "improvements"],
    },
];

/// Rename accepted aliases to their canonical keys, top level only.
///
/// When the canonical key is already present it wins and nothing moves.
/// Otherwise the first present alias (table order) is renamed; remaining
/// aliases are left untouched. Non-objects pass through unchanged.
pub fn normalize_aliases(value: &mut Value, table: &[AliasEntry]) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    for entry in table {
        if obj.contains_key(entry.canonical) {
            continue;
        }
        for alias in entry.aliases {
            if let Some(v) = obj.remove(*alias) {
                obj.insert(entry.canonical.to_string(), v);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alias_is_renamed_to_canonical_key() {
        let mut v = json!({"overall_score": 87, "notes": "ok"});
        normalize_aliases(&mut v, SCORE_ALIASES);
        assert_eq!(v, json!({"total_score": 87, "notes": "ok"}));
    }

    #[test]
    fn canonical_key_wins_over_aliases() {
        let mut v = json!({"total_score": 90, "overall_score": 10});
        normalize_aliases(&mut v, SCORE_ALIASES);
        assert_eq!(v["total_score"], json!(90));
    }

    #[test]
    fn first_present_alias_in_table_order_is_used() {
        let mut v = json!({"score": 70, "suggestions": ["add faq"]});
        normalize_aliases(&mut v, SCORE_ALIASES);
        assert_eq!(v["total_score"], json!(70));
        assert_eq!(v["recommendations"], json!(["add faq"]));
    }

    #[test]
    fn non_objects_pass_through_unchanged() {
        let mut v = json!([1, 2, 3]);
        normalize_aliases(&mut v, SCORE_ALIASES);
        assert_eq!(v, json!([1, 2, 3]));
    }

    #[test]
    fn unrelated_keys_are_untouched() {
        let mut v = json!({"headline": "x", "total_score": 1});
        normalize_aliases(&mut v, SCORE_ALIASES);
        assert_eq!(v, json!({"headline": "x", "total_score": 1}));
    }
}
