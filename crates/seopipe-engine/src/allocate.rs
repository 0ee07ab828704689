//! Tiered keyword-mention budgeting over a document outline.
//!
//! Given a total word count, an outline, a keyword, and a target density,
//! produce a per-tier checklist of how many times the keyword should appear
//! where. Tiers:
//! - Tier 1: title/meta (fixed constant)
//! - Tier 2: a priority-ordered subset of body headings
//! - Tier 3: body sections, proportional to word-count weight
//! - Tier 4: FAQ entries, at most 2 mentions each
//!
//! Per-tier rounding can drift on small documents, so a reconciliation pass
//! adjusts the largest body section(s) until the total is within tolerance
//! of the density-derived target. Callers always get a best-effort result;
//! tolerance breaches surface as warning codes, never as errors.

use seopipe_core::{
    AllocationRequest, Error, MentionDistribution, MentionTask, Result, Section, SectionKind,
    TaskAllocation, Tier, TierAllocation,
};

/// Mentions reserved for the title/meta tier: one for the title, one for
/// the meta description.
const TITLE_META_MENTIONS: u64 = 2;

/// Share of the post-Tier-1 budget that goes to headings.
const HEADINGS_SHARE: f64 = 0.12;

/// Share of the post-Tier-1 budget that goes to FAQ entries.
const FAQ_SHARE: f64 = 0.20;

/// Max mentions per FAQ entry.
const FAQ_MENTIONS_PER_ENTRY: u64 = 2;

/// Body sections below this expected word count get no minimum-mention floor.
const MIN_SECTION_WORDS: u64 = 100;

/// Allowed deviation between the allocated total and the density-derived
/// target.
const TOLERANCE: u64 = 3;

fn round_half_up(x: f64) -> u64 {
    (x + 0.5).floor() as u64
}

/// Compute the keyword-mention budget for one keyword.
///
/// Total over well-formed input: degenerate outlines produce a zeroed
/// allocation, not an error. Fails only on structurally invalid
/// configuration (empty keyword, negative or non-finite target density).
pub fn allocate(req: &AllocationRequest) -> Result<TaskAllocation> {
    if !req.target_density.is_finite() || req.target_density < 0.0 {
        return Err(Error::InvalidInput(format!(
            "target_density must be a non-negative finite percentage, got {}",
            req.target_density
        )));
    }
    if crate::textprep::tokenize(&req.keyword).is_empty() {
        return Err(Error::InvalidInput(format!(
            "keyword {:?} contains no words",
            req.keyword
        )));
    }

    let mut warnings: Vec<&'static str> = Vec::new();
    let total_target = round_half_up(req.total_words as f64 * req.target_density / 100.0);

    if req.sections.is_empty() || req.total_words == 0 {
        if req.sections.is_empty() {
            warnings.push("degenerate_outline");
        }
        let tier1 = if total_target > 0 { TITLE_META_MENTIONS } else { 0 };
        return Ok(finish(req, total_target, tier1_items(tier1), Vec::new(), Vec::new(), Vec::new(), warnings));
    }

    if total_target == 0 {
        warnings.push("zero_target");
        return Ok(finish(req, 0, Vec::new(), Vec::new(), Vec::new(), Vec::new(), warnings));
    }

    let tier1_total = TITLE_META_MENTIONS;
    let remaining = total_target.saturating_sub(tier1_total);

    let bodies: Vec<(usize, &Section)> = req
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SectionKind::Body)
        .collect();
    let faqs: Vec<(usize, &Section)> = req
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SectionKind::Faq)
        .collect();

    // Tier 2: top-priority headings, one mention each.
    let tier2_items = allocate_headings(&bodies, remaining, &mut warnings);
    let tier2_total: u64 = tier2_items.iter().map(|t| t.count).sum();

    // Tier 4 before Tier 3: body gets "what's left", per the working rule.
    let tier4_items = allocate_faq(&faqs, remaining, &mut warnings);
    let tier4_total: u64 = tier4_items.iter().map(|t| t.count).sum();

    let tier3_budget = remaining.saturating_sub(tier2_total + tier4_total);
    let mut body_counts = allocate_body(&bodies, tier3_budget, &mut warnings);

    // Reconciliation: per-tier rounding drifts on small documents.
    let fixed = tier1_total + tier2_total + tier4_total;
    reconcile(&mut body_counts, &bodies, fixed, total_target, &mut warnings);

    let tier3_items: Vec<MentionTask> = body_counts
        .iter()
        .zip(bodies.iter())
        .filter(|(count, _)| **count > 0)
        .map(|(count, (_, s))| MentionTask {
            slot: s.name.clone(),
            heading: Some(s.heading.clone()),
            count: *count,
            distribution: MentionDistribution::for_count(*count),
        })
        .collect();

    Ok(finish(
        req,
        total_target,
        tier1_items(tier1_total),
        tier2_items,
        tier3_items,
        tier4_items,
        warnings,
    ))
}

fn tier1_items(total: u64) -> Vec<MentionTask> {
    if total == 0 {
        return Vec::new();
    }
    ["title", "meta_description"]
        .into_iter()
        .map(|slot| MentionTask {
            slot: slot.to_string(),
            heading: None,
            count: 1,
            distribution: MentionDistribution::for_count(1),
        })
        .collect()
}

fn allocate_headings(
    bodies: &[(usize, &Section)],
    remaining: u64,
    warnings: &mut Vec<&'static str>,
) -> Vec<MentionTask> {
    if remaining == 0 {
        return Vec::new();
    }
    // ~12% of the remaining budget, but always at least one heading.
    let budget = round_half_up(remaining as f64 * HEADINGS_SHARE).max(1);

    // Priority ascending, None after Some, document order breaks ties.
    let mut ranked: Vec<&(usize, &Section)> = bodies.iter().collect();
    ranked.sort_by_key(|(idx, s)| (s.priority.is_none(), s.priority, *idx));

    if (budget as usize) > ranked.len() {
        warnings.push("tier2_budget_unfilled");
    }

    ranked
        .into_iter()
        .take(budget as usize)
        .map(|(_, s)| MentionTask {
            slot: s.name.clone(),
            heading: Some(s.heading.clone()),
            count: 1,
            distribution: MentionDistribution::for_count(1),
        })
        .collect()
}

fn allocate_faq(
    faqs: &[(usize, &Section)],
    remaining: u64,
    warnings: &mut Vec<&'static str>,
) -> Vec<MentionTask> {
    let budget =
        round_half_up(remaining as f64 * FAQ_SHARE).min(FAQ_MENTIONS_PER_ENTRY * faqs.len() as u64);
    if budget == 0 {
        if faqs.is_empty() && remaining > 0 {
            warnings.push("no_faq_sections");
        }
        return Vec::new();
    }

    // Round-robin in document order: one mention per entry, then a second.
    let mut counts = vec![0u64; faqs.len()];
    let mut left = budget;
    'outer: for _pass in 0..FAQ_MENTIONS_PER_ENTRY {
        for c in counts.iter_mut() {
            if left == 0 {
                break 'outer;
            }
            *c += 1;
            left -= 1;
        }
    }

    counts
        .iter()
        .zip(faqs.iter())
        .filter(|(count, _)| **count > 0)
        .map(|(count, (_, s))| MentionTask {
            slot: s.name.clone(),
            heading: Some(s.heading.clone()),
            count: *count,
            distribution: MentionDistribution::for_count(*count),
        })
        .collect()
}

fn allocate_body(
    bodies: &[(usize, &Section)],
    budget: u64,
    warnings: &mut Vec<&'static str>,
) -> Vec<u64> {
    let weights: Vec<u64> = bodies.iter().map(|(_, s)| s.weight()).collect();
    let total_weight: u64 = weights.iter().sum();

    if bodies.is_empty() {
        return Vec::new();
    }
    if total_weight == 0 {
        // No usable weights: park the whole budget on the first section so
        // reconciliation still has something to work with.
        warnings.push("zero_weight_outline");
        let mut counts = vec![0u64; bodies.len()];
        counts[0] = budget;
        return counts;
    }

    weights
        .iter()
        .map(|w| {
            let proportional = round_half_up(budget as f64 * *w as f64 / total_weight as f64);
            if proportional == 0 && *w >= MIN_SECTION_WORDS && budget > 0 {
                1
            } else {
                proportional
            }
        })
        .collect()
}

/// Adjust the largest body section(s) up or down until the allocated total
/// is within `TOLERANCE` of `total_target`.
fn reconcile(
    body_counts: &mut [u64],
    bodies: &[(usize, &Section)],
    fixed: u64,
    total_target: u64,
    warnings: &mut Vec<&'static str>,
) {
    let mut adjusted = false;
    loop {
        let sum = fixed + body_counts.iter().sum::<u64>();
        let diff = sum as i64 - total_target as i64;
        if diff.unsigned_abs() <= TOLERANCE {
            break;
        }
        if diff > 0 {
            // Over-allocated: take from the section with the largest count.
            let Some(victim) = body_counts
                .iter()
                .enumerate()
                .filter(|(_, c)| **c > 0)
                .max_by_key(|(i, c)| (**c, std::cmp::Reverse(*i)))
                .map(|(i, _)| i)
            else {
                warnings.push("reconciliation_incomplete");
                break;
            };
            let excess = diff.unsigned_abs() - TOLERANCE;
            body_counts[victim] = body_counts[victim].saturating_sub(excess);
        } else {
            // Under-allocated: add to the section with the largest weight.
            let Some(target) = bodies
                .iter()
                .enumerate()
                .max_by_key(|(i, (_, s))| (s.weight(), std::cmp::Reverse(*i)))
                .map(|(i, _)| i)
            else {
                warnings.push("reconciliation_incomplete");
                break;
            };
            body_counts[target] += diff.unsigned_abs() - TOLERANCE;
        }
        adjusted = true;
    }
    if adjusted {
        warnings.push("reconciliation_adjusted");
    }
}

fn finish(
    req: &AllocationRequest,
    total_target: u64,
    tier1: Vec<MentionTask>,
    tier2: Vec<MentionTask>,
    tier3: Vec<MentionTask>,
    tier4: Vec<MentionTask>,
    warnings: Vec<&'static str>,
) -> TaskAllocation {
    let tiers: Vec<TierAllocation> = [
        (Tier::TitleMeta, tier1),
        (Tier::Headings, tier2),
        (Tier::Body, tier3),
        (Tier::Faq, tier4),
    ]
    .into_iter()
    .map(|(tier, items)| TierAllocation {
        tier,
        total: items.iter().map(|t| t.count).sum(),
        items,
    })
    .collect();
    let total_allocated = tiers.iter().map(|t| t.total).sum();

    TaskAllocation {
        keyword: req.keyword.clone(),
        target_density: req.target_density,
        total_target,
        total_allocated,
        tiers,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body(name: &str, min: u64, max: u64, priority: Option<u32>) -> Section {
        Section {
            name: name.to_string(),
            heading: format!("About {name}"),
            kind: SectionKind::Body,
            min_words: min,
            max_words: max,
            priority,
        }
    }

    fn faq(name: &str) -> Section {
        Section {
            name: name.to_string(),
            heading: format!("{name}?"),
            kind: SectionKind::Faq,
            min_words: 40,
            max_words: 80,
            priority: None,
        }
    }

    fn typical_request() -> AllocationRequest {
        AllocationRequest {
            total_words: 2000,
            sections: vec![
                body("intro", 100, 200, Some(0)),
                body("features", 300, 500, Some(1)),
                body("pricing", 200, 400, None),
                body("conclusion", 100, 200, Some(2)),
                faq("faq-1"),
                faq("faq-2"),
                faq("faq-3"),
            ],
            keyword: "video generator".to_string(),
            target_density: 1.5,
        }
    }

    #[test]
    fn allocation_total_stays_within_tolerance_of_target() {
        let req = typical_request();
        let a = allocate(&req).unwrap();
        // 2000 * 1.5% = 30.
        assert_eq!(a.total_target, 30);
        let diff = a.total_allocated.abs_diff(a.total_target);
        assert!(diff <= 3, "diff={diff}, allocation={a:?}");
    }

    #[test]
    fn title_meta_tier_is_fixed_at_two() {
        let a = allocate(&typical_request()).unwrap();
        let t1 = a.tier(Tier::TitleMeta).unwrap();
        assert_eq!(t1.total, 2);
        let slots: Vec<&str> = t1.items.iter().map(|i| i.slot.as_str()).collect();
        assert_eq!(slots, vec!["title", "meta_description"]);
    }

    #[test]
    fn headings_tier_selects_highest_priority_first() {
        let a = allocate(&typical_request()).unwrap();
        let t2 = a.tier(Tier::Headings).unwrap();
        assert!(t2.total >= 1);
        // Priority 0 ("intro") must be the first selected heading.
        assert_eq!(t2.items[0].slot, "intro");
        assert!(t2.items.iter().all(|i| i.count == 1));
    }

    #[test]
    fn body_tier_is_proportional_to_section_weight() {
        let a = allocate(&typical_request()).unwrap();
        let t3 = a.tier(Tier::Body).unwrap();
        let features = t3.items.iter().find(|i| i.slot == "features").unwrap();
        let intro = t3.items.iter().find(|i| i.slot == "intro").unwrap();
        // 400 expected words vs 150: features must carry more mentions.
        assert!(features.count > intro.count, "t3={t3:?}");
    }

    #[test]
    fn faq_tier_caps_mentions_per_entry() {
        let a = allocate(&typical_request()).unwrap();
        let t4 = a.tier(Tier::Faq).unwrap();
        assert!(t4.items.iter().all(|i| i.count <= 2), "t4={t4:?}");
    }

    #[test]
    fn empty_outline_returns_zeroed_tiers_with_fixed_title_meta() {
        let req = AllocationRequest {
            total_words: 1000,
            sections: Vec::new(),
            keyword: "video".to_string(),
            target_density: 2.0,
        };
        let a = allocate(&req).unwrap();
        assert_eq!(a.tier(Tier::TitleMeta).unwrap().total, 2);
        assert_eq!(a.tier(Tier::Headings).unwrap().total, 0);
        assert_eq!(a.tier(Tier::Body).unwrap().total, 0);
        assert_eq!(a.tier(Tier::Faq).unwrap().total, 0);
        assert!(a.warnings.contains(&"degenerate_outline"));
    }

    #[test]
    fn zero_words_or_zero_target_zeroes_everything() {
        let mut req = typical_request();
        req.total_words = 0;
        let a = allocate(&req).unwrap();
        assert_eq!(a.total_target, 0);
        assert_eq!(a.total_allocated, 0);

        let mut req = typical_request();
        req.target_density = 0.0;
        let a = allocate(&req).unwrap();
        assert_eq!(a.total_target, 0);
        assert_eq!(a.total_allocated, 0);
        assert!(a.warnings.contains(&"zero_target"));
    }

    #[test]
    fn negative_or_non_finite_density_is_invalid_input() {
        let mut req = typical_request();
        req.target_density = -1.0;
        assert!(matches!(allocate(&req), Err(Error::InvalidInput(_))));

        let mut req = typical_request();
        req.target_density = f64::NAN;
        assert!(matches!(allocate(&req), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn empty_keyword_is_invalid_input() {
        let mut req = typical_request();
        req.keyword = "  ".to_string();
        assert!(matches!(allocate(&req), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn small_document_stays_within_tolerance_via_reconciliation() {
        // 200 words at 1% -> target 2, below the fixed Tier 1 constant.
        let req = AllocationRequest {
            total_words: 200,
            sections: vec![body("only", 150, 250, None)],
            keyword: "video".to_string(),
            target_density: 1.0,
        };
        let a = allocate(&req).unwrap();
        assert_eq!(a.total_target, 2);
        assert!(a.total_allocated.abs_diff(a.total_target) <= 3, "{a:?}");
    }

    #[test]
    fn faq_only_outline_reports_incomplete_reconciliation() {
        // Nothing to grow: Tier 3 has no sections and Tier 4 is capped at
        // 2 per entry, so a large target cannot be met.
        let req = AllocationRequest {
            total_words: 5000,
            sections: vec![faq("q1"), faq("q2")],
            keyword: "video".to_string(),
            target_density: 2.0,
        };
        let a = allocate(&req).unwrap();
        assert!(a.total_allocated < a.total_target);
        assert!(a.warnings.contains(&"reconciliation_incomplete"), "{a:?}");
    }

    #[test]
    fn within_section_distribution_anchors_first_and_last_sentence() {
        for (n, first, middle, last) in
            [(0, 0, 0, 0), (1, 1, 0, 0), (2, 1, 0, 1), (5, 1, 3, 1)]
        {
            let d = MentionDistribution::for_count(n);
            assert_eq!(d.first_sentence, first, "n={n}");
            assert_eq!(d.middle_paragraphs, middle, "n={n}");
            assert_eq!(d.last_sentence, last, "n={n}");
            assert_eq!(d.total(), n, "n={n}");
        }
    }

    #[test]
    fn tier_totals_match_item_sums_and_overall_total() {
        let a = allocate(&typical_request()).unwrap();
        for t in &a.tiers {
            let items: u64 = t.items.iter().map(|i| i.count).sum();
            assert_eq!(t.total, items, "tier {:?}", t.tier);
        }
        let total: u64 = a.tiers.iter().map(|t| t.total).sum();
        assert_eq!(a.total_allocated, total);
    }

    proptest! {
        #[test]
        fn allocation_with_body_sections_is_within_tolerance(
            total_words in 1u64..20_000,
            density in 0.1f64..3.0,
            body_bounds in prop::collection::vec((50u64..400, 0u64..400), 1..8),
            faq_count in 0usize..6,
        ) {
            let mut sections: Vec<Section> = body_bounds
                .iter()
                .enumerate()
                .map(|(i, (min, extra))| Section {
                    name: format!("s{i}"),
                    heading: format!("Heading {i}"),
                    kind: SectionKind::Body,
                    min_words: *min,
                    max_words: min + extra,
                    priority: None,
                })
                .collect();
            for i in 0..faq_count {
                sections.push(Section {
                    name: format!("faq{i}"),
                    heading: format!("Question {i}?"),
                    kind: SectionKind::Faq,
                    min_words: 40,
                    max_words: 80,
                    priority: None,
                });
            }
            let req = AllocationRequest {
                total_words,
                sections,
                keyword: "video generator".to_string(),
                target_density: density,
            };

            let a = allocate(&req).unwrap();
            let expected =
                (total_words as f64 * density / 100.0 + 0.5).floor() as u64;
            prop_assert_eq!(a.total_target, expected);
            prop_assert!(
                a.total_allocated.abs_diff(a.total_target) <= 3,
                "target={} allocated={} warnings={:?}",
                a.total_target, a.total_allocated, a.warnings
            );
        }

        #[test]
        fn allocation_is_deterministic(
            total_words in 1u64..10_000,
            density in 0.1f64..3.0,
        ) {
            let req = AllocationRequest {
                total_words,
                sections: vec![
                    Section {
                        name: "a".into(),
                        heading: "A".into(),
                        kind: SectionKind::Body,
                        min_words: 100,
                        max_words: 300,
                        priority: Some(1),
                    },
                    Section {
                        name: "f".into(),
                        heading: "F?".into(),
                        kind: SectionKind::Faq,
                        min_words: 40,
                        max_words: 80,
                        priority: None,
                    },
                ],
                keyword: "video".to_string(),
                target_density: density,
            };
            let a = serde_json::to_string(&allocate(&req).unwrap()).unwrap();
            let b = serde_json::to_string(&allocate(&req).unwrap()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
