//! Alias matching: exact alternation pass plus an OCR fuzzy fallback.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use strsim::normalized_levenshtein;
use tracing::trace;

use crate::extractor::normalize::collapse_doubled;
use crate::models::{AliasIndex, MatchCandidate, MatchMethod, PlanItem};

/// Alphanumeric tokens considered for the fuzzy fallback.
static FUZZY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z0-9]{5,40}\b").unwrap());

/// Minimum edit similarity (0-100 scale) to accept a fuzzy candidate.
const FUZZY_SCORE_CUTOFF: f64 = 90.0;

/// Minimum ratio of collapsed-token length to candidate-alias length.
/// Rejects spurious matches against much longer aliases.
const MIN_LENGTH_RATIO: f64 = 0.6;

/// Minimum length of a collapsed token worth fuzzy-matching.
const MIN_COLLAPSED_LEN: usize = 5;

/// Find all medication mentions in one plan item, ordered by position, with at
/// most one candidate per canonical medication.
///
/// Pass 1 scans the exact alias alternation left to right; pass 2 retries
/// tokens whose doubled letters the exact pass could not see. Fuzzy hits skip
/// canonicals already found, and the first exact hit per canonical wins.
pub fn find_candidates(index: &AliasIndex, item: &PlanItem) -> Vec<MatchCandidate> {
    let mut found: Vec<MatchCandidate> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for m in index.alias_pattern().find_iter(&item.text) {
        let Some(canonical) = index.canonical_for(m.as_str()) else {
            continue;
        };
        if !seen.insert(canonical) {
            continue;
        }
        found.push(MatchCandidate {
            canonical: canonical.to_string(),
            alias: m.as_str().to_string(),
            start: item.start + m.start(),
            end: item.start + m.end(),
            method: MatchMethod::Exact,
            ocr_alias: None,
        });
    }

    for tm in FUZZY_TOKEN.find_iter(&item.text) {
        let token = tm.as_str();
        let collapsed = collapse_doubled(token, |c| c.is_ascii_lowercase());
        if collapsed == token || collapsed.len() < MIN_COLLAPSED_LEN {
            continue;
        }
        let Some((alias, score)) = best_fuzzy_alias(index, &collapsed) else {
            continue;
        };
        if score < FUZZY_SCORE_CUTOFF {
            continue;
        }
        if (collapsed.len() as f64) / (alias.len() as f64) < MIN_LENGTH_RATIO {
            continue;
        }
        if collapsed.chars().last() != alias.chars().last() {
            continue;
        }
        let Some(canonical) = index.canonical_for(alias) else {
            continue;
        };
        if !seen.insert(canonical) {
            continue;
        }
        trace!(token, alias, score, "accepted fuzzy alias match");
        found.push(MatchCandidate {
            canonical: canonical.to_string(),
            alias: alias.to_string(),
            start: item.start + tm.start(),
            end: item.start + tm.end(),
            method: MatchMethod::Fuzzy,
            ocr_alias: Some(token.to_string()),
        });
    }

    found.sort_by_key(|c| c.start);
    found
}

/// Best-scoring alias for a collapsed token, drawn from the first-character
/// bucket (or the full list when the bucket is empty).
fn best_fuzzy_alias<'a>(index: &'a AliasIndex, collapsed: &str) -> Option<(&'a str, f64)> {
    let first = collapsed.chars().next()?;
    index
        .fuzzy_pool(first)
        .iter()
        .map(|alias| {
            (
                alias.as_str(),
                normalized_levenshtein(collapsed, alias) * 100.0,
            )
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
