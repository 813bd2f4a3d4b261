//! Dosing scheme parsing: dotted counts, fractions, and "o" alternatives.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractor::dose;
use crate::extractor::normalize::collapse_doubled;

/// Recognized shapes, most specific first: dotted count with trailing fraction
/// ("0.0.1/2"), plain dotted count ("0.0.1", 1-5 dots of single digits), and
/// simple fraction ("1/2"). Each may carry an "o <same shape>" alternative.
static SCHEME: Lazy<Regex> = Lazy::new(|| {
    let dotted = r"\d(?:\.\d){1,5}";
    let frac = r"\d\s*/\s*\d";
    Regex::new(&format!(
        r"(?:\b{dotted}\s*/\s*\d\b|\b{dotted}\b|\b{frac}\b)(?:\s*o\s*(?:{dotted}|{frac}))?"
    ))
    .unwrap()
});

/// Separator between a shape and its alternative clause.
static ALTERNATIVE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*o\s*").unwrap());

/// Extract deduplicated, normalized scheme tokens from a match window,
/// preserving first-seen order.
pub fn parse_schemes(window: &str) -> Vec<String> {
    let cleaned = denoise(window);
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for m in SCHEME.find_iter(&cleaned) {
        for part in ALTERNATIVE_SPLIT.split(m.as_str()) {
            let token = normalize_scheme(part);
            if !token.is_empty() && seen.insert(token.clone()) {
                out.push(token);
            }
        }
    }
    out
}

/// The slice of a dose window that scheme scanning looks at: after a colon if
/// present, otherwise past the dose match, otherwise the whole window.
pub fn scheme_window(window: &str) -> &str {
    if let Some(p) = window.find(':') {
        return &window[p + 1..];
    }
    match dose::first_dose_end(window) {
        Some(end) => &window[end..],
        None => window,
    }
}

/// Light unconditional denoising before scheme scanning: collapse doubled
/// separators and doubled digits. Unlike dose digits, scheme digits are
/// single-digit counts, so collapsing cannot corrupt them.
fn denoise(s: &str) -> String {
    let s = collapse_doubled(s, |c| matches!(c, ':' | '.' | '/' | '-'));
    collapse_doubled(&s, |c| c.is_ascii_digit())
}

/// Normalize one scheme token: strip whitespace, decimal commas to dots,
/// mixed runs of `.`/`/` down to their final character.
fn normalize_scheme(s: &str) -> String {
    let compact: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    collapse_separator_runs(&compact)
}

/// Collapse every run of 2+ separator characters (`.` or `/`, possibly mixed)
/// to the run's last character.
fn collapse_separator_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run_last: Option<char> = None;
    for c in s.chars() {
        if matches!(c, '.' | '/') {
            run_last = Some(c);
        } else {
            if let Some(sep) = run_last.take() {
                out.push(sep);
            }
            out.push(c);
        }
    }
    if let Some(sep) = run_last {
        out.push(sep);
    }
    out
}
