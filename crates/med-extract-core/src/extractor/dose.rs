//! Dose parsing with OCR-specific denoising.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractor::normalize::{collapse_doubled, has_doubled};

/// How far past a mention the dose/scheme window extends.
pub const DOSE_WINDOW: usize = 220;

/// Numeric dose token: 1-4 digits, optional decimal part.
const NUM: &str = r"\d{1,4}(?:[.,]\d+)?";

/// Unit vocabulary. Milligram is OCR-tolerant ("mmg", "m gg", ...); the rest
/// are matched literally: gram, microgram, milliliter, drops, tablets,
/// capsules in their common abbreviated Spanish spellings.
const UNIT: &str = r"m+\s*g+|g|mcg|ug|ml|gota(?:s)?|comp(?:r?imidos?)?|cp|tab(?:s)?|caps?";

/// Number immediately adjacent to a unit.
static DOSE_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?P<num>{NUM})\s*(?P<unit>{UNIT})\b")).unwrap()
});

/// Looser form: up to 8 intervening non-word characters between number and unit.
static DOSE_NEAR_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?P<num>{NUM})(?:\s|[^\w]){{0,8}}(?P<unit>{UNIT})\b")).unwrap()
});

/// OCR-doubled milligram spellings, used as duplication evidence.
static DOUBLED_MG_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"m{2,}\s*g+|m+\s*g{2,}").unwrap());

/// Any OCR-fuzzy milligram spelling, collapsed to canonical "mg".
static MG_FUZZY: Lazy<Regex> = Lazy::new(|| Regex::new(r"m+\s*g+").unwrap());

/// Extract a normalized dose string from a match window, if present.
/// Only the first dose occurrence is used; the tight form wins over the loose
/// form.
pub fn parse_dose(window: &str) -> Option<String> {
    let caps = DOSE_WITH_UNIT
        .captures(window)
        .or_else(|| DOSE_NEAR_UNIT.captures(window))?;
    Some(normalize_dose(&caps["num"], &caps["unit"], window))
}

/// Span of the first dose match in the window, for scheme windowing.
pub fn first_dose_end(window: &str) -> Option<usize> {
    DOSE_WITH_UNIT
        .find(window)
        .or_else(|| DOSE_NEAR_UNIT.find(window))
        .map(|m| m.end())
}

/// Normalize a raw number/unit pair into the final dose string.
///
/// Doubled digits are collapsed only when the window shows independent
/// duplication evidence; collapsing unconditionally would corrupt genuine
/// multi-digit doses. The paired-digit shape "aabb" → "ab" covers a
/// singly-doubled two-digit dose.
fn normalize_dose(num: &str, unit: &str, context: &str) -> String {
    let mut number = num.to_string();
    if looks_like_ocr_duplication(context, unit) {
        number = collapse_doubled(&number, |c| c.is_ascii_digit());
    }
    let number = collapse_digit_pair_pairs(&number);
    let unit = MG_FUZZY.replace_all(unit, "mg");
    format!("{number}{unit}")
}

/// Whether the window carries evidence of OCR duplication: a doubled letter,
/// a doubled separator, or a doubled letter inside the matched unit.
fn looks_like_ocr_duplication(context: &str, unit_raw: &str) -> bool {
    has_doubled(context, |c| c.is_ascii_lowercase())
        || has_doubled(context, |c| matches!(c, ':' | '.' | '/' | '-'))
        || DOUBLED_MG_UNIT.is_match(unit_raw)
}

/// Collapse the 4-digit "aabb" doubled-pair shape into "ab" ("0011" → "01").
/// Anything else passes through unchanged.
fn collapse_digit_pair_pairs(num: &str) -> String {
    let chars: Vec<char> = num.chars().collect();
    if chars.len() == 4
        && chars.iter().all(char::is_ascii_digit)
        && chars[0] == chars[1]
        && chars[2] == chars[3]
    {
        return [chars[0], chars[2]].iter().collect();
    }
    num.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_number_and_unit() {
        assert_eq!(parse_dose("risperidona 2mg 0.0.1"), Some("2mg".into()));
        assert_eq!(parse_dose("quetiapina 100 mg 1/2"), Some("100mg".into()));
    }

    #[test]
    fn test_loose_window_between_number_and_unit() {
        assert_eq!(parse_dose("litio 300 - mg"), Some("300mg".into()));
    }

    #[test]
    fn test_no_dose_returns_none() {
        assert_eq!(parse_dose("clonazepam en la noche"), None);
        assert_eq!(parse_dose(""), None);
    }

    #[test]
    fn test_first_dose_wins() {
        assert_eq!(parse_dose("sertralina 50mg luego 100mg"), Some("50mg".into()));
    }

    #[test]
    fn test_doubled_unit_is_normalized_and_counts_as_evidence() {
        // "mgg" is itself the duplication evidence; "50" has no doubled digits
        // to collapse.
        assert_eq!(parse_dose("sertralina 50 mgg"), Some("50mg".into()));
        assert_eq!(parse_dose("sertralina 50 mmg"), Some("50mg".into()));
    }

    #[test]
    fn test_digit_collapse_requires_evidence() {
        // No duplication evidence anywhere: "11" is a genuine dose.
        assert_eq!(parse_dose("risperidona 11 mg"), Some("11mg".into()));
        // Doubled letters nearby gate the collapse on.
        assert_eq!(parse_dose("rissperidona 11 mg"), Some("1mg".into()));
    }

    #[test]
    fn test_paired_digit_shape_collapse() {
        assert_eq!(parse_dose("clonaazepam 0011 mg"), Some("01mg".into()));
        // Without the aabb shape the number is untouched.
        assert_eq!(parse_dose("quetiapina 1234 mg"), Some("1234mg".into()));
    }

    #[test]
    fn test_other_units_pass_through() {
        assert_eq!(parse_dose("haloperidol 10 gotas"), Some("10gotas".into()));
        assert_eq!(parse_dose("alprazolam 0.5 comp"), Some("0.5comp".into()));
    }

    #[test]
    fn test_first_dose_end() {
        let window = "risperidona 2mg 0.0.1";
        let end = first_dose_end(window).unwrap();
        assert_eq!(&window[..end], "risperidona 2mg");
        assert_eq!(first_dose_end("sin dosis"), None);
    }

    #[test]
    fn test_collapse_digit_pair_pairs() {
        assert_eq!(collapse_digit_pair_pairs("0011"), "01");
        assert_eq!(collapse_digit_pair_pairs("2255"), "25");
        assert_eq!(collapse_digit_pair_pairs("0101"), "0101");
        assert_eq!(collapse_digit_pair_pairs("11"), "11");
        assert_eq!(collapse_digit_pair_pairs(""), "");
    }
}
