//! Text normalization for noisy OCR'd clinical notes.
//!
//! Produces lowercase, diacritic-free ASCII text suitable for alias matching.
//! Every step is total and side-effect-free; the output alphabet is
//! `[a-z0-9 ./:-]`, so byte offsets equal character offsets downstream.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_KEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s./:-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize raw note text for matching.
///
/// Steps, in order: lowercase and strip diacritics; repair letter-surrounded
/// OCR digits (`0`→`o`, `1`→`l`, `5`→`s`); drop `¡!¿?`; collapse runs of 3+
/// identical characters to one (a single repeat survives, "mg" stays "mg");
/// replace everything outside `[a-z0-9 ./:-]` with a space; collapse
/// whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = strip_diacritics(&text.to_lowercase());
    let repaired = repair_digit_confusions(&lowered);
    let unpunct: String = repaired
        .chars()
        .filter(|c| !matches!(c, '¡' | '!' | '¿' | '?'))
        .collect();
    let collapsed = collapse_long_runs(&unpunct);
    let spaced = NON_KEPT.replace_all(&collapsed, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Strip combining diacritical marks, decomposing common precomposed Latin
/// letters first ("á"→"a", "ñ"→"n").
pub fn strip_diacritics(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            'ç' => Some('c'),
            c if is_combining_mark(c) => None,
            c => Some(c),
        })
        .collect()
}

/// Unicode category Mn ranges that occur in decomposed text.
const fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}')
}

/// Repair `0`/`1`/`5` misreads only when the digit sits between two letters.
/// Genuine dosage tokens are digit-surrounded and stay untouched. Context is
/// judged on the input text, so adjacent repairs do not feed each other.
fn repair_digit_confusions(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        let between_letters = i > 0
            && chars[i - 1].is_ascii_lowercase()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
        let repaired = match c {
            '0' if between_letters => 'o',
            '1' if between_letters => 'l',
            '5' if between_letters => 's',
            c => c,
        };
        out.push(repaired);
    }
    out
}

/// Collapse any run of 3 or more identical characters down to one.
/// Runs of exactly two survive.
fn collapse_long_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let keep = if run >= 3 { 1 } else { run };
        for _ in 0..keep {
            out.push(c);
        }
    }
    out
}

/// Collapse runs of two or more of the *same* character to one, but only for
/// characters the predicate accepts. Other runs pass through unchanged.
pub(crate) fn collapse_doubled(s: &str, matches: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let keep = if run >= 2 && matches(c) { 1 } else { run };
        for _ in 0..keep {
            out.push(c);
        }
    }
    out
}

/// Whether the text contains a run of two or more of the same character, for
/// characters the predicate accepts.
pub(crate) fn has_doubled(s: &str, matches: impl Fn(char) -> bool) -> bool {
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if prev == Some(c) && matches(c) {
            return true;
        }
        prev = Some(c);
    }
    false
}
