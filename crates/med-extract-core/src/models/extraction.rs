//! Types flowing through the extraction pipeline.

use serde::{Deserialize, Serialize};

/// How a mention was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Word-bounded alias alternation hit.
    Exact,
    /// OCR-doubled-letter fallback accepted above the similarity threshold.
    Fuzzy,
}

/// One entry of an enumerated treatment plan, or the whole note if unnumbered.
///
/// Offsets are absolute within the normalized text. Items are created once per
/// normalization pass, read only, and discarded after processing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanItem {
    /// Item number, when the note enumerates its plan.
    pub number: Option<u32>,
    /// The item body.
    pub text: String,
    /// Absolute start offset of the body in the normalized text.
    pub start: usize,
    /// Absolute end offset of the body.
    pub end: usize,
}

/// One located mention inside a [`PlanItem`].
///
/// Consumed immediately by dose/scheme enrichment, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// Canonical medication name.
    pub canonical: String,
    /// The alias text that matched.
    pub alias: String,
    /// Absolute start offset in the normalized text.
    pub start: usize,
    /// Absolute end offset.
    pub end: usize,
    /// How the mention was found.
    pub method: MatchMethod,
    /// For fuzzy matches, the original noisy token before letter collapsing.
    pub ocr_alias: Option<String>,
}

/// The final output unit: one medication mention with its parsed dose and
/// dosing scheme. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Canonical medication name.
    pub medication: String,
    /// The alias that matched.
    pub alias: String,
    /// The raw OCR token, when the match came from the fuzzy fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_alias: Option<String>,
    /// Normalized dose string, e.g. "2mg".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<String>,
    /// Dosing scheme tokens, semicolon-joined when multiple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Absolute position of the mention in the normalized text.
    pub position: usize,
    /// `[start, end)` offsets, present only when spans were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[usize; 2]>,
    /// Short post-match context, present only when spans were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let record = ExtractionRecord {
            medication: "clonazepam".into(),
            alias: "cnz".into(),
            ocr_alias: None,
            dose: Some("2mg".into()),
            scheme: None,
            position: 4,
            span: None,
            context: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"dose\":\"2mg\""));
        assert!(!json.contains("span"));
        assert!(!json.contains("ocr_alias"));
    }

    #[test]
    fn test_record_round_trip_with_span() {
        let record = ExtractionRecord {
            medication: "olanzapina".into(),
            alias: "olz".into(),
            ocr_alias: Some("oollzz".into()),
            dose: None,
            scheme: Some("0.0.1".into()),
            position: 10,
            span: Some([10, 16]),
            context: Some("olz 0.0.1".into()),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: ExtractionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
