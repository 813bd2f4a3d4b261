//! Med-Extract Core Library
//!
//! Medication mention extraction from noisy OCR'd clinical notes.
//!
//! # Architecture
//!
//! ```text
//! OCR'd note text
//!       │
//!       ▼
//! Normalization (lowercase, strip diacritics, repair digit confusions,
//!                collapse character runs, whitespace)
//!       │
//!       ▼
//! Segmentation ("1. ... 2. ..." plan items, or a single item)
//!       │
//!       ▼
//! Alias Matching (exact word-bounded pass, then fuzzy pass over
//!                 collapsed tokens, per-item dedup by medication)
//!       │
//!       ▼
//! Dose / Scheme Parsing (bounded window after each match)
//!       │
//!       ▼
//! ExtractionRecord assembly → optional first-per-medication filter
//! ```
//!
//! # Core Principle
//!
//! **Extraction never fails.** Unmatched text yields an empty result list and
//! missing dose/scheme information yields `None` fields; errors are reserved
//! for the export layer.
//!
//! # Modules
//!
//! - [`models`]: Domain types (AliasDictionary, ExtractionRecord, etc.)
//! - [`extractor`]: The extraction pipeline
//! - [`export`]: Per-row report assembly with JSON/CSV encoding

pub mod export;
pub mod extractor;
pub mod models;

// Re-export commonly used types
pub use export::{ExportError, ExtractionReport, ReportRow};
pub use extractor::{first_per_medication, Extractor};
pub use models::{
    AliasDictionary, AliasIndex, CanonicalMedication, ConsultationRow, ExtractionRecord,
    MatchMethod, PlanItem,
};

use once_cell::sync::Lazy;

/// Shared extractor over the default clinical dictionary, built on first use.
static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(Extractor::new);

/// Extract medication mentions from a note using the default dictionary.
///
/// Convenience wrapper around [`Extractor::extract`]; build an [`Extractor`]
/// directly to use a custom dictionary.
pub fn extract(text: &str, include_span: bool) -> Vec<ExtractionRecord> {
    DEFAULT_EXTRACTOR.extract(text, include_span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_function_uses_default_dictionary() {
        let records = extract("clonazepam 2mg 0.0.1", false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].medication, "clonazepam");
    }
}
