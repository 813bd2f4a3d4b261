//! Medication mention extraction pipeline.
//!
//! Pipeline: Normalization → Segmentation → Alias Matching → Dose/Scheme
//! Parsing → Assembly.

mod dose;
mod matcher;
pub mod normalize;
mod scheme;
mod segment;

use std::collections::HashSet;

use tracing::debug;

use crate::models::{AliasDictionary, AliasIndex, ExtractionRecord};

/// Length of the context string attached when spans are requested.
const CONTEXT_LEN: usize = 180;

/// The extraction engine.
///
/// Holds the flattened alias index, built once from an immutable dictionary.
/// Extraction is pure and synchronous; an `Extractor` can be shared freely
/// across threads.
#[derive(Debug)]
pub struct Extractor {
    index: AliasIndex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Build an extractor over the default clinical dictionary.
    pub fn new() -> Self {
        Self::with_dictionary(&AliasDictionary::default())
    }

    /// Build an extractor over a custom dictionary.
    pub fn with_dictionary(dictionary: &AliasDictionary) -> Self {
        Self {
            index: AliasIndex::build(dictionary),
        }
    }

    /// Extract all medication mentions from a free-text note.
    ///
    /// Never fails: text without matches yields an empty list, and absent
    /// dose/scheme information yields `None` fields. With `include_span` each
    /// record also carries its `[start, end)` offsets and a short context
    /// string; offsets refer to the normalized text.
    pub fn extract(&self, text: &str, include_span: bool) -> Vec<ExtractionRecord> {
        let normalized = normalize::normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let items = segment::segment(&normalized);
        let mut records: Vec<ExtractionRecord> = Vec::new();

        for item in &items {
            for candidate in matcher::find_candidates(&self.index, item) {
                let local = candidate.start - item.start;
                let window_end = (local + dose::DOSE_WINDOW).min(item.text.len());
                let window = &item.text[local..window_end];

                let dose = dose::parse_dose(window);
                let schemes = scheme::parse_schemes(scheme::scheme_window(window));
                let scheme = if schemes.is_empty() {
                    None
                } else {
                    Some(schemes.join(";"))
                };

                records.push(ExtractionRecord {
                    medication: candidate.canonical,
                    alias: candidate.alias,
                    ocr_alias: candidate.ocr_alias,
                    dose,
                    scheme,
                    position: candidate.start,
                    span: include_span.then_some([candidate.start, candidate.end]),
                    context: include_span
                        .then(|| window[..window.len().min(CONTEXT_LEN)].to_string()),
                });
            }
        }

        debug!(
            items = items.len(),
            records = records.len(),
            "extracted medication mentions"
        );
        records
    }
}

/// Keep only the first mention of each medication across a whole result list.
///
/// Records are stable-sorted by position; the survivor's scheme is truncated
/// to its first semicolon-separated alternative. Dose is deliberately left
/// untouched.
pub fn first_per_medication(records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
    let mut sorted = records;
    sorted.sort_by_key(|r| r.position);

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<ExtractionRecord> = Vec::new();
    for mut record in sorted {
        if !seen.insert(record.medication.clone()) {
            continue;
        }
        record.scheme = record
            .scheme
            .and_then(|s| s.split(';').next().map(str::to_string));
        out.push(record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new()
    }

    #[test]
    fn test_two_numbered_items_end_to_end() {
        let records = extractor().extract("1. risperidona 2mg 0.0.1 2. quetiapina 100 mg 1/2", false);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].medication, "risperidona");
        assert_eq!(records[0].dose.as_deref(), Some("2mg"));
        assert_eq!(records[0].scheme.as_deref(), Some("0.0.1"));
        assert_eq!(records[1].medication, "quetiapina");
        assert_eq!(records[1].dose.as_deref(), Some("100mg"));
        assert_eq!(records[1].scheme.as_deref(), Some("1/2"));
        assert!(records[0].position < records[1].position);
    }

    #[test]
    fn test_items_do_not_bleed_into_each_other() {
        let records = extractor().extract("1. clonazepam 2. diazepam 10mg", false);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].medication, "clonazepam");
        assert_eq!(records[0].dose, None);
        assert_eq!(records[1].medication, "diazepam");
        assert_eq!(records[1].dose.as_deref(), Some("10mg"));
    }

    #[test]
    fn test_no_match_yields_empty() {
        assert!(extractor().extract("paciente estable, sin cambios", false).is_empty());
        assert!(extractor().extract("", false).is_empty());
    }

    #[test]
    fn test_span_and_context_only_when_requested() {
        let ext = extractor();

        let without = ext.extract("clonazepam 2mg", false);
        assert_eq!(without[0].span, None);
        assert_eq!(without[0].context, None);

        let with = ext.extract("clonazepam 2mg", true);
        assert_eq!(with[0].span, Some([0, 10]));
        assert_eq!(with[0].context.as_deref(), Some("clonazepam 2mg"));
    }

    #[test]
    fn test_every_canonical_name_extracts_itself() {
        let ext = extractor();
        for med in AliasDictionary::default().medications() {
            let records = ext.extract(&med.name, false);
            assert_eq!(records.len(), 1, "expected one record for {}", med.name);
            assert_eq!(records[0].medication, med.name);
            assert_eq!(records[0].dose, None, "unexpected dose for {}", med.name);
            assert_eq!(records[0].scheme, None, "unexpected scheme for {}", med.name);
        }
    }

    #[test]
    fn test_no_duplicate_canonical_within_item() {
        let records = extractor().extract("clonazepam 2mg y cnz en la noche", false);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_scheme_with_alternative_is_semicolon_joined() {
        let records = extractor().extract("clonazepam 2 mg: 0.0.1 o 1/2", false);
        assert_eq!(records[0].dose.as_deref(), Some("2mg"));
        assert_eq!(records[0].scheme.as_deref(), Some("0.0.1;1/2"));
    }

    #[test]
    fn test_fuzzy_record_carries_raw_token() {
        let records = extractor().extract("toma rrissperidonna 3mg 1/2", false);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].medication, "risperidona");
        assert_eq!(records[0].ocr_alias.as_deref(), Some("rrissperidonna"));
        assert_eq!(records[0].dose.as_deref(), Some("3mg"));
    }

    #[test]
    fn test_first_per_medication_keeps_smallest_position() {
        let ext = extractor();
        let records = ext.extract(
            "1. clonazepam 2mg 0.0.1 o 1/2 2. clonazepam 1mg 3. sertralina 50mg",
            false,
        );
        assert_eq!(records.len(), 3);

        let filtered = first_per_medication(records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].medication, "clonazepam");
        assert_eq!(filtered[0].dose.as_deref(), Some("2mg"));
        // Scheme truncated to the first alternative.
        assert_eq!(filtered[0].scheme.as_deref(), Some("0.0.1"));
        assert_eq!(filtered[1].medication, "sertralina");
    }

    #[test]
    fn test_first_per_medication_sorts_across_items() {
        let mut records = extractor().extract("1. quetiapina 2. sertralina", false);
        // Feed the filter out of order; it must sort by position first.
        records.reverse();
        let filtered = first_per_medication(records);
        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].position < filtered[1].position);
    }

    #[test]
    fn test_match_method_distinction() {
        let ext = extractor();
        let exact = ext.extract("sertralina 50mg", false);
        assert_eq!(exact[0].ocr_alias, None);

        let fuzzy = ext.extract("serttralinna 50mg", false);
        assert_eq!(fuzzy[0].ocr_alias.as_deref(), Some("serttralinna"));
    }
}
