//! Per-row extraction reports with JSON and CSV encoding.
//!
//! Each consultation row is run through the extractor once; every resulting
//! mention becomes one flat report row carrying the consultation columns
//! alongside the extraction columns, in a fixed order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::{first_per_medication, Extractor};
use crate::models::{ConsultationRow, ExtractionRecord};

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One flat report row: consultation columns plus one extracted mention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    /// Patient identifier.
    pub patient_id: String,
    /// Consultation date.
    pub date: String,
    /// Optional risk label.
    pub risk: Option<String>,
    /// The original note text.
    pub note: String,
    /// Canonical medication name.
    pub medication: String,
    /// The alias that matched.
    pub alias: String,
    /// Raw OCR token for fuzzy matches.
    pub ocr_alias: Option<String>,
    /// Normalized dose string.
    pub dose: Option<String>,
    /// Semicolon-joined scheme tokens.
    pub scheme: Option<String>,
    /// Mention position in the normalized note.
    pub position: usize,
    /// `[start, end)` span, when spans were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[usize; 2]>,
    /// Post-match context, when spans were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ReportRow {
    fn from_parts(row: &ConsultationRow, record: ExtractionRecord) -> Self {
        Self {
            patient_id: row.patient_id.clone(),
            date: row.date.clone(),
            risk: row.risk.clone(),
            note: row.note.clone(),
            medication: record.medication,
            alias: record.alias,
            ocr_alias: record.ocr_alias,
            dose: record.dose,
            scheme: record.scheme,
            position: record.position,
            span: record.span,
            context: record.context,
        }
    }
}

/// Run the extractor over every consultation row and flatten the results.
///
/// With `first_per_med` the first-mention-per-medication filter is applied to
/// each row's extractions before flattening.
pub fn process_rows(
    extractor: &Extractor,
    rows: &[ConsultationRow],
    include_span: bool,
    first_per_med: bool,
) -> Vec<ReportRow> {
    let mut out: Vec<ReportRow> = Vec::new();
    for row in rows {
        let mut records = extractor.extract(&row.note, include_span);
        if first_per_med {
            records = first_per_medication(records);
        }
        for record in records {
            out.push(ReportRow::from_parts(row, record));
        }
    }
    out
}

/// A complete extraction report ready for encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Flattened report rows.
    pub rows: Vec<ReportRow>,
    /// Whether span/context columns are part of the report.
    include_span: bool,
}

impl ExtractionReport {
    /// Wrap processed rows into a report.
    pub fn new(rows: Vec<ReportRow>, include_span: bool) -> Self {
        Self { rows, include_span }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }

    /// Export to CSV with the fixed column order: patient id, date, risk,
    /// note, medication, alias, ocr alias, dose, scheme, position, and the
    /// span/context pair when spans were requested.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("patient_id,date,risk,note,medication,alias,ocr_alias,dose,scheme,position");
        if self.include_span {
            csv.push_str(",span,context");
        }
        csv.push('\n');

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}",
                escape_csv(&row.patient_id),
                escape_csv(&row.date),
                escape_csv(row.risk.as_deref().unwrap_or("")),
                escape_csv(&row.note),
                escape_csv(&row.medication),
                escape_csv(&row.alias),
                escape_csv(row.ocr_alias.as_deref().unwrap_or("")),
                escape_csv(row.dose.as_deref().unwrap_or("")),
                escape_csv(row.scheme.as_deref().unwrap_or("")),
                row.position,
            ));
            if self.include_span {
                let span = row
                    .span
                    .map(|[start, end]| format!("[{start}, {end}]"))
                    .unwrap_or_default();
                csv.push_str(&format!(
                    ",{},{}",
                    escape_csv(&span),
                    escape_csv(row.context.as_deref().unwrap_or("")),
                ));
            }
            csv.push('\n');
        }

        csv
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
