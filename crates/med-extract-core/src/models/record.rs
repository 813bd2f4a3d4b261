//! Tabular consultation input rows.

use serde::{Deserialize, Serialize};

/// One row of a consultation table: who was seen, when, and what was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationRow {
    /// Patient identifier, opaque to the engine.
    pub patient_id: String,
    /// Consultation date, carried through as-is.
    pub date: String,
    /// Optional risk label attached by the source system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    /// Free-text consultation note.
    pub note: String,
}

impl ConsultationRow {
    /// Convenience constructor for tests and callers building rows by hand.
    pub fn new(patient_id: &str, date: &str, risk: Option<&str>, note: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            date: date.to_string(),
            risk: risk.map(str::to_string),
            note: note.to_string(),
        }
    }
}
