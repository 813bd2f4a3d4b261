//! Medication dictionary and alias index.
//!
//! The dictionary is fixed, process-wide configuration: a table of canonical
//! medication names with their known spelling variants. It is built once and
//! never mutated afterwards, so an [`AliasIndex`] derived from it can be shared
//! freely across threads.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractor::normalize::strip_diacritics;

/// A canonical medication name with its known spelling variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalMedication {
    /// The standardized name every variant resolves to.
    pub name: String,
    /// Known spellings, including abbreviations and common OCR misreads.
    pub aliases: Vec<String>,
}

impl CanonicalMedication {
    /// Create a medication entry from its canonical name and alias list.
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Immutable table of canonical medications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliasDictionary {
    medications: Vec<CanonicalMedication>,
}

impl AliasDictionary {
    /// Build a dictionary from an explicit medication list.
    pub fn with_medications(medications: Vec<CanonicalMedication>) -> Self {
        Self { medications }
    }

    /// The medication entries in declaration order.
    pub fn medications(&self) -> &[CanonicalMedication] {
        &self.medications
    }
}

impl Default for AliasDictionary {
    /// The validated clinical dictionary used in production.
    fn default() -> Self {
        let m = CanonicalMedication::new;
        Self {
            medications: vec![
                // Benzodiazepines
                m("clonazepam", &["clonazepam", "cnz", "clonaz", "clonazep", "clonazepma"]),
                m("diazepam", &["diazepam", "dzp", "diazepan"]),
                m("clotiazepam", &["clotiazepam"]),
                m("alprazolam", &["alprazolam", "alp"]),
                // Hypnotics
                m("eszopiclona", &["eszopiclona"]),
                m("zolpidem", &["zolpidem", "zlp", "zpd"]),
                // Antipsychotics
                m("quetiapina", &["quetiapina", "qtp", "qtt", "qtppa", "qtp"]),
                m("risperidona", &["risperidona", "risp", "rsp"]),
                m("olanzapina", &["olanzapina", "olz", "oollzz"]),
                m("haloperidol", &["haloperidol"]),
                // Antidepressants
                m("fluoxetina", &["fluoxetina", "flx", "fxt"]),
                m("sertralina", &["sertralina", "srt", "sertra", "srt"]),
                m("paroxetina", &["paroxetina", "pxt"]),
                m("escitalopram", &["escitalopram", "talopram"]),
                m("venlafaxina", &["venlafaxina", "vfx", "venla", "vlf"]),
                m("amitriptilina", &["amitriptilina", "amt"]),
                m("trazodona", &["trazodona", "trazo", "trz"]),
                m("bupropion", &["bupropion"]),
                // Mood stabilizers / antiepileptics
                m("carbamazepina", &["carbamazepina", "cbz", "arbamazepina"]),
                m("oxcarbazepina", &["oxcarbazepina"]),
                m("ácido valproico", &["ácido valproico", "acido valproico", "valproato", "valp"]),
                m("lamotrigina", &["lamotrigina"]),
                m("litio", &["litio"]),
                m("difenil hidantoinato", &["difenil hidantoinato", "difenil"]),
                // Others
                m("calmina", &["calmina"]),
                m("metilfenidato", &["metilfenidato"]),
                m("pregabalina", &["pregabalina", "pregaba"]),
                m("biperideno", &["biperideno", "bpd", "bipe"]),
                m("donepecilo", &["donepecilo", "dnlp", "donepe"]),
                m("levodopa", &["levodopa"]),
                m("nimodipina", &["nimodipina"]),
                m("fenobarbital", &["fenobarbital"]),
                m("aripiprazol", &["aripiprazol"]),
                m(
                    "levomepromazina",
                    &["levomepromacina", "levopromazina", "levomep", "levomeproma", "Levomepromazina"],
                ),
            ],
        }
    }
}

/// Flattened lookup structures derived from an [`AliasDictionary`].
///
/// Every key is unique, lowercase and diacritic-free. When two canonical
/// medications share an alias, the last-inserted entry wins; insertion order
/// is the dictionary's declaration order, so the result is deterministic.
#[derive(Debug)]
pub struct AliasIndex {
    /// Normalized alias → canonical medication name.
    canonical_by_alias: HashMap<String, String>,
    /// All normalized aliases, in first-insertion order.
    aliases: Vec<String>,
    /// Aliases bucketed by their first character, for the fuzzy candidate pool.
    by_first: HashMap<char, Vec<String>>,
    /// Word-bounded alternation over all aliases, longest first.
    alias_pattern: Regex,
}

impl AliasIndex {
    /// Flatten a dictionary into lookup structures.
    pub fn build(dictionary: &AliasDictionary) -> Self {
        let mut canonical_by_alias: HashMap<String, String> = HashMap::new();
        let mut aliases: Vec<String> = Vec::new();

        let mut insert = |alias: &str, canonical: &str| {
            let key = normalize_alias(alias);
            if key.is_empty() {
                return;
            }
            if canonical_by_alias
                .insert(key.clone(), canonical.to_string())
                .is_none()
            {
                aliases.push(key);
            }
        };

        for med in dictionary.medications() {
            insert(&med.name, &med.name);
            for alias in &med.aliases {
                insert(alias, &med.name);
            }
        }

        let mut by_first: HashMap<char, Vec<String>> = HashMap::new();
        for alias in &aliases {
            if let Some(first) = alias.chars().next() {
                by_first.entry(first).or_default().push(alias.clone());
            }
        }

        // Longest-first so multi-word or longer aliases win over shorter
        // prefixes sharing a stem. The sort is stable, ties keep insertion order.
        let mut ordered = aliases.clone();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));
        let alternation = ordered
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");
        let alias_pattern = Regex::new(&format!(r"\b(?:{alternation})\b"))
            .expect("alias alternation pattern is built from escaped literals");

        Self {
            canonical_by_alias,
            aliases,
            by_first,
            alias_pattern,
        }
    }

    /// Canonical medication for a normalized alias, if known.
    pub fn canonical_for(&self, alias: &str) -> Option<&str> {
        self.canonical_by_alias.get(alias).map(String::as_str)
    }

    /// The exact-matching alternation pattern.
    pub fn alias_pattern(&self) -> &Regex {
        &self.alias_pattern
    }

    /// All normalized aliases, in insertion order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Candidate pool for fuzzy matching: aliases sharing the token's first
    /// character, falling back to the full alias list when the bucket is empty.
    pub fn fuzzy_pool(&self, first: char) -> &[String] {
        self.by_first
            .get(&first)
            .map(Vec::as_slice)
            .unwrap_or(&self.aliases)
    }
}

/// Normalize an alias for indexing: lowercase, diacritics stripped.
fn normalize_alias(alias: &str) -> String {
    strip_diacritics(&alias.to_lowercase())
}
