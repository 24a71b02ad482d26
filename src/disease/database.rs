//! Disease Database - embedded immutable lookup tables.
//!
//! Two tables, bundled with the crate and parsed once:
//! - class index -> display label (training order of the classifier)
//! - display label -> `DiseaseRecord` with remediation guidance
//!
//! The parse happens at first access; the embedded assets are part of the
//! build, so a parse failure is a packaging defect and panics immediately.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::types::{DiseaseRecord, Severity};

/// Generic guidance used when a label has no curated record.
pub const FALLBACK_TREATMENT: &str = "Consult a local agronomist for specific treatment.";

static EMBEDDED: Lazy<DiseaseDatabase> = Lazy::new(|| {
    let class_names: Vec<String> = serde_json::from_str(include_str!("../../data/class_names.json"))
        .expect("embedded class_names.json is valid");
    let records: HashMap<String, DiseaseRecord> =
        serde_json::from_str(include_str!("../../data/disease_info.json"))
            .expect("embedded disease_info.json is valid");
    DiseaseDatabase::new(class_names, records)
});

/// Immutable label/record tables backing result enrichment and the
/// disease library surface.
#[derive(Debug, Clone)]
pub struct DiseaseDatabase {
    class_names: Vec<String>,
    records: HashMap<String, DiseaseRecord>,
}

impl DiseaseDatabase {
    /// Build a database from explicit tables (tests inject small ones).
    pub fn new(class_names: Vec<String>, records: HashMap<String, DiseaseRecord>) -> Self {
        Self {
            class_names,
            records,
        }
    }

    /// The tables bundled with the crate (15 corn/potato/tomato classes).
    pub fn embedded() -> &'static DiseaseDatabase {
        &EMBEDDED
    }

    /// Number of classes the classifier distinguishes.
    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }

    /// Display label for a class index, if in range.
    pub fn label_for_index(&self, index: usize) -> Option<&str> {
        self.class_names.get(index).map(String::as_str)
    }

    /// Class labels in training order.
    pub fn labels(&self) -> &[String] {
        &self.class_names
    }

    /// Curated record for a label, if one exists.
    pub fn lookup(&self, label: &str) -> Option<&DiseaseRecord> {
        self.records.get(label)
    }

    /// All curated records, for the disease library surface.
    pub fn records(&self) -> impl Iterator<Item = (&str, &DiseaseRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Records filtered by crop name (case-insensitive).
    pub fn records_for_crop<'a>(
        &'a self,
        crop: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a DiseaseRecord)> {
        self.records()
            .filter(move |(_, rec)| rec.crop.eq_ignore_ascii_case(crop))
    }

    /// Record for a label, or the synthesized fallback.
    ///
    /// The fallback derives the crop from the label prefix before the `:`
    /// separator and carries generic guidance. It never fails; this is the
    /// terminal safety net for labels the tables do not know.
    pub fn lookup_or_fallback(&self, label: &str) -> DiseaseRecord {
        if let Some(record) = self.lookup(label) {
            return record.clone();
        }

        let crop = label.split(':').next().unwrap_or(label).trim().to_string();
        DiseaseRecord {
            crop,
            severity: Severity::None,
            symptoms: Vec::new(),
            treatment: FALLBACK_TREATMENT.to_string(),
            prevention: Vec::new(),
        }
    }
}
