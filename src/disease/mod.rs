//! Disease Reference Data
//!
//! Static label and remediation tables consumed by result enrichment
//! and exposed to the disease library surface.

mod database;
mod types;

pub use database::{DiseaseDatabase, FALLBACK_TREATMENT};
pub use types::{DiseaseRecord, Severity};
