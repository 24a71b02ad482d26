//! Disease reference data types.

use serde::{Deserialize, Serialize};

/// How damaging a disease is when left untreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Severity {
    #[default]
    None,
    Moderate,
    High,
}

impl Severity {
    /// Lenient parse for strings coming from the remote service.
    ///
    /// Returns `None` (the Option) for anything outside the known set so
    /// the caller can fall back to local reference data.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s {
            "None" => Some(Self::None),
            "Moderate" => Some(Self::Moderate),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static reference data for one disease class.
///
/// Loaded once from the embedded table and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub crop: String,
    pub severity: Severity,
    pub symptoms: Vec<String>,
    pub treatment: String,
    pub prevention: Vec<String>,
}
