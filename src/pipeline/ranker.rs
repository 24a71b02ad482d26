//! Result Ranker - logits to ranked, enriched diagnosis.

use crate::constants::TOP_K;
use crate::disease::DiseaseDatabase;
use crate::error::PipelineError;
use crate::pipeline::types::{ClassScore, PredictionResult};

/// Numerically stable softmax: subtract the max logit before
/// exponentiation so large logits cannot overflow.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_val = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max_val).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&v| v / sum).collect()
}

/// Ranked class probabilities for one forward pass.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub primary: ClassScore,
    pub top_k: Vec<ClassScore>,
}

/// Rank raw scores against the database's class table.
///
/// The sort is stable and descending by probability; ties keep the
/// original class-index order. Fails with `MalformedOutput` when the
/// score vector does not match the class count.
pub fn rank(logits: &[f32], db: &DiseaseDatabase) -> Result<Ranked, PipelineError> {
    if logits.len() != db.class_count() {
        return Err(PipelineError::MalformedOutput {
            expected: db.class_count(),
            actual: logits.len(),
        });
    }

    let probabilities = softmax(logits);

    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let scored = |&(idx, prob): &(usize, f32)| ClassScore {
        label: db
            .label_for_index(idx)
            .unwrap_or("Unknown")
            .to_string(),
        confidence: prob,
    };

    let top_k: Vec<ClassScore> = indexed.iter().take(TOP_K).map(scored).collect();
    let primary = top_k[0].clone();

    Ok(Ranked { primary, top_k })
}

/// Rank and enrich with static disease metadata.
///
/// Enrichment never fails: labels missing from the table get the
/// synthesized fallback record.
pub fn diagnose(logits: &[f32], db: &DiseaseDatabase) -> Result<PredictionResult, PipelineError> {
    let ranked = rank(logits, db)?;
    let record = db.lookup_or_fallback(&ranked.primary.label);

    Ok(PredictionResult {
        disease: ranked.primary.label,
        confidence: ranked.primary.confidence,
        crop: record.crop,
        severity: record.severity,
        treatment: record.treatment,
        symptoms: record.symptoms,
        prevention: record.prevention,
        top_k: ranked.top_k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NUM_CLASSES;
    use crate::disease::Severity;

    fn letter_db(n: usize) -> DiseaseDatabase {
        let labels = (0..n)
            .map(|i| {
                char::from(b'A' + i as u8).to_string()
            })
            .collect();
        DiseaseDatabase::new(labels, Default::default())
    }

    #[test]
    fn probabilities_sum_to_one_and_are_sorted() {
        let logits: Vec<f32> = (0..NUM_CLASSES).map(|i| (i as f32) * 0.3 - 2.0).collect();
        let db = letter_db(NUM_CLASSES);

        let ranked = rank(&logits, &db).unwrap();
        let sum: f32 = softmax(&logits).iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);

        for pair in ranked.top_k.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert_eq!(ranked.top_k.len(), TOP_K);
    }

    #[test]
    fn dominant_logit_wins_with_high_confidence() {
        let mut logits = vec![0.0f32; NUM_CLASSES];
        logits[0] = 10.0;
        let db = letter_db(NUM_CLASSES);

        let ranked = rank(&logits, &db).unwrap();
        assert_eq!(ranked.primary.label, "A");
        assert!(ranked.primary.confidence > 0.99);
    }

    #[test]
    fn ties_preserve_class_index_order() {
        let logits = vec![1.0f32; NUM_CLASSES];
        let db = letter_db(NUM_CLASSES);

        let ranked = rank(&logits, &db).unwrap();
        let labels: Vec<&str> = ranked.top_k.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn huge_logits_do_not_overflow() {
        let mut logits = vec![1000.0f32; NUM_CLASSES];
        logits[3] = 1010.0;
        let db = letter_db(NUM_CLASSES);

        let ranked = rank(&logits, &db).unwrap();
        assert_eq!(ranked.primary.label, "D");
        assert!(ranked.primary.confidence.is_finite());
    }

    #[test]
    fn wrong_length_is_malformed_output() {
        let db = letter_db(NUM_CLASSES);
        let err = rank(&[0.0; 7], &db).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedOutput {
                expected: 15,
                actual: 7
            }
        ));
    }

    #[test]
    fn diagnose_enriches_known_label() {
        let db = DiseaseDatabase::embedded();
        let mut logits = vec![0.0f32; NUM_CLASSES];
        logits[8] = 12.0; // "Tomato: Early Blight"

        let result = diagnose(&logits, db).unwrap();
        assert_eq!(result.disease, "Tomato: Early Blight");
        assert_eq!(result.crop, "Tomato");
        assert_eq!(result.severity, Severity::Moderate);
        assert!(!result.symptoms.is_empty());
    }

    #[test]
    fn diagnose_falls_back_for_unknown_label() {
        let db = letter_db(NUM_CLASSES);
        let mut logits = vec![0.0f32; NUM_CLASSES];
        logits[2] = 9.0;

        let result = diagnose(&logits, &db).unwrap();
        assert_eq!(result.disease, "C");
        assert_eq!(result.crop, "C");
        assert_eq!(result.severity, Severity::None);
        assert!(result.symptoms.is_empty());
    }
}
