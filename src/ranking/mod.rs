//! Result ranking and normalization
//!
//! Shared post-step for every scoring backend:
//! - clamp each probability into [0, 100] (NaN becomes 0)
//! - stable sort, descending
//! - ties keep their incoming order, which backends emit in registry order

use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Lowest representable probability
pub const MIN_PROBABILITY: f64 = 0.0;

/// Highest representable probability
pub const MAX_PROBABILITY: f64 = 100.0;

/// One condition with its probability in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub condition: String,
    pub probability: f64,
}

impl PredictionResult {
    pub fn new(condition: impl Into<String>, probability: f64) -> Self {
        Self {
            condition: condition.into(),
            probability,
        }
    }
}

/// Ranked predictions; `entries[0]` is the primary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    entries: Vec<PredictionResult>,
}

impl Ranking {
    pub fn primary(&self) -> &PredictionResult {
        // Construction guarantees at least one entry.
        &self.entries[0]
    }

    pub fn entries(&self) -> &[PredictionResult] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PredictionResult> {
        self.entries
    }
}

/// Clamp into [0, 100]
pub fn normalize_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        MIN_PROBABILITY
    } else {
        probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    }
}

/// Normalize and rank backend output
pub fn rank(results: Vec<PredictionResult>) -> Result<Ranking> {
    if results.is_empty() {
        return Err(AnalysisError::EmptyPrediction);
    }

    let mut entries: Vec<PredictionResult> = results
        .into_iter()
        .map(|mut r| {
            r.probability = normalize_probability(r.probability);
            r
        })
        .collect();

    // `sort_by` is stable
    entries.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    Ok(Ranking { entries })
}
