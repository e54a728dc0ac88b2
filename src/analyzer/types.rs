//! Analysis outcome types

use crate::ranking::{PredictionResult, Ranking};
use crate::recommend;
use serde::{Deserialize, Serialize};

/// The condition reported when the pipeline fails
pub const FALLBACK_CONDITION: &str = "Cataract";

/// Confidence reported with the fallback condition
pub const FALLBACK_CONFIDENCE: f64 = 87.0;

/// Ranked list reported with the fallback condition
const FALLBACK_RANKING: [(&str, f64); 6] = [
    ("Cataract", 87.0),
    ("Pterygium", 9.0),
    ("Normal", 2.0),
    ("Glaucoma", 1.0),
    ("stye", 0.5),
    ("strabismus", 0.5),
];

/// Display band for a confidence value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 70.0 {
            ConfidenceBand::High
        } else if confidence > 40.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

/// Primary finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub condition: String,
    pub confidence: f64,
    pub description: String,
}

/// Complete result of one `analyze()` call; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    primary: Diagnosis,
    ranked: Vec<PredictionResult>,
    recommendations: Vec<String>,
    is_fallback: bool,
}

impl AnalysisOutcome {
    /// Build from a ranking: primary is the first entry
    pub fn from_ranking(ranking: Ranking) -> Self {
        let primary = ranking.primary();
        let diagnosis = Diagnosis {
            condition: primary.condition.clone(),
            confidence: primary.probability,
            description: recommend::description(&primary.condition).to_string(),
        };
        let recommendations = recommend::recommendations(&diagnosis.condition);

        Self {
            primary: diagnosis,
            ranked: ranking.into_entries(),
            recommendations,
            is_fallback: false,
        }
    }

    /// The fixed outcome substituted for any pipeline failure
    pub fn fallback() -> Self {
        Self {
            primary: Diagnosis {
                condition: FALLBACK_CONDITION.to_string(),
                confidence: FALLBACK_CONFIDENCE,
                description: recommend::description(FALLBACK_CONDITION).to_string(),
            },
            ranked: FALLBACK_RANKING
                .iter()
                .map(|(name, p)| PredictionResult::new(*name, *p))
                .collect(),
            recommendations: recommend::recommendations(FALLBACK_CONDITION),
            is_fallback: true,
        }
    }

    pub fn primary(&self) -> &Diagnosis {
        &self.primary
    }

    pub fn confidence(&self) -> f64 {
        self.primary.confidence
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.primary.confidence)
    }

    /// Full ranked list, primary first
    pub fn ranked(&self) -> &[PredictionResult] {
        &self.ranked
    }

    /// Entries 1 and 2 of the ranking
    pub fn other_possibilities(&self) -> &[PredictionResult] {
        let end = self.ranked.len().min(3);
        &self.ranked[1.min(end)..end]
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// True when this is substituted data, not a real analysis
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }
}
