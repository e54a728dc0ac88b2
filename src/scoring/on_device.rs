//! On-device model backend
//!
//! preprocess → lifecycle inference → one result per label, in percent with
//! one decimal place.

use crate::errors::Result;
use crate::model::ModelLifecycle;
use crate::preprocess::{ImagePreprocessor, ImageSource};
use crate::ranking::PredictionResult;
use crate::scoring::{sort_descending, ScoringBackend};
use async_trait::async_trait;
use std::sync::Arc;

pub struct OnDeviceBackend {
    lifecycle: Arc<ModelLifecycle>,
    preprocessor: ImagePreprocessor,
}

impl OnDeviceBackend {
    pub fn new(lifecycle: Arc<ModelLifecycle>) -> Self {
        Self {
            lifecycle,
            preprocessor: ImagePreprocessor::default(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycle> {
        &self.lifecycle
    }
}

#[async_trait]
impl ScoringBackend for OnDeviceBackend {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn score(&self, image: &ImageSource) -> Result<Vec<PredictionResult>> {
        let model = self.lifecycle.acquire().await?;
        let input = self
            .preprocessor
            .preprocess(image, model.descriptor().input)
            .await?;
        let raw = self.lifecycle.infer(input).await?;
        Ok(map_probabilities(model.labels(), &raw))
    }
}

/// Pair labels with raw probabilities, as percentages rounded to 0.1
pub fn map_probabilities(labels: &[String], raw: &[f32]) -> Vec<PredictionResult> {
    let mut results: Vec<PredictionResult> = labels
        .iter()
        .zip(raw)
        .map(|(label, &p)| PredictionResult::new(label.clone(), round_tenth(p as f64 * 100.0)))
        .collect();
    sort_descending(&mut results);
    results
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
