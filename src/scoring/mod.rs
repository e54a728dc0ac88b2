//! Scoring backends
//!
//! Both backends turn an image into per-condition predictions, sorted
//! descending. The analyzer picks one at construction time.

pub mod heuristic;
pub mod on_device;

pub use heuristic::CloudHeuristicBackend;
pub use on_device::OnDeviceBackend;

use crate::errors::Result;
use crate::preprocess::ImageSource;
use crate::ranking::PredictionResult;
use async_trait::async_trait;

/// Image → ranked predictions
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn score(&self, image: &ImageSource) -> Result<Vec<PredictionResult>>;
}

/// Stable descending sort shared by the backends
pub(crate) fn sort_descending(results: &mut [PredictionResult]) {
    results.sort_by(|a, b| b.probability.total_cmp(&a.probability));
}
