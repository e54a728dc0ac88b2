//! Analysis entry point and fallback controller
//!
//! `EyeAnalyzer` is the composition root: it owns the scoring backend (and,
//! for the on-device backend, the model lifecycle). `analyze()` runs
//! score → rank → recommend under an optional time budget and never fails;
//! any error is logged and replaced by `AnalysisOutcome::fallback()`.

pub mod types;

pub use types::{AnalysisOutcome, ConfidenceBand, Diagnosis};

use crate::assets::AssetProvisioner;
use crate::config::{BackendKind, Config};
use crate::errors::{AnalysisError, Result};
use crate::model::{CandleLoader, ModelLifecycle};
use crate::preprocess::ImageSource;
use crate::ranking::rank;
use crate::scoring::{CloudHeuristicBackend, OnDeviceBackend, ScoringBackend};
use crate::vision::VisionClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub struct EyeAnalyzer {
    backend: Arc<dyn ScoringBackend>,
    model: Option<Arc<ModelLifecycle>>,
    timeout: Option<Duration>,
}

impl EyeAnalyzer {
    /// Analyzer over an arbitrary backend, with no time budget
    pub fn new(backend: Arc<dyn ScoringBackend>) -> Self {
        Self {
            backend,
            model: None,
            timeout: None,
        }
    }

    /// On-device analyzer sharing an existing lifecycle
    pub fn with_model(lifecycle: Arc<ModelLifecycle>) -> Self {
        Self {
            backend: Arc::new(OnDeviceBackend::new(lifecycle.clone())),
            model: Some(lifecycle),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configured backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let analyzer = match config.analysis.backend {
            BackendKind::Model => {
                let lifecycle = ModelLifecycle::new(
                    AssetProvisioner::from_config(&config.model),
                    Arc::new(CandleLoader::new()),
                )
                .with_lazy_load(config.model.lazy_load);
                Self::with_model(Arc::new(lifecycle))
            }
            BackendKind::Cloud => {
                let client = VisionClient::new(&config.vision)?;
                Self::new(Arc::new(CloudHeuristicBackend::new(Arc::new(client))))
            }
        };

        let analyzer = if config.analysis.timeout_secs > 0 {
            analyzer.with_timeout(Duration::from_secs(config.analysis.timeout_secs))
        } else {
            analyzer
        };

        info!(backend = analyzer.backend.name(), "analyzer configured");
        Ok(analyzer)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The model lifecycle, when the on-device backend is in use
    pub fn model(&self) -> Option<&Arc<ModelLifecycle>> {
        self.model.as_ref()
    }

    /// Load the model ahead of the first call; no-op for the cloud backend
    pub async fn warm_up(&self) -> Result<()> {
        if let Some(model) = &self.model {
            model.load().await?;
        }
        Ok(())
    }

    /// Release the model, if any
    pub async fn shutdown(&self) {
        if let Some(model) = &self.model {
            model.dispose().await;
        }
    }

    /// Analyze one image. Always returns a displayable outcome; failures
    /// produce the fallback outcome with `is_fallback()` set.
    pub async fn analyze(&self, image: impl Into<ImageSource>) -> AnalysisOutcome {
        let image = image.into();
        let request_id = Uuid::new_v4();
        let span = info_span!("analyze", %request_id, backend = self.backend.name());

        async {
            match self.try_analyze(&image).await {
                Ok(outcome) => {
                    info!(
                        condition = %outcome.primary().condition,
                        confidence = outcome.confidence(),
                        "analysis complete"
                    );
                    outcome
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        kind = e.kind(),
                        image = %image.describe(),
                        "analysis failed, returning fallback outcome"
                    );
                    AnalysisOutcome::fallback()
                }
            }
        }
        .instrument(span)
        .await
    }

    /// The pipeline without the fallback, for callers that want the error
    pub async fn try_analyze(&self, image: &ImageSource) -> Result<AnalysisOutcome> {
        let pipeline = async {
            let predictions = self.backend.score(image).await?;
            let ranking = rank(predictions)?;
            Ok::<_, AnalysisError>(AnalysisOutcome::from_ranking(ranking))
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pipeline)
                .await
                .map_err(|_| AnalysisError::Timeout {
                    duration_ms: limit.as_millis() as u64,
                })?,
            None => pipeline.await,
        }
    }
}
