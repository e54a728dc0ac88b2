//! Error types for the eye analysis pipeline
//!
//! Every stage reports through `AnalysisError`. None of these escape
//! `EyeAnalyzer::analyze`, which converts them into the fallback outcome.

use thiserror::Error;

/// Main error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Bundled asset missing or copy into the cache failed
    #[error("Asset provisioning failed for {asset}: {reason}")]
    Provision { asset: String, reason: String },

    /// Model descriptor, metadata or weights could not be turned into a model
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Source image could not be read or decoded
    #[error("Image preprocessing failed: {0}")]
    Preprocess(String),

    /// Model lifecycle transition not allowed from the current state
    #[error("Invalid model state transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// Inference requested while the model is not Ready
    #[error("Model not ready (state: {state})")]
    NotReady { state: String },

    /// Label/color detection service failure (transport, auth or schema)
    #[error("Vision service error: {0}")]
    Service(String),

    /// Input tensor does not match the declared input contract
    #[error("Input shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A backend produced no predictions to rank
    #[error("Backend produced no predictions")]
    EmptyPrediction,

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tensor runtime errors
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Short stable identifier used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Provision { .. } => "provision",
            AnalysisError::ModelLoad(_) => "model_load",
            AnalysisError::Preprocess(_) => "preprocess",
            AnalysisError::InvalidTransition { .. } => "invalid_transition",
            AnalysisError::NotReady { .. } => "not_ready",
            AnalysisError::Service(_) => "service",
            AnalysisError::ShapeMismatch { .. } => "shape_mismatch",
            AnalysisError::EmptyPrediction => "empty_prediction",
            AnalysisError::Timeout { .. } => "timeout",
            AnalysisError::Config(_) => "config",
            AnalysisError::Io(_) => "io",
            AnalysisError::Http(_) => "http",
            AnalysisError::Serialization(_) => "serialization",
            AnalysisError::Tensor(_) => "tensor",
        }
    }
}
