//! EyeCheck v0.3.0 - Eye Condition Screening
//!
//! Scores an eye photograph against a fixed set of conditions and returns a
//! ranked list with advice. Two interchangeable backends:
//!
//! - **model**: bundled image classifier run on-device with candle
//! - **cloud**: label/color detection service plus keyword heuristics
//!
//! Any failure along the pipeline yields a fixed fallback outcome, flagged
//! with `AnalysisOutcome::is_fallback()`.

pub mod errors;
pub mod config;

// Domain tables
pub mod color;
pub mod conditions;
pub mod recommend;
pub mod ranking;

// On-device pipeline
pub mod assets;
pub mod model;
pub mod preprocess;

// Cloud pipeline
pub mod vision;

pub mod scoring;
pub mod analyzer;
pub mod cli;

// Re-export commonly used types
pub use analyzer::{AnalysisOutcome, EyeAnalyzer};
pub use config::Config;
pub use errors::{AnalysisError, Result};
pub use preprocess::ImageSource;
