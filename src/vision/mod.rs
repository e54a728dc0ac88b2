//! Label/color detection service
//!
//! - `types`: strict request/response schema and the validated `Detection`
//! - `client`: reqwest client behind the `LabelDetector` trait

pub mod client;
pub mod types;

pub use client::{LabelDetector, VisionClient};
pub use types::{Detection, Label};
