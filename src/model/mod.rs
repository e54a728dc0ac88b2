//! On-device model: descriptor, runtime, lifecycle and inference
//!
//! - `descriptor`: labels and input contract from the bundled JSON files
//! - `runtime`: candle classifier behind the `InferenceRuntime` trait
//! - `executor`: one shape-checked forward pass
//! - `lifecycle`: load-once shared handle with warm-up and disposal

pub mod descriptor;
pub mod executor;
pub mod lifecycle;
pub mod runtime;

// Re-export key types for convenience
pub use descriptor::{ClassifierConfig, InputShape, ModelDescriptor};
pub use lifecycle::{LifecycleEvent, LoadedModel, ModelLifecycle, ModelState};
pub use runtime::{CandleClassifier, CandleLoader, InferenceRuntime, RuntimeLoader};
