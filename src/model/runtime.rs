//! Inference runtime seam and the candle classifier behind it
//!
//! `InferenceRuntime` runs one forward pass; `RuntimeLoader` builds a runtime
//! from provisioned assets. Both are traits so tests can substitute fakes.

use crate::assets::ProvisionedAssets;
use crate::errors::{AnalysisError, Result};
use crate::model::descriptor::ModelDescriptor;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use std::sync::Arc;
use tracing::debug;

/// A constructed model able to run forward passes.
///
/// Implementations must be reentrant: `forward` takes `&self` and may be
/// called from several blocking threads at once.
pub trait InferenceRuntime: Send + Sync {
    /// Map a `[1, H, W, C]` input to a `[1, labels]` probability tensor
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
}

/// Builds a runtime from the files on disk
pub trait RuntimeLoader: Send + Sync {
    fn load(
        &self,
        assets: &ProvisionedAssets,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn InferenceRuntime>>;
}

/// Dense softmax classifier: flatten → (linear → relu)* → linear → softmax
pub struct CandleClassifier {
    hidden: Vec<Linear>,
    head: Linear,
    input_len: usize,
    device: Device,
}

impl CandleClassifier {
    /// Build from a variable store; tensor names are `hidden.{i}` and `head`
    pub fn new(vb: VarBuilder, descriptor: &ModelDescriptor) -> Result<Self> {
        let device = vb.device().clone();
        let input_len = descriptor.input.sample_len();

        let mut hidden = Vec::with_capacity(descriptor.classifier.hidden.len());
        let mut width = input_len;
        for (i, &out) in descriptor.classifier.hidden.iter().enumerate() {
            hidden.push(candle_nn::linear(width, out, vb.pp(format!("hidden.{}", i)))?);
            width = out;
        }
        let head = candle_nn::linear(width, descriptor.label_count(), vb.pp("head"))?;

        Ok(Self {
            hidden,
            head,
            input_len,
            device,
        })
    }
}

impl InferenceRuntime for CandleClassifier {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let batch = input.dim(0)?;
        let mut x = input
            .to_device(&self.device)?
            .to_dtype(DType::F32)?
            .reshape((batch, self.input_len))?;

        for layer in &self.hidden {
            x = layer.forward(&x)?.relu()?;
        }

        let logits = self.head.forward(&x)?;
        Ok(candle_nn::ops::softmax(&logits, D::Minus1)?)
    }
}

/// Loads `CandleClassifier` weights from safetensors files
#[derive(Debug, Clone)]
pub struct CandleLoader {
    device: Device,
}

impl CandleLoader {
    pub fn new() -> Self {
        // CPU only for now
        Self { device: Device::Cpu }
    }
}

impl Default for CandleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeLoader for CandleLoader {
    fn load(
        &self,
        assets: &ProvisionedAssets,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn InferenceRuntime>> {
        if assets.weights.is_empty() {
            return Err(AnalysisError::ModelLoad("no weight files declared".to_string()));
        }

        debug!(files = ?assets.weights, "loading classifier weights");

        // SAFETY: the cache directory is private to this process and the
        // files are not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&assets.weights, DType::F32, &self.device)
                .map_err(|e| AnalysisError::ModelLoad(format!("cannot map weights: {}", e)))?
        };

        let classifier = CandleClassifier::new(vb, descriptor)
            .map_err(|e| AnalysisError::ModelLoad(format!("weights do not fit descriptor: {}", e)))?;

        Ok(Arc::new(classifier))
    }
}
