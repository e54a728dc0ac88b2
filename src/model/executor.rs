//! Single forward pass with shape checking
//!
//! The input tensor is taken by value and the output never leaves this
//! function, so both are released on every return path, errors included.

use crate::errors::{AnalysisError, Result};
use crate::model::descriptor::ModelDescriptor;
use crate::model::runtime::InferenceRuntime;
use candle_core::{DType, Tensor};

/// Run one forward pass and return one probability per label.
///
/// A shape mismatch is a caller error and is reported, never retried.
pub fn execute(
    runtime: &dyn InferenceRuntime,
    descriptor: &ModelDescriptor,
    input: Tensor,
) -> Result<Vec<f32>> {
    let expected = descriptor.input.dims();
    if input.dims() != expected.as_slice() {
        return Err(AnalysisError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: input.dims().to_vec(),
        });
    }

    let output = runtime.forward(&input)?;
    drop(input);

    let probabilities = output
        .flatten_all()?
        .to_dtype(DType::F32)?
        .to_vec1::<f32>()?;

    if probabilities.len() != descriptor.label_count() {
        return Err(AnalysisError::ShapeMismatch {
            expected: vec![1, descriptor.label_count()],
            actual: output.dims().to_vec(),
        });
    }

    Ok(probabilities)
}
