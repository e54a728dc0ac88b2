//! Image preprocessing for model input
//!
//! Decode → exact resize → optional grayscale (channel mean) → [0, 1] →
//! `[1, H, W, C]` f32 tensor. Decode buffers are dropped before the tensor
//! is built.

use crate::errors::{AnalysisError, Result};
use crate::model::InputShape;
use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::PathBuf;
use tracing::debug;

/// Where an image comes from; owned by the caller
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Raw encoded bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                AnalysisError::Preprocess(format!("cannot read {}: {}", path.display(), e))
            }),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&std::path::Path> for ImageSource {
    fn from(path: &std::path::Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// Converts images into tensors matching a model's input contract
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    filter: FilterType,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl ImagePreprocessor {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Read, decode and convert off the async executor
    pub async fn preprocess(&self, source: &ImageSource, shape: InputShape) -> Result<Tensor> {
        let bytes = source.read_bytes().await?;
        let filter = self.filter;

        tokio::task::spawn_blocking(move || encode_tensor(&bytes, shape, filter))
            .await
            .map_err(|e| AnalysisError::Preprocess(format!("preprocess task aborted: {}", e)))?
    }
}

/// Decode `bytes` and build the input tensor for `shape`
pub fn encode_tensor(bytes: &[u8], shape: InputShape, filter: FilterType) -> Result<Tensor> {
    if shape.width == 0 || shape.height == 0 {
        return Err(AnalysisError::Preprocess(format!(
            "target size must be non-zero, got {}x{}",
            shape.width, shape.height
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::Preprocess(format!("decode failed: {}", e)))?;
    debug!(
        source_width = decoded.width(),
        source_height = decoded.height(),
        target = ?shape.dims(),
        "decoded image"
    );

    let resized = decoded.resize_exact(shape.width as u32, shape.height as u32, filter);
    drop(decoded);

    let data = pixel_values(resized, shape.channels)?;
    Ok(Tensor::from_vec(data, shape.dims().as_slice(), &Device::Cpu)?)
}

/// Row-major HWC samples scaled from [0, 255] to [0, 1]
fn pixel_values(image: DynamicImage, channels: usize) -> Result<Vec<f32>> {
    let values = match channels {
        1 => image
            .into_rgb8()
            .pixels()
            .map(|p| {
                let sum = p[0] as f32 + p[1] as f32 + p[2] as f32;
                sum / 3.0 / 255.0
            })
            .collect(),
        3 => image
            .into_rgb8()
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect(),
        4 => image
            .into_rgba8()
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect(),
        other => {
            return Err(AnalysisError::Preprocess(format!(
                "unsupported channel count {}",
                other
            )))
        }
    };
    Ok(values)
}
