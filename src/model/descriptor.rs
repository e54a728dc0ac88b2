//! Model descriptor parsing
//!
//! Two JSON files describe a model:
//! - `metadata.json`: labels and the image input contract
//! - `model.json`: classifier architecture
//!
//! Missing `imageSize`/`channels` fall back to 200×200×3.

use crate::assets::ProvisionedAssets;
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_INPUT_WIDTH: usize = 200;
pub const DEFAULT_INPUT_HEIGHT: usize = 200;
pub const DEFAULT_INPUT_CHANNELS: usize = 3;

/// Expected model input: a single-sample NHWC batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl Default for InputShape {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_WIDTH,
            height: DEFAULT_INPUT_HEIGHT,
            channels: DEFAULT_INPUT_CHANNELS,
        }
    }
}

impl InputShape {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self { width, height, channels }
    }

    /// `[1, H, W, C]`
    pub fn dims(&self) -> [usize; 4] {
        [1, self.height, self.width, self.channels]
    }

    /// Number of values in one sample
    pub fn sample_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AnalysisError::ModelLoad(format!(
                "input size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(AnalysisError::ModelLoad(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        Ok(())
    }
}

/// `imageSize` is either a square edge or an explicit width/height pair
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ImageSize {
    Square(usize),
    Rect { width: usize, height: usize },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataFile {
    labels: Vec<String>,
    #[serde(default)]
    image_size: Option<ImageSize>,
    #[serde(default)]
    channels: Option<usize>,
}

/// Classifier architecture from `model.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Hidden layer widths, applied in order
    #[serde(default)]
    pub hidden: Vec<usize>,

    /// Declared `[1, H, W, C]`; must agree with the metadata when present
    #[serde(default)]
    pub input_shape: Option<Vec<usize>>,
}

/// Everything needed to build and drive a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub labels: Vec<String>,
    pub input: InputShape,
    pub classifier: ClassifierConfig,
}

impl ModelDescriptor {
    /// Parse from the two JSON documents
    pub fn parse(metadata_json: &str, model_json: &str) -> Result<Self> {
        let metadata: MetadataFile = serde_json::from_str(metadata_json)
            .map_err(|e| AnalysisError::ModelLoad(format!("corrupt metadata: {}", e)))?;
        let classifier: ClassifierConfig = serde_json::from_str(model_json)
            .map_err(|e| AnalysisError::ModelLoad(format!("corrupt model descriptor: {}", e)))?;

        if metadata.labels.is_empty() {
            return Err(AnalysisError::ModelLoad("metadata declares no labels".to_string()));
        }

        let (width, height) = match metadata.image_size {
            Some(ImageSize::Square(edge)) => (edge, edge),
            Some(ImageSize::Rect { width, height }) => (width, height),
            None => (DEFAULT_INPUT_WIDTH, DEFAULT_INPUT_HEIGHT),
        };
        let input = InputShape::new(
            width,
            height,
            metadata.channels.unwrap_or(DEFAULT_INPUT_CHANNELS),
        );
        input.validate()?;

        if let Some(declared) = &classifier.input_shape {
            if declared.as_slice() != input.dims().as_slice() {
                return Err(AnalysisError::ModelLoad(format!(
                    "input shape mismatch: model declares {:?}, metadata implies {:?}",
                    declared,
                    input.dims()
                )));
            }
        }

        if classifier.hidden.iter().any(|&w| w == 0) {
            return Err(AnalysisError::ModelLoad("hidden layer width must be non-zero".to_string()));
        }

        Ok(Self {
            labels: metadata.labels,
            input,
            classifier,
        })
    }

    /// Read and parse the provisioned descriptor files
    pub async fn read(assets: &ProvisionedAssets) -> Result<Self> {
        let metadata = read_text(&assets.metadata).await?;
        let model = read_text(&assets.descriptor).await?;
        Self::parse(&metadata, &model)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnalysisError::ModelLoad(format!("cannot read {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_size_absent() {
        let d = ModelDescriptor::parse(r#"{"labels": ["Cataract", "Normal"]}"#, "{}").unwrap();
        assert_eq!(d.input, InputShape::new(200, 200, 3));
        assert_eq!(d.label_count(), 2);
        assert!(d.classifier.hidden.is_empty());
    }

    #[test]
    fn test_square_image_size() {
        let d = ModelDescriptor::parse(
            r#"{"labels": ["a"], "imageSize": 96, "channels": 1}"#,
            r#"{"hidden": [32]}"#,
        )
        .unwrap();
        assert_eq!(d.input.dims(), [1, 96, 96, 1]);
        assert!(d.input.is_grayscale());
        assert_eq!(d.classifier.hidden, vec![32]);
    }

    #[test]
    fn test_rect_image_size() {
        let d = ModelDescriptor::parse(
            r#"{"labels": ["a"], "imageSize": {"width": 64, "height": 48}}"#,
            "{}",
        )
        .unwrap();
        assert_eq!(d.input.dims(), [1, 48, 64, 3]);
        assert_eq!(d.input.sample_len(), 48 * 64 * 3);
    }

    #[test]
    fn test_declared_shape_must_agree() {
        let err = ModelDescriptor::parse(
            r#"{"labels": ["a"], "imageSize": 96}"#,
            r#"{"inputShape": [1, 200, 200, 3]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ModelLoad(_)));

        let ok = ModelDescriptor::parse(
            r#"{"labels": ["a"], "imageSize": 96}"#,
            r#"{"inputShape": [1, 96, 96, 3]}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_rejects_corrupt_or_empty() {
        assert!(ModelDescriptor::parse("not json", "{}").is_err());
        assert!(ModelDescriptor::parse(r#"{"labels": []}"#, "{}").is_err());
        assert!(ModelDescriptor::parse(r#"{"labels": ["a"], "channels": 2}"#, "{}").is_err());
        assert!(ModelDescriptor::parse(r#"{"labels": ["a"]}"#, r#"{"hidden": [0]}"#).is_err());
    }
}
