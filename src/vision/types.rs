//! Wire schema for the label/color detection service
//!
//! Responses are parsed into these strict types and then validated; any
//! violation becomes `AnalysisError::Service` rather than a panic on field
//! access.

use crate::color::Swatch;
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Top-level request body
#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct ImageContent {
    /// Base64-encoded image bytes
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub max_results: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    LabelDetection,
    ImageProperties,
}

impl AnnotateRequest {
    pub fn new(content: String, max_labels: u32, max_colors: u32) -> Self {
        Self {
            requests: vec![ImageRequest {
                image: ImageContent { content },
                features: vec![
                    Feature {
                        kind: FeatureKind::LabelDetection,
                        max_results: max_labels,
                    },
                    Feature {
                        kind: FeatureKind::ImageProperties,
                        max_results: max_colors,
                    },
                ],
            }],
        }
    }
}

/// Top-level response body
#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    pub responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    pub image_properties_annotation: Option<ImageProperties>,
    #[serde(default)]
    pub error: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct LabelAnnotation {
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub dominant_colors: DominantColors,
}

#[derive(Debug, Deserialize)]
pub struct DominantColors {
    #[serde(default)]
    pub colors: Vec<ColorInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ColorInfo {
    pub color: RgbColor,
}

/// Channels the service leaves at zero are omitted from the payload
#[derive(Debug, Deserialize)]
pub struct RgbColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// A generic label with its confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    pub score: f64,
}

impl Label {
    pub fn new(description: impl Into<String>, score: f64) -> Self {
        Self {
            description: description.into(),
            score,
        }
    }
}

/// Validated service output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub labels: Vec<Label>,
    pub colors: Vec<Swatch>,
}

impl AnnotateResponse {
    /// Validate and convert; keeps at most `max_labels` labels and `max_colors` swatches
    pub fn into_detection(self, max_labels: usize, max_colors: usize) -> Result<Detection> {
        let response = self
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::Service("response contained no results".to_string()))?;

        if let Some(status) = response.error {
            return Err(AnalysisError::Service(format!(
                "service reported error {}: {}",
                status.code, status.message
            )));
        }

        let labels = response
            .label_annotations
            .into_iter()
            .take(max_labels)
            .map(|annotation| {
                if !annotation.score.is_finite() || !(0.0..=1.0).contains(&annotation.score) {
                    return Err(AnalysisError::Service(format!(
                        "label '{}' has score {} outside [0, 1]",
                        annotation.description, annotation.score
                    )));
                }
                Ok(Label::new(annotation.description, annotation.score))
            })
            .collect::<Result<Vec<_>>>()?;

        let colors = response
            .image_properties_annotation
            .map(|props| props.dominant_colors.colors)
            .unwrap_or_default()
            .into_iter()
            .take(max_colors)
            .map(|info| {
                Ok(Swatch::from_channels(
                    channel(info.color.red)?,
                    channel(info.color.green)?,
                    channel(info.color.blue)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Detection { labels, colors })
    }
}

/// Validate a reported channel; the value itself is kept unrounded
fn channel(value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=255.0).contains(&value) {
        return Err(AnalysisError::Service(format!(
            "color channel {} outside [0, 255]",
            value
        )));
    }
    Ok(value)
}
