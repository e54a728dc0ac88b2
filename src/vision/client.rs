//! HTTP client for the label/color detection service
//!
//! One POST per image, attempted exactly once. No client-side timeout: the
//! analyzer's overall budget covers it.

use crate::config::VisionConfig;
use crate::errors::{AnalysisError, Result};
use crate::vision::types::{AnnotateRequest, AnnotateResponse, Detection};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use tracing::debug;

/// Anything that can label an image and report its dominant colors
#[async_trait]
pub trait LabelDetector: Send + Sync {
    async fn detect(&self, image: &[u8]) -> Result<Detection>;
}

/// Google Vision style `images:annotate` client
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    max_labels: u32,
    max_colors: u32,
}

impl VisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(AnalysisError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            max_labels: config.max_labels,
            max_colors: config.max_colors,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LabelDetector for VisionClient {
    async fn detect(&self, image: &[u8]) -> Result<Detection> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::Service("no API key configured".to_string()))?;

        let request = AnnotateRequest::new(STANDARD.encode(image), self.max_labels, self.max_colors);

        debug!(endpoint = %self.endpoint, bytes = image.len(), "calling vision service");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Service(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalysisError::Service(format!("HTTP {}: {}", status, error_text)));
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Service(format!("Failed to parse response: {}", e)))?;

        let detection = body.into_detection(self.max_labels as usize, self.max_colors as usize)?;
        debug!(
            labels = detection.labels.len(),
            colors = detection.colors.len(),
            "vision service responded"
        );
        Ok(detection)
    }
}
