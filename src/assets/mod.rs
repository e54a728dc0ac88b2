//! Asset provisioning
//!
//! Copies the bundled model files into a writable cache directory on first
//! use. Safe to call repeatedly: files already present are left alone.

pub mod retry;

pub use retry::RetryPolicy;

use crate::config::ModelConfig;
use crate::errors::{AnalysisError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The files that make up one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSet {
    pub descriptor: String,
    pub metadata: String,
    pub weights: Vec<String>,
}

impl AssetSet {
    /// Every file name in the set, descriptor first
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.descriptor.as_str())
            .chain(std::iter::once(self.metadata.as_str()))
            .chain(self.weights.iter().map(String::as_str))
    }
}

impl From<&ModelConfig> for AssetSet {
    fn from(config: &ModelConfig) -> Self {
        Self {
            descriptor: config.descriptor.clone(),
            metadata: config.metadata.clone(),
            weights: config.weights.clone(),
        }
    }
}

/// Local paths of a provisioned asset set
#[derive(Debug, Clone)]
pub struct ProvisionedAssets {
    pub dir: PathBuf,
    pub descriptor: PathBuf,
    pub metadata: PathBuf,
    pub weights: Vec<PathBuf>,

    /// Files copied by this call; empty when everything was already cached
    pub copied: Vec<String>,
}

/// Ensures the asset set exists in the cache directory
#[derive(Debug, Clone)]
pub struct AssetProvisioner {
    bundle_dir: PathBuf,
    cache_dir: PathBuf,
    assets: AssetSet,
    retry: RetryPolicy,
}

impl AssetProvisioner {
    pub fn new(bundle_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>, assets: AssetSet) -> Self {
        Self {
            bundle_dir: bundle_dir.into(),
            cache_dir: cache_dir.into(),
            assets,
            retry: RetryPolicy::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(&config.bundle_dir, &config.cache_dir, AssetSet::from(config))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory and copy any missing file into it
    pub async fn ensure(&self) -> Result<ProvisionedAssets> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| AnalysisError::Provision {
                asset: self.cache_dir.display().to_string(),
                reason: format!("cannot create cache directory: {}", e),
            })?;

        let mut copied = Vec::new();
        for name in self.assets.files() {
            if self.ensure_file(name).await? {
                copied.push(name.to_string());
            }
        }

        if copied.is_empty() {
            debug!(dir = %self.cache_dir.display(), "model assets already cached");
        } else {
            info!(dir = %self.cache_dir.display(), files = ?copied, "copied bundled model assets");
        }

        Ok(ProvisionedAssets {
            dir: self.cache_dir.clone(),
            descriptor: self.cache_dir.join(&self.assets.descriptor),
            metadata: self.cache_dir.join(&self.assets.metadata),
            weights: self.assets.weights.iter().map(|w| self.cache_dir.join(w)).collect(),
            copied,
        })
    }

    /// Returns true when the file had to be copied
    async fn ensure_file(&self, name: &str) -> Result<bool> {
        let target = self.cache_dir.join(name);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(false);
        }

        let source = self.bundle_dir.join(name);
        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            return Err(AnalysisError::Provision {
                asset: name.to_string(),
                reason: format!("bundled resource missing at {}", source.display()),
            });
        }

        self.retry
            .execute(|| copy_atomic(&source, &target))
            .await
            .map_err(|e| AnalysisError::Provision {
                asset: name.to_string(),
                reason: format!("copy failed: {}", e),
            })?;

        Ok(true)
    }
}

/// Copy through a temporary sibling so a partial copy never looks cached
async fn copy_atomic(source: &Path, target: &Path) -> Result<()> {
    let mut partial = target.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    tokio::fs::copy(source, &partial).await?;
    if let Err(e) = tokio::fs::rename(&partial, target).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_set() -> AssetSet {
        AssetSet {
            descriptor: "model.json".to_string(),
            metadata: "metadata.json".to_string(),
            weights: vec!["weights.safetensors".to_string()],
        }
    }

    fn write_bundle(dir: &Path) {
        std::fs::write(dir.join("model.json"), br#"{"hidden": []}"#).unwrap();
        std::fs::write(dir.join("metadata.json"), br#"{"labels": ["a"]}"#).unwrap();
        std::fs::write(dir.join("weights.safetensors"), b"blob").unwrap();
    }

    #[tokio::test]
    async fn test_first_run_copies_everything() {
        let bundle = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        write_bundle(bundle.path());

        let target = cache.path().join("nested").join("model");
        let provisioner = AssetProvisioner::new(bundle.path(), &target, asset_set());
        let assets = provisioner.ensure().await.unwrap();

        assert_eq!(assets.copied.len(), 3);
        assert!(assets.descriptor.exists());
        assert!(assets.metadata.exists());
        assert_eq!(std::fs::read(&assets.weights[0]).unwrap(), b"blob");
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let bundle = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        write_bundle(bundle.path());

        let provisioner = AssetProvisioner::new(bundle.path(), cache.path(), asset_set());
        provisioner.ensure().await.unwrap();
        let again = provisioner.ensure().await.unwrap();

        assert!(again.copied.is_empty());
    }

    #[tokio::test]
    async fn test_only_missing_file_is_copied() {
        let bundle = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        write_bundle(bundle.path());

        let provisioner = AssetProvisioner::new(bundle.path(), cache.path(), asset_set());
        provisioner.ensure().await.unwrap();
        std::fs::remove_file(cache.path().join("metadata.json")).unwrap();

        let again = provisioner.ensure().await.unwrap();
        assert_eq!(again.copied, vec!["metadata.json".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_bundled_resource() {
        let bundle = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(bundle.path().join("model.json"), b"{}").unwrap();

        let provisioner = AssetProvisioner::new(bundle.path(), cache.path(), asset_set());
        let err = provisioner.ensure().await.unwrap_err();

        match err {
            AnalysisError::Provision { asset, .. } => assert_eq!(asset, "metadata.json"),
            other => panic!("expected provision error, got {:?}", other),
        }
    }
}
