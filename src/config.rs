use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `vision.api_key`
pub const API_KEY_ENV: &str = "EYECHECK_VISION_API_KEY";

/// Default label/color detection endpoint
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Where the model assets live and how the lifecycle behaves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Read-only directory holding the bundled assets
    pub bundle_dir: PathBuf,

    /// Writable directory the assets are copied into on first use
    pub cache_dir: PathBuf,

    /// Classifier architecture file
    pub descriptor: String,

    /// Labels and input contract
    pub metadata: String,

    /// Weight blobs, in load order
    pub weights: Vec<String>,

    /// Load on first `infer()` instead of failing with NotReady
    pub lazy_load: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eyecheck")
            .join("model");

        Self {
            bundle_dir: PathBuf::from("assets/model"),
            cache_dir,
            descriptor: "model.json".to_string(),
            metadata: "metadata.json".to_string(),
            weights: vec!["weights.safetensors".to_string()],
            lazy_load: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_labels: u32,
    pub max_colors: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            api_key: None,
            max_labels: 15,
            max_colors: 5,
        }
    }
}

impl VisionConfig {
    /// API key from the environment, falling back to the file value
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Which scoring backend serves `analyze()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// On-device classifier
    #[default]
    Model,
    /// Label/color detection service + keyword heuristic
    Cloud,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" => Ok(BackendKind::Model),
            "cloud" => Ok(BackendKind::Cloud),
            other => Err(format!("unknown backend '{}' (expected model or cloud)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub backend: BackendKind,

    /// Budget for one whole `analyze()` call
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Model,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".eyecheck").join("config.toml"))
    }
}
