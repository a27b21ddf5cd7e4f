//! Typed configuration, loaded from environment variables with an optional
//! TOML override file. Environment variables win over the file, matching
//! the layering convention the rest of this stack uses.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::reasoner::EndpointConfig;
use crate::types::ConfigError;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GatewayConfigFile {
    pub chronicle_secured: Option<bool>,
    pub chronicle_data_dir: Option<String>,
    pub reasoner_cloud_url: Option<String>,
    pub reasoner_sovereign_url: Option<String>,
    pub reasoner_cloud_key: Option<String>,
    pub precheck_model: Option<String>,
    pub forge_model: Option<String>,
    pub forge_backstop_model: Option<String>,
    pub adversary_model: Option<String>,
    pub final_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub chronicle_secured: bool,
    pub chronicle_data_dir: PathBuf,
    pub reasoner: EndpointConfig,
}

impl GatewayConfig {
    /// Load from `SENATE_CONFIG` (a TOML file, if set) and then apply
    /// environment variable overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("SENATE_CONFIG") {
            Ok(path) => Self::load_file(Path::new(&path))?,
            Err(_) => GatewayConfigFile::default(),
        };
        Ok(Self::merge(file))
    }

    fn load_file(path: &Path) -> Result<GatewayConfigFile, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn merge(file: GatewayConfigFile) -> Self {
        let env_bool = |key: &str| std::env::var(key).ok().map(|v| v == "true" || v == "1");

        Self {
            chronicle_secured: env_bool("CHRONICLE_SECURED").or(file.chronicle_secured).unwrap_or(false),
            chronicle_data_dir: std::env::var("CHRONICLE_DATA_DIR")
                .ok()
                .or(file.chronicle_data_dir)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            reasoner: EndpointConfig {
                cloud_url: std::env::var("REASONER_CLOUD_URL").ok().or(file.reasoner_cloud_url),
                sovereign_url: std::env::var("REASONER_SOVEREIGN_URL").ok().or(file.reasoner_sovereign_url),
                cloud_key: std::env::var("REASONER_CLOUD_KEY").ok().or(file.reasoner_cloud_key),
                precheck_model: std::env::var("PRECHECK_MODEL").ok().or(file.precheck_model),
                forge_model: std::env::var("FORGE_MODEL").ok().or(file.forge_model),
                forge_backstop_model: std::env::var("FORGE_BACKSTOP_MODEL").ok().or(file.forge_backstop_model),
                adversary_model: std::env::var("ADVERSARY_MODEL").ok().or(file.adversary_model),
                final_model: std::env::var("FINAL_MODEL").ok().or(file.final_model),
            },
        }
    }
}
