//! Effective configuration with full provenance
//!
//! Captures the merged configuration plus where each layer came from, so a
//! debug log can say exactly which file steered the validator lookup.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toml::Value;

use super::defaults::BuiltinDefaults;
use super::env::UserConfigLocation;
use super::merge::merge_layers;
use super::signer::SignerConfig;

/// Origin of a configuration source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Builtin,
    User,
    Env,
}

/// A contributing config source with provenance
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/env)
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/env)
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// The merged configuration table
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective config from layers
    pub fn build(
        user_config: Option<&UserConfigLocation>,
        env_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: User config file
        if let Some(location) = user_config {
            let path = location.path();
            match location {
                UserConfigLocation::Explicit(_) if !path.exists() => {
                    return Err(ConfigError::MissingFile { path: path.clone() });
                }
                UserConfigLocation::Default(_) if !path.exists() => {}
                _ => {
                    let (value, digest) = Self::load_toml_file(path)?;
                    layers.push(value);
                    sources.push(ConfigSource {
                        origin: ConfigOrigin::User,
                        path: Some(path.to_string_lossy().to_string()),
                        digest: Some(digest),
                    });
                }
            }
        }

        // Layer 3: Environment overrides
        if let Some(overrides) = env_overrides {
            layers.push(overrides);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Env,
                path: None,
                digest: None,
            });
        }

        Ok(Self {
            config: merge_layers(layers),
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let digest = hex::encode(Sha256::digest(&bytes));

        let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!("invalid UTF-8: {e}"),
        })?;

        let table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok((Value::Table(table), digest))
    }

    /// Deserialize the merged table and check the values make sense
    pub fn signer_config(&self) -> Result<SignerConfig, ConfigError> {
        let config: SignerConfig = self
            .config
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("config file {} does not exist", .path.display())]
    MissingFile { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
