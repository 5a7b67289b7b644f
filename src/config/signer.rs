//! Typed view of the merged configuration

use std::path::PathBuf;

use serde::Deserialize;

use super::effective::ConfigError;

/// Settings the signer consumes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignerConfig {
    pub validator: ValidatorSettings,
    pub log: LogSettings,
}

/// Where to find the validator libraries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidatorSettings {
    /// Library exporting the validator object
    pub dxil_path: PathBuf,
    /// Library exporting blob creation and UTF-8 conversion
    pub dxcompiler_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl SignerConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.validator.dxil_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "validator.dxil_path must not be empty".to_string(),
            ));
        }
        if self.validator.dxcompiler_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "validator.dxcompiler_path must not be empty".to_string(),
            ));
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log.filter must not be empty".to_string()));
        }
        Ok(())
    }
}
