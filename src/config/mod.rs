//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. User config file (`$DXIL_SIGN_CONFIG` or `<config dir>/dxil-sign/config.toml`)
//! 3. `DXIL_SIGN_*` environment overrides

mod defaults;
mod effective;
mod env;
mod merge;
mod signer;

pub use defaults::{platform_library_name, BuiltinDefaults, DEFAULT_LOG_FILTER};
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use env::{
    ConfigEnvironment, UserConfigLocation, CONFIG_PATH_VAR, DXCOMPILER_PATH_VAR, DXIL_PATH_VAR,
    LOG_FILTER_VAR,
};
pub use merge::{deep_merge, merge_layers};
pub use signer::{LogSettings, SignerConfig, ValidatorSettings};

/// Build and type-check configuration from an environment snapshot
pub fn load(env: &ConfigEnvironment) -> Result<(SignerConfig, EffectiveConfig), ConfigError> {
    let user_config = env.user_config();
    let effective = EffectiveConfig::build(user_config.as_ref(), env.overrides())?;
    let signer = effective.signer_config()?;
    Ok((signer, effective))
}
