//! Process environment inputs to configuration

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Names a config file explicitly; the file must then exist
pub const CONFIG_PATH_VAR: &str = "DXIL_SIGN_CONFIG";
/// Overrides `validator.dxil_path`
pub const DXIL_PATH_VAR: &str = "DXIL_SIGN_DXIL_PATH";
/// Overrides `validator.dxcompiler_path`
pub const DXCOMPILER_PATH_VAR: &str = "DXIL_SIGN_DXCOMPILER_PATH";
/// Overrides `log.filter`
pub const LOG_FILTER_VAR: &str = "DXIL_SIGN_LOG";

const APP_DIR: &str = "dxil-sign";
const CONFIG_FILE: &str = "config.toml";

/// Where the user config layer comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserConfigLocation {
    /// Named by `DXIL_SIGN_CONFIG`; absence is an error
    Explicit(PathBuf),
    /// Platform default; absence is fine
    Default(PathBuf),
}

impl UserConfigLocation {
    pub fn path(&self) -> &PathBuf {
        match self {
            UserConfigLocation::Explicit(path) | UserConfigLocation::Default(path) => path,
        }
    }
}

/// Snapshot of the environment variables that feed configuration.
///
/// Captured once so config building itself never touches process state.
#[derive(Debug, Clone, Default)]
pub struct ConfigEnvironment {
    pub config_file: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub dxil_path: Option<String>,
    pub dxcompiler_path: Option<String>,
    pub log_filter: Option<String>,
}

impl ConfigEnvironment {
    /// Read the current process environment. Empty values count as unset.
    pub fn from_process() -> Self {
        Self {
            config_file: var_os(CONFIG_PATH_VAR).map(PathBuf::from),
            config_dir: platform_config_dir(),
            dxil_path: var(DXIL_PATH_VAR),
            dxcompiler_path: var(DXCOMPILER_PATH_VAR),
            log_filter: var(LOG_FILTER_VAR),
        }
    }

    /// Resolve the user config file, if there is any candidate at all
    pub fn user_config(&self) -> Option<UserConfigLocation> {
        if let Some(path) = &self.config_file {
            return Some(UserConfigLocation::Explicit(path.clone()));
        }
        self.config_dir
            .as_ref()
            .map(|dir| UserConfigLocation::Default(dir.join(APP_DIR).join(CONFIG_FILE)))
    }

    /// Environment override layer, `None` when no override variable is set
    pub fn overrides(&self) -> Option<toml::Value> {
        let mut validator = toml::Table::new();
        if let Some(path) = &self.dxil_path {
            validator.insert("dxil_path".to_string(), toml::Value::String(path.clone()));
        }
        if let Some(path) = &self.dxcompiler_path {
            validator.insert(
                "dxcompiler_path".to_string(),
                toml::Value::String(path.clone()),
            );
        }

        let mut root = toml::Table::new();
        if !validator.is_empty() {
            root.insert("validator".to_string(), toml::Value::Table(validator));
        }
        if let Some(filter) = &self.log_filter {
            let mut log = toml::Table::new();
            log.insert("filter".to_string(), toml::Value::String(filter.clone()));
            root.insert("log".to_string(), toml::Value::Table(log));
        }

        if root.is_empty() {
            None
        } else {
            Some(toml::Value::Table(root))
        }
    }
}

fn var_os(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}

fn var(name: &str) -> Option<String> {
    var_os(name).map(|value| value.to_string_lossy().into_owned())
}

#[cfg(windows)]
fn platform_config_dir() -> Option<PathBuf> {
    var_os("APPDATA").map(PathBuf::from)
}

#[cfg(not(windows))]
fn platform_config_dir() -> Option<PathBuf> {
    var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .or_else(|| var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}
