//! Built-in defaults (layer 1)
//!
//! Library names follow the platform's shared-library convention so the
//! dynamic loader's own search path finds an installed validator.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};

/// Default log filter when neither `RUST_LOG` nor config sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Built-in default configuration values
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    /// Validator library (default: `dxil.dll` / `libdxil.so` / `libdxil.dylib`)
    pub dxil_path: String,

    /// Companion library providing blob and text helpers
    pub dxcompiler_path: String,

    /// tracing filter directive (default: "info")
    pub log_filter: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            dxil_path: platform_library_name("dxil"),
            dxcompiler_path: platform_library_name("dxcompiler"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to a TOML table for merging
    pub fn to_value(&self) -> toml::Value {
        let mut validator = toml::Table::new();
        validator.insert(
            "dxil_path".to_string(),
            toml::Value::String(self.dxil_path.clone()),
        );
        validator.insert(
            "dxcompiler_path".to_string(),
            toml::Value::String(self.dxcompiler_path.clone()),
        );

        let mut log = toml::Table::new();
        log.insert(
            "filter".to_string(),
            toml::Value::String(self.log_filter.clone()),
        );

        let mut root = toml::Table::new();
        root.insert("validator".to_string(), toml::Value::Table(validator));
        root.insert("log".to_string(), toml::Value::Table(log));
        toml::Value::Table(root)
    }
}

/// `dxil` → `libdxil.so` on Linux, `dxil.dll` on Windows
pub fn platform_library_name(stem: &str) -> String {
    format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.log_filter, "info");
        assert!(defaults.dxil_path.contains("dxil"));
        assert!(defaults.dxcompiler_path.contains("dxcompiler"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_library_names() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.dxil_path, "libdxil.so");
        assert_eq!(defaults.dxcompiler_path, "libdxcompiler.so");
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_library_names() {
        assert_eq!(platform_library_name("dxil"), "dxil.dll");
    }

    #[test]
    fn test_to_value() {
        let defaults = BuiltinDefaults::default();
        let value = defaults.to_value();

        assert_eq!(value["log"]["filter"].as_str(), Some("info"));
        assert_eq!(
            value["validator"]["dxil_path"].as_str(),
            Some(defaults.dxil_path.as_str())
        );
    }
}
