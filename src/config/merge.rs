//! Configuration merge logic
//!
//! - Tables: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use toml::Value;

/// Deep merge two TOML values.
///
/// Tables merge recursively; anything else in the overlay replaces the base,
/// including arrays and values of a different type.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(mut base_map), Value::Table(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Table(base_map)
        }

        // Arrays: REPLACE (no concatenation)
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        (_, overlay) => overlay,
    }
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Table(toml::Table::new()), deep_merge)
}
