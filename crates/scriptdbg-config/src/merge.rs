use crate::config::Config;
use crate::error::ConfigError;

/// Merge an overlay TOML fragment on top of a base [`Config`].
///
/// Values present in `overlay_toml` override those in `base`.
/// Missing keys in the overlay keep their `base` values.
/// Works by converting both sides to [`toml::Value`] tables,
/// deep-merging, then deserializing back to [`Config`].
pub fn merge_configs(base: &Config, overlay_toml: &str) -> Result<Config, ConfigError> {
    let base_str = toml::to_string(base).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut base_val: toml::Value =
        toml::from_str(&base_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let overlay_val: toml::Value =
        toml::from_str(overlay_toml).map_err(|e| ConfigError::Parse(e.to_string()))?;

    merge_values(&mut base_val, &overlay_val);

    let merged: Config = base_val
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

    Ok(merged)
}

/// Fold `overlay` into `base`: nested tables merge per key, anything else
/// (scalars, arrays, a table replacing a scalar) overwrites.
fn merge_values(base: &mut toml::Value, overlay: &toml::Value) {
    let (Some(base_table), Some(overlay_table)) = (base.as_table_mut(), overlay.as_table()) else {
        *base = overlay.clone();
        return;
    };
    for (key, value) in overlay_table {
        match base_table.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base_table.insert(key.clone(), value.clone());
            }
        }
    }
}
