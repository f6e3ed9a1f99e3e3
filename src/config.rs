//! Converter tunables loaded from TOML, following the same shape as the
//! engine's other config surfaces.

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for the conversion session.
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    /// Number of trailing segments kept as conversion context after a
    /// finished conversion.
    #[serde(default = "default_max_history_segments")]
    pub max_history_segments: usize,
}

fn default_max_history_segments() -> usize {
    4
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_history_segments: default_max_history_segments(),
        }
    }
}

pub fn parse_config_toml(toml_str: &str) -> Result<ConverterConfig, ConfigError> {
    let config: ConverterConfig =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConverterConfig) -> Result<(), ConfigError> {
    if config.max_history_segments == 0 {
        return Err(ConfigError::InvalidValue {
            field: "max_history_segments",
            reason: "must be positive",
        });
    }
    Ok(())
}
