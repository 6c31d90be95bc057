//! Configuration schema (dbtlens.toml)

use serde::{Deserialize, Serialize};

/// Thresholds for the analysis rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Minimum execution time (seconds) before a model counts as heavy
    #[serde(default = "default_min_execution_time")]
    pub min_execution_time_seconds: f64,

    /// Minimum rows affected before a model counts as heavy
    #[serde(default = "default_min_rows")]
    pub min_rows_for_heavy: u64,

    /// Maximum transitive upstream count before a chain is flagged
    #[serde(default = "default_max_depth")]
    pub max_dependency_depth: usize,

    /// Minimum direct dependents for fan-out detection
    #[serde(default = "default_min_downstream")]
    pub min_downstream_count: usize,
}

fn default_min_execution_time() -> f64 {
    60.0
}

fn default_min_rows() -> u64 {
    100_000
}

fn default_max_depth() -> usize {
    8
}

fn default_min_downstream() -> usize {
    3
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_execution_time_seconds: default_min_execution_time(),
            min_rows_for_heavy: default_min_rows(),
            max_dependency_depth: default_max_depth(),
            min_downstream_count: default_min_downstream(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rule thresholds
    #[serde(default)]
    pub rules: RuleConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.rules.min_execution_time_seconds, 60.0);
        assert_eq!(config.rules.min_rows_for_heavy, 100_000);
        assert_eq!(config.rules.max_dependency_depth, 8);
        assert_eq!(config.rules.min_downstream_count, 3);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [rules]
            max_dependency_depth = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.max_dependency_depth, 4);
        assert_eq!(config.rules.min_execution_time_seconds, 60.0);
    }

    #[test]
    fn empty_toml_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.rules.min_execution_time_seconds = 30.0;

        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::from_toml("rules = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
