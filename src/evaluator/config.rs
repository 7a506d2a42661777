//! Evaluator configuration.
//!
//! Thresholds are configuration, not constants. Values are layered:
//! built-in defaults, then an optional YAML/JSON file, then environment
//! variables, then whatever the caller sets explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable for [`EvaluatorConfig::warning_threshold`].
pub const ENV_WARNING_THRESHOLD: &str = "EVAL_WARNING_THRESHOLD";
/// Environment variable for [`EvaluatorConfig::duration_threshold`].
pub const ENV_DURATION_THRESHOLD: &str = "EVAL_DURATION_THRESHOLD_SECS";
/// Environment variable for [`EvaluatorConfig::fail_on_parse_warnings`].
pub const ENV_FAIL_ON_PARSE_WARNINGS: &str = "EVAL_FAIL_ON_PARSE_WARNINGS";

/// Options recognized by the metrics evaluator.
///
/// Unknown keys in a config file are ignored; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Maximum number of WARNING events before `warning_count` fails.
    pub warning_threshold: u64,
    /// Maximum run duration in seconds; `None` keeps `duration` informational.
    pub duration_threshold: Option<f64>,
    /// Emit a failing `artifact_integrity` metric when lines were skipped.
    pub fail_on_parse_warnings: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 0,
            duration_threshold: None,
            fail_on_parse_warnings: false,
        }
    }
}

impl EvaluatorConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads defaults, the optional file, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or a value
    /// is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML (or JSON) config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EVAL_WARNING_THRESHOLD`: allowed WARNING events (default: 0)
    /// - `EVAL_DURATION_THRESHOLD_SECS`: maximum run duration (default: unset)
    /// - `EVAL_FAIL_ON_PARSE_WARNINGS`: fail on skipped lines (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Overlays environment variables onto this configuration.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Overlays values from `lookup` onto this configuration.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_WARNING_THRESHOLD) {
            self.warning_threshold = parse_env_value(&val, ENV_WARNING_THRESHOLD)?;
        }

        if let Some(val) = lookup(ENV_DURATION_THRESHOLD) {
            self.duration_threshold = if val.trim().is_empty() {
                None
            } else {
                Some(parse_env_value(&val, ENV_DURATION_THRESHOLD)?)
            };
        }

        if let Some(val) = lookup(ENV_FAIL_ON_PARSE_WARNINGS) {
            self.fail_on_parse_warnings = parse_env_bool(&val, ENV_FAIL_ON_PARSE_WARNINGS)?;
        }

        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.duration_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "duration_threshold must be a non-negative number, got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }

    /// Sets the warning threshold.
    pub fn with_warning_threshold(mut self, threshold: u64) -> Self {
        self.warning_threshold = threshold;
        self
    }

    /// Sets the duration threshold in seconds.
    pub fn with_duration_threshold(mut self, secs: f64) -> Self {
        self.duration_threshold = Some(secs);
        self
    }

    /// Enables or disables failing on skipped lines.
    pub fn with_fail_on_parse_warnings(mut self, enabled: bool) -> Self {
        self.fail_on_parse_warnings = enabled;
        self
    }
}

/// Parse an environment variable value.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.warning_threshold, 0);
        assert_eq!(config.duration_threshold, None);
        assert!(!config.fail_on_parse_warnings);
    }

    #[test]
    fn test_config_builder() {
        let config = EvaluatorConfig::new()
            .with_warning_threshold(3)
            .with_duration_threshold(45.0)
            .with_fail_on_parse_warnings(true);

        assert_eq!(config.warning_threshold, 3);
        assert_eq!(config.duration_threshold, Some(45.0));
        assert!(config.fail_on_parse_warnings);
    }

    #[test]
    fn test_merge_vars() {
        let config = EvaluatorConfig::default()
            .merge_vars(vars(&[
                (ENV_WARNING_THRESHOLD, "2"),
                (ENV_DURATION_THRESHOLD, "30.5"),
                (ENV_FAIL_ON_PARSE_WARNINGS, "yes"),
                ("EVAL_SOMETHING_ELSE", "ignored"),
            ]))
            .unwrap();

        assert_eq!(config.warning_threshold, 2);
        assert_eq!(config.duration_threshold, Some(30.5));
        assert!(config.fail_on_parse_warnings);
    }

    #[test]
    fn test_merge_vars_rejects_bad_values() {
        let err = EvaluatorConfig::default()
            .merge_vars(vars(&[(ENV_WARNING_THRESHOLD, "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_WARNING_THRESHOLD));

        assert!(EvaluatorConfig::default()
            .merge_vars(vars(&[(ENV_FAIL_ON_PARSE_WARNINGS, "sometimes")]))
            .is_err());
    }

    #[test]
    fn test_from_file_ignores_unknown_keys_and_defaults_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("eval.yaml");
        std::fs::write(&path, "warning_threshold: 4\nexperience_variant: fast\n").unwrap();

        let config = EvaluatorConfig::from_file(&path).unwrap();
        assert_eq!(config.warning_threshold, 4);
        assert_eq!(config.duration_threshold, None);
        assert!(!config.fail_on_parse_warnings);
    }

    #[test]
    fn test_from_file_accepts_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("eval.json");
        std::fs::write(&path, r#"{"duration_threshold": 12.0, "fail_on_parse_warnings": true}"#).unwrap();

        let config = EvaluatorConfig::from_file(&path).unwrap();
        assert_eq!(config.duration_threshold, Some(12.0));
        assert!(config.fail_on_parse_warnings);
    }

    #[test]
    fn test_from_file_empty_is_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("eval.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(EvaluatorConfig::from_file(&path).unwrap(), EvaluatorConfig::default());
    }

    #[test]
    fn test_from_file_missing() {
        let temp = TempDir::new().unwrap();
        let err = EvaluatorConfig::from_file(&temp.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let config = EvaluatorConfig::new().with_duration_threshold(-1.0);
        assert!(config.validate().is_err());
    }
}
