//! Configuration for a mapping session

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How numeric target types accept produced values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// JSON numbers and strings that parse as a finite number
    #[default]
    Loose,
    /// JSON numbers only
    Strict,
}

impl std::fmt::Display for NumericPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericPolicy::Loose => write!(f, "loose"),
            NumericPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for NumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loose" => Ok(NumericPolicy::Loose),
            "strict" => Ok(NumericPolicy::Strict),
            _ => Err(format!("Unknown numeric policy: {}", s)),
        }
    }
}

/// Resource limits for evaluating generated and user-written code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptLimits {
    /// Evaluation steps (statements plus expressions) per run
    pub max_steps: usize,
    /// Nested function calls
    pub max_call_depth: usize,
    /// Nested statement and expression evaluation, counted across calls
    pub max_nesting: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_call_depth: 64,
            max_nesting: 256,
        }
    }
}

/// Configuration for a mapping session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Numeric matching policy used by the output validator
    pub numeric_policy: NumericPolicy,
    /// Limits applied when previewing
    pub limits: ScriptLimits,
}

impl SessionConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the numeric policy
    pub fn with_numeric_policy(mut self, policy: NumericPolicy) -> Self {
        self.numeric_policy = policy;
        self
    }

    /// Set the evaluation step budget
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.limits.max_steps = steps;
        self
    }

    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.limits.max_call_depth = depth;
        self
    }

    /// Set the maximum evaluation nesting
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.limits.max_nesting = depth;
        self
    }
}

/// Errors loading a session config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.numeric_policy, NumericPolicy::Loose);
        assert_eq!(config.limits.max_steps, 100_000);
        assert_eq!(config.limits.max_call_depth, 64);
        assert_eq!(config.limits.max_nesting, 256);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_numeric_policy(NumericPolicy::Strict)
            .with_max_steps(500)
            .with_max_call_depth(4)
            .with_max_nesting(32);
        assert_eq!(config.numeric_policy, NumericPolicy::Strict);
        assert_eq!(config.limits.max_steps, 500);
        assert_eq!(config.limits.max_call_depth, 4);
        assert_eq!(config.limits.max_nesting, 32);
    }

    #[test]
    fn test_from_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
numeric_policy = "strict"

[limits]
max_steps = 2000
"#,
        )
        .unwrap();
        assert_eq!(config.numeric_policy, NumericPolicy::Strict);
        assert_eq!(config.limits.max_steps, 2000);
        assert_eq!(config.limits.max_call_depth, 64);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = SessionConfig::from_toml_str("numeric = \"loose\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_numeric_policy_parse() {
        assert_eq!("LOOSE".parse::<NumericPolicy>().unwrap(), NumericPolicy::Loose);
        assert_eq!("strict".parse::<NumericPolicy>().unwrap(), NumericPolicy::Strict);
        assert!("fuzzy".parse::<NumericPolicy>().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionConfig::load(Path::new("/nonexistent/mapper.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
