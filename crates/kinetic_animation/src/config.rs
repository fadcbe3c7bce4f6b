//! Animator configuration
//!
//! Loaded from a TOML document such as:
//!
//! ```toml
//! quantum_ms = 8
//! thread_name = "ui-animator"
//! ```
//!
//! Missing keys fall back to their defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default minimum gap between two dispatched steps
pub const DEFAULT_QUANTUM_MS: u64 = 5;

/// Default name of the worker thread
pub const DEFAULT_THREAD_NAME: &str = "kinetic-animator";

/// Configuration for an [`Animator`](crate::Animator)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnimatorConfig {
    /// Milliseconds the worker waits before dispatching each step
    #[serde(default = "default_quantum_ms")]
    pub quantum_ms: u64,
    /// Name given to the worker thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_quantum_ms() -> u64 {
    DEFAULT_QUANTUM_MS
}

fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            quantum_ms: default_quantum_ms(),
            thread_name: default_thread_name(),
        }
    }
}

impl AnimatorConfig {
    /// Set the step quantum (builder pattern)
    pub fn with_quantum(mut self, quantum: Duration) -> Self {
        self.quantum_ms = u64::try_from(quantum.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the worker thread name (builder pattern)
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnimatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "thread_name must not be empty".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::Invalid(
                "thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnimatorConfig::default();
        assert_eq!(config.quantum(), Duration::from_millis(5));
        assert_eq!(config.thread_name, "kinetic-animator");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnimatorConfig::from_toml_str("quantum_ms = 16").unwrap();
        assert_eq!(config.quantum_ms, 16);
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);

        let config = AnimatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnimatorConfig::default());
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            AnimatorConfig::from_toml_str("quantum_ms = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AnimatorConfig::from_toml_str("thread_name = \"  \""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AnimatorConfig::default()
            .with_quantum(Duration::from_millis(2))
            .with_thread_name("ui-anim");
        let text = config.to_toml().unwrap();
        assert_eq!(AnimatorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AnimatorConfig::load(Path::new("/nonexistent/kinetic.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
