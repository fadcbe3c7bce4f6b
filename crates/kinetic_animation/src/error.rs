//! Error types for kinetic_animation

use std::path::PathBuf;

use kinetic_core::ValueKind;
use thiserror::Error;

/// Errors reported synchronously to the caller of an animation request
///
/// These are raised before any timing state exists, so a failed request
/// leaves the animator untouched.
#[derive(Error, Debug)]
pub enum AnimationError {
    /// Property name was empty
    #[error("Property name must not be empty")]
    EmptyPropertyName,

    /// Pulsation count below zero
    #[error("Pulsation count must not be negative (got {0})")]
    NegativePulsations(i32),

    /// Target type has no such property
    #[error("Type {target} has no property '{property}'")]
    PropertyNotFound {
        target: &'static str,
        property: String,
    },

    /// Property exists but has no setter
    #[error("Property '{property}' on {target} is not writable")]
    PropertyNotWritable {
        target: &'static str,
        property: String,
    },

    /// Animated values do not match the property's declared kind
    #[error("Property '{property}' holds {expected} values, cannot animate it with {actual}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// No interpolator registered for the value kind
    #[error("Interpolation unsupported for value kind {0}")]
    UnsupportedValueKind(ValueKind),

    /// The worker thread has been shut down
    #[error("Animation worker is not running")]
    AnimatorStopped,

    /// The worker thread could not be started
    #[error("Failed to spawn animation worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Invalid animator configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors loading or validating an [`AnimatorConfig`](crate::AnimatorConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse animator config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize animator config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed but semantically invalid
    #[error("Invalid animator config: {0}")]
    Invalid(String),
}

/// Result type for kinetic_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
