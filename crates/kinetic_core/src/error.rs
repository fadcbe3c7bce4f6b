//! Error types shared by the property and context capabilities

use thiserror::Error;

use crate::value::ValueKind;

/// Failure while writing a value through a [`Setter`](crate::Setter)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// The setter was handed a target of another type
    #[error("Setter expects a target of type {expected}")]
    TargetMismatch { expected: &'static str },

    /// The setter was handed a value of another kind
    #[error("Property expects {expected} but received {actual}")]
    ValueMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// The target refused the value
    #[error("Property write rejected: {0}")]
    Rejected(String),
}

/// Failure while executing an animation step on the UI context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// Applying a value to `property` failed
    #[error("Failed to set '{property}': {source}")]
    Property {
        property: String,
        #[source]
        source: PropertyError,
    },

    /// A step or dispatch panicked
    #[error("Animation step panicked: {0}")]
    Panicked(String),
}

impl StepError {
    /// Build a [`StepError::Panicked`] from a `catch_unwind` payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        StepError::Panicked(message)
    }
}

/// Result type for property writes
pub type Result<T> = std::result::Result<T, PropertyError>;
