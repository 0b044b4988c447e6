//! Error types raised by the profiling engine.
//!
//! The engine degrades gracefully on messy data: unparsable cells, empty
//! columns and absent configuration keys all have defined outcomes. Only two
//! narrow failure kinds escape the engine itself, plus one for the loader that
//! feeds it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// Supplied configuration is structurally invalid.
    #[error("Invalid configuration for '{key}': {message}")]
    Configuration { key: String, message: String },

    /// An internal consistency check failed. Always a bug.
    #[error("Invariant violated for column '{column}': {message}")]
    InvariantViolation { column: String, message: String },

    /// Input could not be turned into a table snapshot.
    #[error("Invalid input ({context}): {message}")]
    Input { context: String, message: String },
}

pub type Result<T> = std::result::Result<T, ProfileError>;

impl ProfileError {
    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invariant(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn input(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
