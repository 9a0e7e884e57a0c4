//! Error types for the pendulum simulator.
//!
//! All fallible operations return `Result<T, SimError>` instead of panicking.

use thiserror::Error;

use crate::engine::state::KinematicState;

/// Result type alias for simulator operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all simulator operations.
///
/// Both physics-level kinds (`InvalidParameter`, `NumericalInstability`) are
/// unrecoverable for the current run: the integration is deterministic, so
/// retrying with identical inputs reproduces the failure.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Construction Errors =====
    /// A physical constant or integration setting is out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "m1", "h").
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    // ===== Jidoka Violations =====
    /// A derivative stage or state component became NaN or infinite.
    #[error("numerical instability at step {step}: non-finite {location} (state: {state})")]
    NumericalInstability {
        /// Index of the grid step being advanced when the value appeared.
        step: usize,
        /// Component that went non-finite (e.g. "k2.du", "state.u").
        location: String,
        /// State the step started from.
        state: KinematicState,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration document.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a numerical-instability error.
    #[must_use]
    pub fn instability(step: usize, location: impl Into<String>, state: KinematicState) -> Self {
        Self::NumericalInstability {
            step,
            location: location.into(),
            state,
        }
    }

    /// Check if this error is a Jidoka stop (instability found mid-run).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(self, Self::NumericalInstability { .. })
    }

    /// Check if this error was raised while validating inputs.
    #[must_use]
    pub const fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

impl From<validator::ValidationErrors> for SimError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(ToString::to_string)
            .collect();
        fields.sort();
        let name = fields.first().cloned().unwrap_or_else(|| "config".to_string());
        Self::InvalidParameter {
            name,
            reason: errors.to_string(),
        }
    }
}
