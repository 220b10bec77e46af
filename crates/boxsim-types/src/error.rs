//! Error types for engine operations.

use thiserror::Error;

/// Errors that can occur while configuring or mutating a scene.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// The fixed timestep is not positive and finite.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A body or box definition is out of range.
    #[error("invalid definition: {reason}")]
    InvalidDefinition {
        /// Description of what's wrong with the definition.
        reason: String,
    },

    /// A handle referenced a body that does not exist.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(u32),
}

impl PhysicsError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid definition error.
    #[must_use]
    pub fn invalid_def(reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidTimestep(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhysicsError::InvalidTimestep(-0.5);
        assert!(err.to_string().contains("-0.5"));

        let err = PhysicsError::invalid_def("extents cannot be negative");
        assert!(err.to_string().contains("extents"));

        let err = PhysicsError::InvalidBodyId(3);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_error_predicates() {
        assert!(PhysicsError::InvalidTimestep(0.0).is_config_error());
        assert!(PhysicsError::invalid_config("bad").is_config_error());
        assert!(!PhysicsError::invalid_def("bad").is_config_error());
    }
}
