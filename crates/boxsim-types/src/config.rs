//! Scene configuration.
//!
//! A scene runs at a **fixed** timestep; variable stepping is not
//! supported. The configuration is validated once at scene construction.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`Scene`](https://docs.rs/boxsim-core).
///
/// # Example
///
/// ```
/// use boxsim_types::SceneConfig;
/// use nalgebra::Vector3;
///
/// let config = SceneConfig::default()
///     .with_gravity(Vector3::new(0.0, -9.8, 0.0))
///     .with_iterations(10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SceneConfig {
    /// Fixed timestep in seconds.
    pub timestep: f64,
    /// World gravity acceleration.
    pub gravity: Vector3<f64>,
    /// Number of solver iterations per island. Clamped to at least 1.
    pub iterations: usize,
    /// Whether the solver applies Coulomb friction.
    pub enable_friction: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            iterations: 20,
            enable_friction: true,
        }
    }
}

impl SceneConfig {
    /// A configuration with the given timestep and everything else default.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vector3::zeros();
        self
    }

    /// Set the solver iteration count (clamped to at least 1).
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Enable or disable friction.
    #[must_use]
    pub fn with_friction(mut self, enabled: bool) -> Self {
        self.enable_friction = enabled;
        self
    }

    /// The step frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(crate::PhysicsError::InvalidTimestep(self.timestep));
        }
        if self.timestep > 1.0 {
            return Err(crate::PhysicsError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }
        if !self.gravity.iter().all(|x| x.is_finite()) {
            return Err(crate::PhysicsError::invalid_config(
                "gravity must be finite",
            ));
        }
        if self.iterations == 0 {
            return Err(crate::PhysicsError::invalid_config(
                "iterations must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.timestep, 1.0 / 60.0, epsilon = 1e-12);
        assert_eq!(config.iterations, 20);
        assert!(config.enable_friction);
    }

    #[test]
    fn test_iterations_clamped() {
        let config = SceneConfig::default().with_iterations(0);
        assert_eq!(config.iterations, 1);
    }

    #[test]
    fn test_validation() {
        let mut config = SceneConfig::default();
        config.timestep = 0.0;
        assert!(config.validate().is_err());
        config.timestep = f64::NAN;
        assert!(config.validate().is_err());
        config.timestep = 2.0;
        assert!(config.validate().is_err());

        let mut config = SceneConfig::default();
        config.gravity.y = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = SceneConfig::default();
        config.iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frequency() {
        let config = SceneConfig::with_timestep(0.01);
        assert_relative_eq!(config.frequency(), 100.0, epsilon = 1e-12);
    }
}
