//! The oriented-box collider and its mass properties.
//!
//! Every body carries at most one [`BoxCollider`]: an oriented box defined
//! by a local pose inside its body and half-extents along its local axes.
//! [`MassData`] is what the box contributes to its body's mass, center of
//! mass and inertia tensor.

use nalgebra::{Matrix3, Vector3};

use crate::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Construction recipe for a box collider.
///
/// The extents passed to [`BoxDef::new`] are **full** widths along each
/// local axis; the stored half-extent is half of each.
///
/// # Example
///
/// ```
/// use boxsim_types::{BoxDef, Pose};
/// use nalgebra::Vector3;
///
/// let def = BoxDef::new(Pose::identity(), Vector3::new(2.0, 4.0, 6.0));
/// assert_eq!(def.half_extents, Vector3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxDef {
    /// Pose of the box inside its body.
    pub local: Pose,
    /// Half-extent along each local axis.
    pub half_extents: Vector3<f64>,
    /// Coulomb friction coefficient of the surface.
    pub friction: f64,
    /// Coefficient of restitution of the surface.
    pub restitution: f64,
    /// Mass density (kg/m^3). Zero means the box adds no mass.
    pub density: f64,
    /// Sensors report contacts but never generate solver constraints.
    pub sensor: bool,
}

impl Default for BoxDef {
    fn default() -> Self {
        Self {
            local: Pose::identity(),
            half_extents: Vector3::new(0.5, 0.5, 0.5),
            friction: 0.4,
            restitution: 0.2,
            density: 1.0,
            sensor: false,
        }
    }
}

impl BoxDef {
    /// A definition with the given local pose and **full** extents.
    #[must_use]
    pub fn new(local: Pose, extents: Vector3<f64>) -> Self {
        Self {
            local,
            half_extents: extents * 0.5,
            ..Default::default()
        }
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Set the restitution coefficient.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set the density.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Mark the box as a sensor.
    #[must_use]
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Validate the definition.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.local.is_finite() || !self.half_extents.iter().all(|x| x.is_finite()) {
            return Err(crate::PhysicsError::invalid_def(
                "box definition contains non-finite values",
            ));
        }
        if self.half_extents.iter().any(|&x| x < 0.0) {
            return Err(crate::PhysicsError::invalid_def(
                "box extents cannot be negative",
            ));
        }
        if self.friction < 0.0 {
            return Err(crate::PhysicsError::invalid_def(
                "friction cannot be negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(crate::PhysicsError::invalid_def(
                "restitution must be between 0 and 1",
            ));
        }
        if self.density < 0.0 {
            return Err(crate::PhysicsError::invalid_def(
                "density cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Mass, center of mass and inertia contributed by a collider.
///
/// The inertia tensor is expressed about the **body origin** in body
/// coordinates; the body shifts it to its center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassData {
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass in body coordinates.
    pub center: Vector3<f64>,
    /// Inertia tensor about the body origin in body coordinates.
    pub inertia: Matrix3<f64>,
}

/// The oriented-box collider attached to a body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxCollider {
    /// Pose of the box inside its body.
    pub local: Pose,
    /// Half-extent along each local axis.
    pub half_extents: Vector3<f64>,
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Coefficient of restitution.
    pub restitution: f64,
    /// Mass density (kg/m^3).
    pub density: f64,
    /// Whether this box is a sensor.
    pub sensor: bool,
}

impl From<BoxDef> for BoxCollider {
    fn from(def: BoxDef) -> Self {
        Self {
            local: def.local,
            half_extents: def.half_extents,
            friction: def.friction,
            restitution: def.restitution,
            density: def.density,
            sensor: def.sensor,
        }
    }
}

impl BoxCollider {
    /// The pose of this box in world coordinates given its body's pose.
    #[must_use]
    pub fn world_pose(&self, body: &Pose) -> Pose {
        body.compose(&self.local)
    }

    /// Mass properties of the box about the body origin.
    ///
    /// Solid-box inertia about the box center,
    /// `I = m/12 * diag(wy^2 + wz^2, wx^2 + wz^2, wx^2 + wy^2)` with
    /// `w = 2e`, rotated into body coordinates and shifted to the body
    /// origin with the parallel-axis theorem. A zero-extent or
    /// zero-density box contributes zero mass.
    #[must_use]
    pub fn mass_data(&self) -> MassData {
        let e = self.half_extents;
        let volume = 8.0 * e.x * e.y * e.z;
        let mass = self.density * volume;

        let ex2 = 4.0 * e.x * e.x;
        let ey2 = 4.0 * e.y * e.y;
        let ez2 = 4.0 * e.z * e.z;
        let diag = Vector3::new(ey2 + ez2, ex2 + ez2, ex2 + ey2) * (mass / 12.0);
        let local_inertia = Matrix3::from_diagonal(&diag);

        // Rotate into body coordinates, then shift to the body origin.
        let r = self.local.rotation_matrix();
        let c = self.local.position.coords;
        let rotated = r * local_inertia * r.transpose();
        let shift = (Matrix3::identity() * c.dot(&c) - c * c.transpose()) * mass;

        MassData {
            mass,
            center: c,
            inertia: rotated + shift,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_extents_are_halved() {
        let def = BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(def.half_extents, Vector3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_unit_cube_mass() {
        let collider = BoxCollider::from(BoxDef::default());
        let md = collider.mass_data();
        // Unit cube, density 1: mass 1, I = 1/12 * (1 + 1) = 1/6 per axis.
        assert_relative_eq!(md.mass, 1.0, epsilon = 1e-12);
        assert_relative_eq!(md.inertia[(0, 0)], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(md.inertia[(1, 1)], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(md.inertia[(2, 2)], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(md.center, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_offset_box_parallel_axis() {
        let def = BoxDef::new(
            Pose::from_position(Point3::new(0.0, 1.0, 0.0)),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let md = BoxCollider::from(def).mass_data();
        // Offset along y adds m*d^2 to the x and z axes only.
        let base = 1.0 / 6.0;
        assert_relative_eq!(md.inertia[(0, 0)], base + 1.0, epsilon = 1e-12);
        assert_relative_eq!(md.inertia[(1, 1)], base, epsilon = 1e-12);
        assert_relative_eq!(md.inertia[(2, 2)], base + 1.0, epsilon = 1e-12);
        assert_relative_eq!(md.center.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_extent_box_is_massless() {
        let def = BoxDef::new(Pose::identity(), Vector3::zeros());
        let md = BoxCollider::from(def).mass_data();
        assert_eq!(md.mass, 0.0);
    }

    #[test]
    fn test_box_def_validation() {
        assert!(BoxDef::default().validate().is_ok());
        assert!(BoxDef::default().with_friction(-0.1).validate().is_err());
        assert!(BoxDef::default().with_restitution(1.5).validate().is_err());
        assert!(BoxDef::default().with_density(-1.0).validate().is_err());
    }
}
