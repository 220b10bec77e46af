//! Body identity, kind, pose and velocity types.
//!
//! A rigid body is identified by a [`BodyId`] handle, carries a [`Pose`]
//! (position + orientation) and a pair of velocities bundled in a [`Twist`].
//! [`BodyDef`] is the construction recipe handed to the scene.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle to a rigid body inside a scene.
///
/// Handles are slot indices: they stay valid until the body is removed.
/// Using a handle after removing its body is a logic error; the scene
/// checks this with debug assertions and returns `None` from lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u32);

impl BodyId {
    /// Create a body ID from a raw slot index.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The slot index as a `usize`, for arena indexing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// The three kinds of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Never moves or integrates; infinite mass.
    #[default]
    Static,
    /// Integrates forces and velocities; finite mass.
    Dynamic,
    /// Infinite mass, ignores forces, but integrates velocity into
    /// position. Kinematic bodies do not resolve collisions.
    Kinematic,
}

impl BodyType {
    /// Whether bodies of this kind respond to forces and impulses.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Whether bodies of this kind never move.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }
}

/// Position and orientation of a rigid body or collider.
///
/// The unit quaternion is the authoritative representation of rotation;
/// rotation matrices are derived from it on demand.
///
/// # Example
///
/// ```
/// use boxsim_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in the parent frame.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// A pose with the given position and no rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// A pose with the given position and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// A pose rotated by `angle` radians about `axis`.
    ///
    /// A zero-length axis yields the identity rotation.
    #[must_use]
    pub fn from_axis_angle(position: Point3<f64>, axis: Vector3<f64>, angle: f64) -> Self {
        let rotation = Unit::try_new(axis, 1e-12)
            .map_or_else(UnitQuaternion::identity, |axis| {
                UnitQuaternion::from_axis_angle(&axis, angle)
            });
        Self { position, rotation }
    }

    /// Transform a point from local to parent coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to parent coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from parent to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from parent to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Compose two poses: `self * other` (apply `other` in `self`'s frame).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// The rotation as a 3x3 matrix.
    #[must_use]
    pub fn rotation_matrix(&self) -> nalgebra::Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity in world coordinates (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity in world coordinates (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// A twist with the given linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// A zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// Velocity at a point offset `r` from the center of mass:
    /// `v + omega x r`.
    #[must_use]
    pub fn velocity_at(&self, r: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(r)
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// Construction recipe for a rigid body.
///
/// # Example
///
/// ```
/// use boxsim_types::{BodyDef, BodyType};
/// use nalgebra::{Point3, Vector3};
///
/// let def = BodyDef::new(BodyType::Dynamic)
///     .with_position(Point3::new(0.0, 5.0, 0.0))
///     .with_linear_velocity(Vector3::new(1.0, 0.0, 0.0));
/// assert!(def.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDef {
    /// Rotation axis for the initial orientation. Zero means no rotation.
    pub axis: Vector3<f64>,
    /// Rotation angle about `axis` in radians.
    pub angle: f64,
    /// Initial world position.
    pub position: Point3<f64>,
    /// Initial linear velocity in world space.
    pub linear_velocity: Vector3<f64>,
    /// Initial angular velocity in world space.
    pub angular_velocity: Vector3<f64>,
    /// Multiplier applied to scene gravity for this body.
    pub gravity_scale: f64,
    /// Linear velocity damping coefficient.
    pub linear_damping: f64,
    /// Angular velocity damping coefficient.
    pub angular_damping: f64,
    /// Kind of body to create.
    pub body_type: BodyType,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            axis: Vector3::zeros(),
            angle: 0.0,
            position: Point3::origin(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.1,
            body_type: BodyType::Static,
        }
    }
}

impl BodyDef {
    /// A definition of the given kind with all other fields defaulted.
    #[must_use]
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }

    /// Set the initial position.
    #[must_use]
    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.position = position;
        self
    }

    /// Set the initial orientation as an axis-angle rotation.
    #[must_use]
    pub fn with_rotation(mut self, axis: Vector3<f64>, angle: f64) -> Self {
        self.axis = axis;
        self.angle = angle;
        self
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_linear_velocity(mut self, v: Vector3<f64>) -> Self {
        self.linear_velocity = v;
        self
    }

    /// Set the initial angular velocity.
    #[must_use]
    pub fn with_angular_velocity(mut self, w: Vector3<f64>) -> Self {
        self.angular_velocity = w;
        self
    }

    /// Set the gravity multiplier.
    #[must_use]
    pub fn with_gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set linear and angular damping.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// The initial pose described by this definition.
    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose::from_axis_angle(self.position, self.axis, self.angle)
    }

    /// Validate the definition.
    pub fn validate(&self) -> crate::Result<()> {
        let finite = self.axis.iter().all(|x| x.is_finite())
            && self.angle.is_finite()
            && self.position.coords.iter().all(|x| x.is_finite())
            && self.linear_velocity.iter().all(|x| x.is_finite())
            && self.angular_velocity.iter().all(|x| x.is_finite());
        if !finite {
            return Err(crate::PhysicsError::invalid_def(
                "body definition contains non-finite values",
            ));
        }
        if self.linear_damping < 0.0 || self.angular_damping < 0.0 {
            return Err(crate::PhysicsError::invalid_def(
                "damping cannot be negative",
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
    fn test_body_id() {
        let id = BodyId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "Body(7)");
    }

    #[test]
    fn test_pose_rotation() {
        let pose = Pose::from_axis_angle(
            Point3::origin(),
            Vector3::z(),
            std::f64::consts::FRAC_PI_2,
        );
        let world = pose.transform_vector(&Vector3::x());
        assert_relative_eq!(world.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(world.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_zero_axis_is_identity() {
        let pose = Pose::from_axis_angle(Point3::origin(), Vector3::zeros(), 1.0);
        assert_eq!(pose.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_pose_compose_inverse() {
        let a = Pose::from_axis_angle(Point3::new(1.0, 2.0, 3.0), Vector3::y(), 0.7);
        let p = Point3::new(0.3, -0.2, 0.9);
        let there = a.transform_point(&p);
        let back = a.inverse_transform_point(&there);
        assert_relative_eq!(back.coords, p.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_twist_velocity_at() {
        let twist = Twist::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
        let v = twist.velocity_at(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_body_def_validation() {
        let def = BodyDef::new(BodyType::Dynamic).with_damping(-1.0, 0.0);
        assert!(def.validate().is_err());

        let def = BodyDef::new(BodyType::Dynamic)
            .with_position(Point3::new(f64::NAN, 0.0, 0.0));
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_body_def_defaults() {
        let def = BodyDef::default();
        assert_eq!(def.gravity_scale, 1.0);
        assert_eq!(def.linear_damping, 0.0);
        assert_eq!(def.angular_damping, 0.1);
        assert_eq!(def.body_type, BodyType::Static);
    }
}
