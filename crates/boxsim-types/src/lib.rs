//! Core types for the boxsim rigid-body engine.
//!
//! This crate provides the foundational types shared by the rest of the
//! boxsim workspace:
//!
//! - [`Pose`] / [`Twist`] - Position, orientation and velocity of rigid bodies
//! - [`BodyDef`] / [`BoxDef`] - Construction recipes for bodies and colliders
//! - [`BoxCollider`] / [`MassData`] - The one oriented-box shape a body carries
//! - [`Aabb`] / [`HalfSpace`] / [`RayCast`] - World-space query geometry
//! - [`SceneConfig`] - Fixed timestep, gravity, solver iterations
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no simulation behavior and no
//! references back into the engine. They're the common language between:
//!
//! - The collision pipeline (narrowphase, broadphase)
//! - The contact solver
//! - The scene orchestrator
//! - User code constructing worlds and reading state back out
//!
//! # Coordinate System
//!
//! World space is right-handed with **Y up**; the default gravity vector is
//! `(0, -9.81, 0)`. All scalars are `f64`.
//!
//! # Example
//!
//! ```
//! use boxsim_types::{BodyDef, BodyType, BoxDef, Pose};
//! use nalgebra::{Point3, Vector3};
//!
//! let body = BodyDef::new(BodyType::Dynamic)
//!     .with_position(Point3::new(0.0, 2.0, 0.0));
//!
//! // Extents are full widths; the stored half-extent is half of each.
//! let cube = BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0));
//! assert_eq!(cube.half_extents.x, 0.5);
//! assert!(body.validate().is_ok());
//! ```

#![doc(html_root_url = "https://docs.rs/boxsim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,    // Error docs added where non-obvious
)]

mod aabb;
mod body;
mod collider;
mod config;
mod error;
mod ray;

pub use aabb::{Aabb, HalfSpace};
pub use body::{BodyDef, BodyId, BodyType, Pose, Twist};
pub use collider::{BoxCollider, BoxDef, MassData};
pub use config::SceneConfig;
pub use error::PhysicsError;
pub use ray::RayCast;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compose() {
        let body = BodyDef::default();
        assert_eq!(body.body_type, BodyType::Static);
        assert!(body.validate().is_ok());

        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pose_roundtrip() {
        let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
        let p = pose.transform_point(&Point3::origin());
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
        let back = pose.inverse_transform_point(&p);
        assert_eq!(back, Point3::origin());
    }
}
