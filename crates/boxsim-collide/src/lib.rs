//! Oriented-box collision detection for boxsim.
//!
//! This crate implements the narrowphase of the engine: given two oriented
//! boxes in world space, produce a contact manifold with stable feature
//! identities, plus the exact-shape queries (point containment, ray cast,
//! world-space bounds) used by the scene query API.
//!
//! # Algorithm Overview
//!
//! ## Separating Axis Test
//!
//! Two OBBs are disjoint iff one of fifteen candidate axes separates them:
//! the three face normals of each box and the nine pairwise edge cross
//! products. While testing, the axis of smallest overlap is tracked
//! separately for faces and edges; a small relative/absolute tolerance
//! biases the final choice toward face axes so that near-ties do not
//! flicker between face and edge manifolds across frames.
//!
//! ## Face manifolds
//!
//! For a face axis, the owning box becomes the *reference* and the other
//! the *incident* box. The incident face most anti-parallel to the
//! reference normal is clipped against the four side planes of the
//! reference face (Sutherland-Hodgman). Every vertex carries a
//! [`FeaturePair`] recording which incident corner or clip edge produced
//! it; the packed 32-bit key is the contact's identity across frames and
//! drives warm starting. Up to eight points survive clipping; more than
//! four are reduced to a spanning four.
//!
//! ## Edge manifolds
//!
//! For an edge-edge axis the closest points between the two supporting
//! edges produce a single contact whose feature key is the axis index.
//!
//! # Example
//!
//! ```
//! use boxsim_collide::{collide_boxes, Manifold};
//! use boxsim_types::Pose;
//! use nalgebra::{Point3, Vector3};
//!
//! let e = Vector3::new(0.5, 0.5, 0.5);
//! let a = Pose::identity();
//! let b = Pose::from_position(Point3::new(0.0, 0.9, 0.0));
//!
//! let mut manifold = Manifold::new();
//! collide_boxes(&mut manifold, &a, &e, &b, &e);
//!
//! assert!(manifold.count > 0);
//! assert!(manifold.normal.y > 0.9); // points from A to B
//! ```

#![doc(html_root_url = "https://docs.rs/boxsim-collide/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
)]

mod box_box;
mod feature;
mod manifold;
mod obb;

pub use box_box::collide_boxes;
pub use feature::FeaturePair;
pub use manifold::{tangent_basis, Contact, Manifold, MAX_CONTACTS};
pub use obb::{contains_point, raycast_obb, world_aabb};

// Re-export the shared geometry types
pub use boxsim_types::{Aabb, Pose, RayCast};
