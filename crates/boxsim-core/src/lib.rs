//! The boxsim engine: scene orchestration, broadphase and islands.
//!
//! This crate ties the collision and contact crates into a stepping
//! engine. The [`Scene`] owns the bodies, the [`BroadPhase`] and the
//! [`ContactManager`], and advances the world with a fixed timestep.
//!
//! # Step pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Scene::step()                         │
//! │  refresh pairs (new boxes) → test collisions → build islands │
//! │  → solve islands → sync proxies → find new pairs → clear     │
//! │  forces                                                      │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                ┌───────────────┼────────────────┐
//!                ▼               ▼                ▼
//!        ┌──────────────┐ ┌─────────────┐ ┌──────────────┐
//!        │  BroadPhase  │ │ContactMgr   │ │   Island     │
//!        │  fat AABBs,  │ │ persistent  │ │ DFS grouping │
//!        │  moved set   │ │ constraints │ │ + solver run │
//!        └──────────────┘ └─────────────┘ └──────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use boxsim_core::Scene;
//! use boxsim_types::{BodyDef, BodyType, BoxDef, Pose, SceneConfig};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut scene = Scene::new(SceneConfig::default()).unwrap();
//!
//! // A static floor and a falling cube
//! let floor = scene.create_body(&BodyDef::default()).unwrap();
//! scene
//!     .set_box(floor, &BoxDef::new(Pose::identity(), Vector3::new(100.0, 2.0, 100.0)))
//!     .unwrap();
//!
//! let cube = scene
//!     .create_body(
//!         &BodyDef::new(BodyType::Dynamic).with_position(Point3::new(0.0, 5.0, 0.0)),
//!     )
//!     .unwrap();
//! scene
//!     .set_box(cube, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
//!     .unwrap();
//!
//! for _ in 0..60 {
//!     scene.step();
//! }
//!
//! let body = scene.body(cube).unwrap();
//! assert!(body.position().y < 5.0);
//! ```

#![doc(html_root_url = "https://docs.rs/boxsim-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
)]

mod body;
pub mod broad_phase;
mod draw;
mod island;
mod manager;
mod scene;

pub use body::Body;
pub use broad_phase::BroadPhase;
pub use draw::DebugDraw;
pub use island::Island;
pub use manager::{ContactListener, ContactManager};
pub use scene::Scene;

// Re-export the rest of the stack for convenience
pub use boxsim_collide::{Contact, FeaturePair, Manifold};
pub use boxsim_contact::ContactConstraint;
pub use boxsim_types::{
    Aabb, BodyDef, BodyId, BodyType, BoxCollider, BoxDef, HalfSpace, PhysicsError, Pose, RayCast,
    SceneConfig, Twist,
};
