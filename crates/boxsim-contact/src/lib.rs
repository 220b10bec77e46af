//! Contact dynamics for boxsim.
//!
//! This crate owns the persistent half of the contact pipeline:
//!
//! - [`ContactConstraint`] - a manifold plus the bookkeeping that lives
//!   across steps (body pair, mixed material properties, collision flags)
//! - Warm-start transfer - accumulated impulses carried from the previous
//!   frame's manifold into the fresh one, matched by feature key
//! - [`ContactSolver`] - the sequential-impulse velocity solver run once
//!   per island with packed scratch state
//!
//! # Solver shape
//!
//! The solver never touches bodies directly. The island packs body data
//! into [`VelocityState`] and [`ContactConstraintState`] buffers, runs
//! `pre_solve` once and `solve` for the configured iteration count, then
//! copies velocities and accumulated impulses back out. The clamped
//! accumulators are what make the iteration converge to the LCP solution
//! instead of oscillating: each pass clamps the *accumulated* impulse
//! (normal to `>= 0`, friction to the live Coulomb cone) and applies only
//! the delta.

#![doc(html_root_url = "https://docs.rs/boxsim-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
)]

mod constraint;
mod solver;

pub use constraint::{mix_friction, mix_restitution, ContactConstraint};
pub use solver::{ContactConstraintState, ContactSolver, ContactState, VelocityState};

// Re-export the manifold types the constraint carries
pub use boxsim_collide::{Contact, FeaturePair, Manifold};
