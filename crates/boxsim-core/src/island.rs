//! Contact islands.
//!
//! An island is a maximal set of bodies connected by colliding,
//! non-sensor constraints, solved independently of the rest of the
//! world. Static bodies join islands (a floor must appear in every stack
//! resting on it) but are never traversed through, which keeps island
//! formations small; their island flag is cleared after each solve so
//! the same floor can join the next island in the same step.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use boxsim_contact::{ContactConstraintState, ContactSolver, ContactState, VelocityState};
use boxsim_types::BodyId;

use crate::body::Body;
use crate::manager::ContactManager;
use crate::scene::{body_slot, body_slot_mut};

/// Per-step scratch for building and solving one island at a time.
///
/// The buffers are reused across seeds within a step and across steps.
#[derive(Debug, Default)]
pub struct Island {
    bodies: Vec<BodyId>,
    velocities: Vec<VelocityState>,
    constraint_indices: Vec<usize>,
    solver: ContactSolver,
}

impl Island {
    /// An empty island.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies collected by the last build.
    #[must_use]
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Constraint indices collected by the last build.
    #[must_use]
    pub fn constraints(&self) -> &[usize] {
        &self.constraint_indices
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.velocities.clear();
        self.constraint_indices.clear();
        self.solver.states.clear();
    }

    fn add_body(&mut self, id: BodyId, body: &mut Body) {
        body.island_index = self.bodies.len();
        self.bodies.push(id);
        self.velocities.push(VelocityState::default());
    }

    /// Depth-first search over the contact graph from `seed`.
    ///
    /// The seed must be non-static and not yet flagged. Visited bodies
    /// and constraints get their island flags set; static bodies are
    /// added without traversing their other contacts.
    pub(crate) fn build(
        &mut self,
        seed: BodyId,
        bodies: &mut [Option<Body>],
        manager: &mut ContactManager,
        stack: &mut Vec<BodyId>,
    ) {
        self.clear();
        stack.clear();

        body_slot_mut(bodies, seed).island = true;
        stack.push(seed);

        while let Some(id) = stack.pop() {
            {
                let body = body_slot_mut(bodies, id);
                self.add_body(id, body);
            }

            // Islands do not bridge through static geometry
            if body_slot(bodies, id).body_type.is_static() {
                continue;
            }

            let edge_count = body_slot(bodies, id).edges.len();
            for k in 0..edge_count {
                let ci = body_slot(bodies, id).edges[k];
                let constraint = &mut manager.constraints[ci];

                if constraint.island || !constraint.colliding || constraint.sensor() {
                    continue;
                }
                constraint.island = true;
                self.constraint_indices.push(ci);

                let other = constraint.other(id);
                let other_body = body_slot_mut(bodies, other);
                if other_body.island {
                    continue;
                }
                other_body.island = true;
                stack.push(other);
            }
        }
    }

    /// Integrate velocities, run the contact solver, and integrate
    /// positions for every body in the island.
    pub(crate) fn solve(
        &mut self,
        bodies: &mut [Option<Body>],
        manager: &mut ContactManager,
        gravity: Vector3<f64>,
        dt: f64,
        iterations: usize,
        enable_friction: bool,
    ) {
        let Self {
            bodies: members,
            velocities,
            constraint_indices,
            solver,
        } = self;

        // Apply gravity, integrate velocities, fill the scratch buffers
        for (slot, &id) in members.iter().enumerate() {
            let body = body_slot_mut(bodies, id);

            if body.body_type.is_dynamic() {
                body.apply_linear_force(gravity * body.gravity_scale);
                body.update_world_inertia();

                body.velocity.linear += body.force * body.inv_mass * dt;
                body.velocity.angular += body.inv_inertia_world * body.torque * dt;

                // Pade-approximated exponential damping:
                // v' = v / (1 + c * dt)
                body.velocity.linear *= 1.0 / (1.0 + dt * body.linear_damping);
                body.velocity.angular *= 1.0 / (1.0 + dt * body.angular_damping);
            }

            velocities[slot] = VelocityState {
                v: body.velocity.linear,
                w: body.velocity.angular,
            };
        }

        // Pack the solver state for every constraint in the island
        solver.enable_friction = enable_friction;
        for &ci in constraint_indices.iter() {
            let constraint = &manager.constraints[ci];
            let body_a = body_slot(bodies, constraint.body_a);
            let body_b = body_slot(bodies, constraint.body_b);

            let mut state = ContactConstraintState {
                contact_count: constraint.manifold.count,
                normal: constraint.manifold.normal,
                tangents: constraint.manifold.tangents,
                index_a: body_a.island_index,
                index_b: body_b.island_index,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_inertia_a: body_a.inv_inertia_world,
                inv_inertia_b: body_b.inv_inertia_world,
                friction: constraint.friction,
                restitution: constraint.restitution,
                ..Default::default()
            };

            for (j, contact) in constraint.manifold.contacts().iter().enumerate() {
                state.contacts[j] = ContactState {
                    ra: contact.position - body_a.world_center,
                    rb: contact.position - body_b.world_center,
                    penetration: contact.penetration,
                    normal_impulse: contact.normal_impulse,
                    tangent_impulse: contact.tangent_impulse,
                    ..Default::default()
                };
            }

            solver.states.push(state);
        }

        solver.pre_solve(velocities, dt);
        for _ in 0..iterations {
            solver.solve(velocities);
        }

        // Persist accumulated impulses back into the manifolds
        for (state, &ci) in solver.states.iter().zip(constraint_indices.iter()) {
            let manifold = &mut manager.constraints[ci].manifold;
            for (j, contact) in manifold.contacts_mut().iter_mut().enumerate() {
                contact.normal_impulse = state.contacts[j].normal_impulse;
                contact.tangent_impulse = state.contacts[j].tangent_impulse;
            }
        }

        // Copy velocities back and integrate positions
        for (slot, &id) in members.iter().enumerate() {
            let body = body_slot_mut(bodies, id);
            if body.body_type.is_static() {
                continue;
            }

            let state = velocities[slot];
            body.velocity.linear = state.v;
            body.velocity.angular = state.w;

            body.world_center += body.velocity.linear * dt;
            body.pose.rotation = integrate_orientation(
                body.pose.rotation,
                body.velocity.angular,
                dt,
            );
            body.refresh_origin();
        }
    }
}

/// Integrate a unit quaternion by an angular velocity:
/// `q' = normalize(q + 0.5 * dt * omega ⊗ q)`.
fn integrate_orientation(
    q: UnitQuaternion<f64>,
    omega: Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let q = q.into_inner();
    let spin = Quaternion::from_parts(0.0, omega);
    let dq = spin * q * (0.5 * dt);
    UnitQuaternion::from_quaternion(q + dq)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integrate_orientation_stays_unit() {
        let mut q = UnitQuaternion::identity();
        let omega = Vector3::new(3.0, -2.0, 1.0);
        for _ in 0..600 {
            q = integrate_orientation(q, omega, 1.0 / 60.0);
        }
        assert_relative_eq!(q.into_inner().norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_integrate_orientation_matches_axis_angle() {
        // Small steps about a fixed axis approximate the exact rotation
        let omega = Vector3::new(0.0, 0.0, 1.0);
        let dt = 1.0 / 600.0;
        let mut q = UnitQuaternion::identity();
        for _ in 0..600 {
            q = integrate_orientation(q, omega, dt);
        }
        let angle = q.angle();
        assert_relative_eq!(angle, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_velocity_is_identity_step() {
        let q = UnitQuaternion::from_euler_angles(0.3, 0.2, 0.1);
        let q2 = integrate_orientation(q, Vector3::zeros(), 1.0 / 60.0);
        assert_relative_eq!(q.angle_to(&q2), 0.0, epsilon = 1e-12);
    }
}
