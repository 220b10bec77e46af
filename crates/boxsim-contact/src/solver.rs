//! Sequential-impulse contact solver.
//!
//! One solver instance is built per island and runs on packed scratch
//! state, never on bodies. `pre_solve` computes constraint masses and
//! biases and applies the warm-start impulses; `solve` runs one
//! Gauss-Seidel sweep and is called `iterations` times.

use nalgebra::{Matrix3, Vector3};

/// Baumgarte stabilization factor.
const BAUMGARTE: f64 = 0.2;

/// Penetration depth the position bias ignores.
const PENETRATION_SLOP: f64 = 0.05;

/// Approach speed (m/s) below which restitution is suppressed, keeping
/// resting contacts from jittering.
const RESTITUTION_THRESHOLD: f64 = 1.0;

/// Scratch linear/angular velocity for one island body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityState {
    /// Linear velocity.
    pub v: Vector3<f64>,
    /// Angular velocity.
    pub w: Vector3<f64>,
}

/// Per-contact solver state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactState {
    /// Contact offset from body A's center of mass.
    pub ra: Vector3<f64>,
    /// Contact offset from body B's center of mass.
    pub rb: Vector3<f64>,
    /// Penetration depth, positive when overlapping.
    pub penetration: f64,
    /// Accumulated normal impulse.
    pub normal_impulse: f64,
    /// Accumulated friction impulses.
    pub tangent_impulse: [f64; 2],
    /// Restitution plus Baumgarte bias velocity.
    pub bias: f64,
    /// Effective mass of the normal constraint.
    pub normal_mass: f64,
    /// Effective masses of the two friction constraints.
    pub tangent_mass: [f64; 2],
}

/// Per-constraint solver state packed by the island.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConstraintState {
    /// Contact states; only the first `contact_count` are live.
    pub contacts: [ContactState; 8],
    /// Number of live contacts.
    pub contact_count: usize,
    /// Contact normal from A to B.
    pub normal: Vector3<f64>,
    /// Friction tangent basis.
    pub tangents: [Vector3<f64>; 2],
    /// Body A's slot in the island velocity buffer.
    pub index_a: usize,
    /// Body B's slot in the island velocity buffer.
    pub index_b: usize,
    /// Inverse mass of body A.
    pub inv_mass_a: f64,
    /// Inverse mass of body B.
    pub inv_mass_b: f64,
    /// World-space inverse inertia of body A.
    pub inv_inertia_a: Matrix3<f64>,
    /// World-space inverse inertia of body B.
    pub inv_inertia_b: Matrix3<f64>,
    /// Mixed friction coefficient.
    pub friction: f64,
    /// Mixed restitution coefficient.
    pub restitution: f64,
}

impl Default for ContactConstraintState {
    fn default() -> Self {
        Self {
            contacts: [ContactState::default(); 8],
            contact_count: 0,
            normal: Vector3::zeros(),
            tangents: [Vector3::zeros(); 2],
            index_a: 0,
            index_b: 0,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_inertia_a: Matrix3::zeros(),
            inv_inertia_b: Matrix3::zeros(),
            friction: 0.0,
            restitution: 0.0,
        }
    }
}

/// The island contact solver.
#[derive(Debug, Clone, Default)]
pub struct ContactSolver {
    /// Constraint states for the island being solved.
    pub states: Vec<ContactConstraintState>,
    /// Whether friction impulses are applied at all.
    pub enable_friction: bool,
}

/// `1/x` guarded against non-positive effective masses.
fn invert(x: f64) -> f64 {
    if x > 0.0 {
        1.0 / x
    } else {
        0.0
    }
}

/// Distinct mutable references into the velocity buffer.
fn two_mut<T>(slice: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i != j);
    if i < j {
        let (lo, hi) = slice.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = slice.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

impl ContactSolver {
    /// A solver with no constraints yet.
    #[must_use]
    pub fn new(enable_friction: bool) -> Self {
        Self {
            states: Vec::new(),
            enable_friction,
        }
    }

    /// Compute constraint masses and biases, then apply the warm-start
    /// impulses carried over from the previous step.
    ///
    /// Runs exactly once per island per step.
    pub fn pre_solve(&mut self, velocities: &mut [VelocityState], dt: f64) {
        for cs in &mut self.states {
            let (sa, sb) = two_mut(velocities, cs.index_a, cs.index_b);

            for c in cs.contacts.iter_mut().take(cs.contact_count) {
                // Effective masses for the normal and both tangents
                let ra_n = c.ra.cross(&cs.normal);
                let rb_n = c.rb.cross(&cs.normal);
                let nm = cs.inv_mass_a
                    + cs.inv_mass_b
                    + ra_n.dot(&(cs.inv_inertia_a * ra_n))
                    + rb_n.dot(&(cs.inv_inertia_b * rb_n));
                c.normal_mass = invert(nm);

                for i in 0..2 {
                    let ra_t = cs.tangents[i].cross(&c.ra);
                    let rb_t = cs.tangents[i].cross(&c.rb);
                    let tm = cs.inv_mass_a
                        + cs.inv_mass_b
                        + ra_t.dot(&(cs.inv_inertia_a * ra_t))
                        + rb_t.dot(&(cs.inv_inertia_b * rb_t));
                    c.tangent_mass[i] = invert(tm);
                }

                // Restitution bias, suppressed below the threshold so
                // resting contacts stay quiet
                let dv = (sb.v + sb.w.cross(&c.rb) - sa.v - sa.w.cross(&c.ra)).dot(&cs.normal);
                let mut bias = 0.0;
                if dv < -RESTITUTION_THRESHOLD {
                    bias += -cs.restitution * dv;
                }

                // Baumgarte: bleed off penetration beyond the slop as a
                // separating velocity target
                bias += BAUMGARTE * (1.0 / dt) * (c.penetration - PENETRATION_SLOP).max(0.0);
                c.bias = bias;

                // Warm start with last frame's accumulated impulses
                let mut p = cs.normal * c.normal_impulse;
                if self.enable_friction {
                    p += cs.tangents[0] * c.tangent_impulse[0]
                        + cs.tangents[1] * c.tangent_impulse[1];
                }

                sa.v -= p * cs.inv_mass_a;
                sa.w -= cs.inv_inertia_a * c.ra.cross(&p);
                sb.v += p * cs.inv_mass_b;
                sb.w += cs.inv_inertia_b * c.rb.cross(&p);
            }
        }
    }

    /// One Gauss-Seidel sweep over every contact: two friction passes
    /// against the live friction cone, then the normal pass with the
    /// accumulated impulse clamped non-negative.
    pub fn solve(&mut self, velocities: &mut [VelocityState]) {
        for cs in &mut self.states {
            let (sa, sb) = two_mut(velocities, cs.index_a, cs.index_b);

            for c in cs.contacts.iter_mut().take(cs.contact_count) {
                // Friction first, clamped by the current normal impulse
                if self.enable_friction {
                    for i in 0..2 {
                        let dv = sb.v + sb.w.cross(&c.rb) - sa.v - sa.w.cross(&c.ra);
                        let lambda = -dv.dot(&cs.tangents[i]) * c.tangent_mass[i];

                        let max_lambda = cs.friction * c.normal_impulse;
                        let old = c.tangent_impulse[i];
                        c.tangent_impulse[i] = (old + lambda).clamp(-max_lambda, max_lambda);
                        let lambda = c.tangent_impulse[i] - old;

                        let impulse = cs.tangents[i] * lambda;
                        sa.v -= impulse * cs.inv_mass_a;
                        sa.w -= cs.inv_inertia_a * c.ra.cross(&impulse);
                        sb.v += impulse * cs.inv_mass_b;
                        sb.w += cs.inv_inertia_b * c.rb.cross(&impulse);
                    }
                }

                // Normal pass
                let dv = (sb.v + sb.w.cross(&c.rb) - sa.v - sa.w.cross(&c.ra)).dot(&cs.normal);
                let lambda = c.normal_mass * (c.bias - dv);

                let old = c.normal_impulse;
                c.normal_impulse = (old + lambda).max(0.0);
                let lambda = c.normal_impulse - old;

                let impulse = cs.normal * lambda;
                sa.v -= impulse * cs.inv_mass_a;
                sa.w -= cs.inv_inertia_a * c.ra.cross(&impulse);
                sb.v += impulse * cs.inv_mass_b;
                sb.w += cs.inv_inertia_b * c.rb.cross(&impulse);
            }
        }
    }
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

    /// A single head-on contact between two unit-mass point bodies.
    fn head_on(restitution: f64, approach: f64) -> (ContactSolver, Vec<VelocityState>) {
        let mut cs = ContactConstraintState {
            contact_count: 1,
            normal: Vector3::y(),
            index_a: 0,
            index_b: 1,
            inv_mass_a: 1.0,
            inv_mass_b: 1.0,
            friction: 0.4,
            restitution,
            ..Default::default()
        };
        let (t0, t1) = boxsim_collide::tangent_basis(&Vector3::y());
        cs.tangents = [t0, t1];

        let mut solver = ContactSolver::new(true);
        solver.states.push(cs);

        // Body B above body A, moving down onto it
        let velocities = vec![
            VelocityState::default(),
            VelocityState {
                v: Vector3::new(0.0, -approach, 0.0),
                w: Vector3::zeros(),
            },
        ];
        (solver, velocities)
    }

    #[test]
    fn test_inelastic_impact_kills_approach_velocity() {
        let (mut solver, mut v) = head_on(0.0, 4.0);
        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        // Equal masses share the momentum; relative normal velocity -> 0
        let rel = (v[1].v - v[0].v).y;
        assert!(rel.abs() < 1e-9, "relative velocity {rel}");
        assert_relative_eq!(v[0].v.y, -2.0, epsilon = 1e-9);
        assert_relative_eq!(v[1].v.y, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_restitution_reflects_velocity() {
        let (mut solver, mut v) = head_on(1.0, 5.0);
        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        // Perfectly elastic: relative velocity flips sign
        let rel = (v[1].v - v[0].v).y;
        assert_relative_eq!(rel, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slow_approach_has_no_restitution() {
        // Below the threshold the bounce is suppressed entirely
        let (mut solver, mut v) = head_on(1.0, 0.5);
        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        let rel = (v[1].v - v[0].v).y;
        assert!(rel.abs() < 1e-9, "relative velocity {rel}");
    }

    #[test]
    fn test_separating_contact_applies_nothing() {
        let (mut solver, mut v) = head_on(0.0, -1.0); // moving apart
        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        assert_eq!(solver.states[0].contacts[0].normal_impulse, 0.0);
        assert_relative_eq!(v[1].v.y, 1.0, epsilon = 1e-12);
        assert_eq!(v[0].v, Vector3::zeros());
    }

    #[test]
    fn test_baumgarte_pushes_apart() {
        let (mut solver, mut v) = head_on(0.0, 0.0);
        solver.states[0].contacts[0].penetration = 0.15;

        let dt = 1.0 / 60.0;
        solver.pre_solve(&mut v, dt);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        // Bias = beta/dt * (pen - slop) must end up as separating velocity
        let expected = 0.2 * 60.0 * (0.15 - 0.05);
        let rel = (v[1].v - v[0].v).y;
        assert_relative_eq!(rel, expected, epsilon = 1e-9);
        assert!(rel > 0.0, "penetration bias must separate, not attract");
    }

    #[test]
    fn test_friction_cone_clamp() {
        let (mut solver, mut v) = head_on(0.0, 4.0);
        // Strong sideways sliding
        v[1].v.x = 10.0;

        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        let c = &solver.states[0].contacts[0];
        let mu = solver.states[0].friction;
        assert!(c.normal_impulse > 0.0);
        for i in 0..2 {
            assert!(
                c.tangent_impulse[i].abs() <= mu * c.normal_impulse + 1e-9,
                "tangent impulse {} outside cone",
                c.tangent_impulse[i]
            );
        }
        // Friction must oppose the slide, not stop it outright here
        assert!(v[1].v.x < 10.0);
        assert!(v[1].v.x > 0.0);
    }

    #[test]
    fn test_warm_start_applies_stored_impulse() {
        let (mut solver, mut v) = head_on(0.0, 0.0);
        solver.states[0].contacts[0].normal_impulse = 3.0;

        solver.pre_solve(&mut v, 1.0 / 60.0);

        // P = n * 3 applied equal and opposite before any iteration
        assert_relative_eq!(v[0].v.y, -3.0, epsilon = 1e-12);
        assert_relative_eq!(v[1].v.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_friction_disabled() {
        let (mut solver, mut v) = head_on(0.0, 4.0);
        solver.enable_friction = false;
        v[1].v.x = 10.0;

        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        assert_eq!(solver.states[0].contacts[0].tangent_impulse, [0.0; 2]);
        assert_relative_eq!(v[1].v.x, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_static_partner_immovable() {
        // Body A static: zero inverse mass soaks the whole impulse
        let (mut solver, mut v) = head_on(0.0, 4.0);
        solver.states[0].inv_mass_a = 0.0;

        solver.pre_solve(&mut v, 1.0 / 60.0);
        for _ in 0..20 {
            solver.solve(&mut v);
        }

        assert_eq!(v[0].v, Vector3::zeros());
        assert!(v[1].v.y.abs() < 1e-9);
    }
}
