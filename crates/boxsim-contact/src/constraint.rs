//! Persistent contact constraints.

use nalgebra::Vector3;

use boxsim_collide::{collide_boxes, Manifold};
use boxsim_types::{BodyId, Pose};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mix the friction coefficients of two touching boxes.
#[must_use]
pub fn mix_friction(a: f64, b: f64) -> f64 {
    (a * b).sqrt()
}

/// Mix the restitution coefficients of two touching boxes.
#[must_use]
pub fn mix_restitution(a: f64, b: f64) -> f64 {
    a.max(b)
}

/// A persistent contact between the boxes of two bodies.
///
/// Created on the first broadphase overlap of a valid pair and destroyed
/// when the fat AABBs separate, a body is removed, or filtering stops
/// permitting the pair. The manifold inside is refreshed every step; its
/// accumulated impulses survive refreshes through feature-key matching.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactConstraint {
    /// First body of the pair.
    pub body_a: BodyId,
    /// Second body of the pair.
    pub body_b: BodyId,
    /// Mixed friction coefficient, `sqrt(fA * fB)`.
    pub friction: f64,
    /// Mixed restitution coefficient, `max(rA, rB)`.
    pub restitution: f64,
    /// The contact manifold, refreshed each step.
    pub manifold: Manifold,
    /// The boxes touched during the current step.
    pub colliding: bool,
    /// The boxes touched during the previous step.
    pub was_colliding: bool,
    /// Marker used while building islands; cleared every step.
    pub island: bool,
}

impl ContactConstraint {
    /// A fresh constraint for the given pair with zero contacts.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId, friction: f64, restitution: f64, sensor: bool) -> Self {
        let mut manifold = Manifold::new();
        manifold.sensor = sensor;
        Self {
            body_a,
            body_b,
            friction,
            restitution,
            manifold,
            colliding: false,
            was_colliding: false,
            island: false,
        }
    }

    /// Whether this constraint joins the given pair, in either order.
    #[must_use]
    pub fn is_pair(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }

    /// Whether the constraint touches the given body.
    #[must_use]
    pub fn involves(&self, id: BodyId) -> bool {
        self.body_a == id || self.body_b == id
    }

    /// The body on the other end of the constraint.
    #[must_use]
    pub fn other(&self, id: BodyId) -> BodyId {
        if self.body_a == id {
            self.body_b
        } else {
            self.body_a
        }
    }

    /// Whether either box is a sensor.
    #[must_use]
    pub fn sensor(&self) -> bool {
        self.manifold.sensor
    }

    /// Refresh the manifold from the current box poses.
    ///
    /// Runs the narrowphase, updates the colliding/was-colliding flag
    /// pair, rebuilds the tangent basis, and transfers the previous
    /// frame's accumulated impulses onto contacts whose feature key
    /// survived.
    pub fn update(
        &mut self,
        tx_a: &Pose,
        e_a: &Vector3<f64>,
        tx_b: &Pose,
        e_b: &Vector3<f64>,
    ) {
        let old = self.manifold;

        collide_boxes(&mut self.manifold, tx_a, e_a, tx_b, e_b);

        let now = self.manifold.count > 0;
        self.was_colliding = self.colliding;
        self.colliding = now;

        self.manifold.compute_basis();
        carry_impulses(&old, &mut self.manifold);
    }

    /// `true` the step a pair starts touching.
    #[must_use]
    pub fn began_touching(&self) -> bool {
        self.colliding && !self.was_colliding
    }

    /// `true` the step a pair stops touching.
    #[must_use]
    pub fn stopped_touching(&self) -> bool {
        !self.colliding && self.was_colliding
    }
}

/// Transfer accumulated impulses from an old manifold into a fresh one.
///
/// Contacts are matched by feature key, not position. Friction impulses
/// are re-projected from the old tangent basis into the new one so a
/// slowly rotating contact keeps its warm start.
fn carry_impulses(old: &Manifold, new: &mut Manifold) {
    let ot0 = old.tangents[0];
    let ot1 = old.tangents[1];
    let nt0 = new.tangents[0];
    let nt1 = new.tangents[1];

    for contact in new.contacts_mut() {
        contact.normal_impulse = 0.0;
        contact.tangent_impulse = [0.0; 2];
        contact.warm_started = 0;

        for oc in old.contacts() {
            if contact.feature.key() == oc.feature.key() {
                contact.normal_impulse = oc.normal_impulse;

                let friction = ot0 * oc.tangent_impulse[0] + ot1 * oc.tangent_impulse[1];
                contact.tangent_impulse[0] = friction.dot(&nt0);
                contact.tangent_impulse[1] = friction.dot(&nt1);

                contact.warm_started = oc.warm_started.saturating_add(1);
                break;
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
    use nalgebra::Point3;

    fn touching_constraint() -> (ContactConstraint, Pose, Pose, Vector3<f64>) {
        let c = ContactConstraint::new(BodyId::new(0), BodyId::new(1), 0.4, 0.2, false);
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(0.0, 0.95, 0.0));
        (c, a, b, Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_mixing_rules() {
        assert_relative_eq!(mix_friction(0.4, 0.9), (0.36_f64).sqrt(), epsilon = 1e-12);
        assert_eq!(mix_restitution(0.2, 0.7), 0.7);
    }

    #[test]
    fn test_flag_transitions() {
        let (mut c, a, b, e) = touching_constraint();

        c.update(&a, &e, &b, &e);
        assert!(c.colliding);
        assert!(!c.was_colliding);
        assert!(c.began_touching());

        c.update(&a, &e, &b, &e);
        assert!(c.colliding);
        assert!(c.was_colliding);
        assert!(!c.began_touching());

        let b_far = Pose::from_position(Point3::new(0.0, 5.0, 0.0));
        c.update(&a, &e, &b_far, &e);
        assert!(!c.colliding);
        assert!(c.stopped_touching());

        // Re-touch one step after separating: begin must fire again
        c.update(&a, &e, &b, &e);
        assert!(c.colliding);
        assert!(!c.was_colliding);
        assert!(c.began_touching());
    }

    #[test]
    fn test_warm_start_transfer() {
        let (mut c, a, b, e) = touching_constraint();

        c.update(&a, &e, &b, &e);
        assert_eq!(c.manifold.count, 4);

        // Pretend the solver accumulated impulses
        for contact in c.manifold.contacts_mut() {
            contact.normal_impulse = 2.0;
            contact.tangent_impulse = [0.5, -0.25];
        }

        // Same geometry next frame: everything carries over
        c.update(&a, &e, &b, &e);
        for contact in c.manifold.contacts() {
            assert_relative_eq!(contact.normal_impulse, 2.0, epsilon = 1e-12);
            assert_relative_eq!(contact.tangent_impulse[0], 0.5, epsilon = 1e-12);
            assert_relative_eq!(contact.tangent_impulse[1], -0.25, epsilon = 1e-12);
            assert_eq!(contact.warm_started, 1);
        }

        c.update(&a, &e, &b, &e);
        assert_eq!(c.manifold.contacts()[0].warm_started, 2);
    }

    #[test]
    fn test_no_transfer_after_separation() {
        let (mut c, a, b, e) = touching_constraint();

        c.update(&a, &e, &b, &e);
        for contact in c.manifold.contacts_mut() {
            contact.normal_impulse = 2.0;
        }

        let b_far = Pose::from_position(Point3::new(0.0, 5.0, 0.0));
        c.update(&a, &e, &b_far, &e);
        assert_eq!(c.manifold.count, 0);

        // Re-approach: old manifold was empty, so impulses start at zero
        c.update(&a, &e, &b, &e);
        for contact in c.manifold.contacts() {
            assert_eq!(contact.normal_impulse, 0.0);
            assert_eq!(contact.warm_started, 0);
        }
    }

    #[test]
    fn test_pair_lookup() {
        let c = ContactConstraint::new(BodyId::new(3), BodyId::new(7), 0.4, 0.2, false);
        assert!(c.is_pair(BodyId::new(3), BodyId::new(7)));
        assert!(c.is_pair(BodyId::new(7), BodyId::new(3)));
        assert!(!c.is_pair(BodyId::new(3), BodyId::new(4)));
        assert_eq!(c.other(BodyId::new(3)), BodyId::new(7));
        assert_eq!(c.other(BodyId::new(7)), BodyId::new(3));
    }
}
