//! Contact manifolds.

use nalgebra::{Point3, Vector3};

use crate::FeaturePair;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of contact points a manifold can hold.
pub const MAX_CONTACTS: usize = 8;

/// A single contact point between two boxes.
///
/// The accumulated impulses persist across steps: the contact manager
/// transfers them from the previous frame's manifold whenever the
/// [`FeaturePair`] key matches, which is what lets stacks settle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// Contact position in world coordinates.
    pub position: Point3<f64>,
    /// Penetration depth, positive when overlapping.
    pub penetration: f64,
    /// Accumulated normal impulse.
    pub normal_impulse: f64,
    /// Accumulated friction impulses along the two tangents.
    pub tangent_impulse: [f64; 2],
    /// Feature key identifying this contact across frames.
    pub feature: FeaturePair,
    /// How many consecutive frames this contact has been warm started.
    /// Debug/visualization signal only.
    pub warm_started: u8,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            penetration: 0.0,
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
            feature: FeaturePair::default(),
            warm_started: 0,
        }
    }
}

impl Contact {
    /// A fresh contact with zeroed impulses.
    #[must_use]
    pub fn new(position: Point3<f64>, penetration: f64, feature: FeaturePair) -> Self {
        Self {
            position,
            penetration,
            feature,
            ..Default::default()
        }
    }
}

/// The set of contact points, normal and tangent basis describing one
/// collision between two boxes.
///
/// The normal always points from box A to box B. Face manifolds carry up
/// to four points after reduction; edge manifolds carry exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Manifold {
    /// Contact normal, pointing from A to B.
    pub normal: Vector3<f64>,
    /// Orthonormal tangent basis completing the normal.
    pub tangents: [Vector3<f64>; 2],
    /// Contact point storage; only the first `count` entries are live.
    pub contacts: [Contact; MAX_CONTACTS],
    /// Number of live contact points.
    pub count: usize,
    /// Whether either box is a sensor.
    pub sensor: bool,
}

impl Default for Manifold {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifold {
    /// An empty manifold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            normal: Vector3::zeros(),
            tangents: [Vector3::zeros(); 2],
            contacts: [Contact::default(); MAX_CONTACTS],
            count: 0,
            sensor: false,
        }
    }

    /// Drop all contact points. Normal and tangents are left stale.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// The live contact points.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts[..self.count]
    }

    /// The live contact points, mutably.
    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts[..self.count]
    }

    /// Append a contact point.
    pub fn push(&mut self, contact: Contact) {
        debug_assert!(self.count < MAX_CONTACTS);
        if self.count < MAX_CONTACTS {
            self.contacts[self.count] = contact;
            self.count += 1;
        }
    }

    /// Rebuild the tangent basis from the current normal.
    pub fn compute_basis(&mut self) {
        let (t0, t1) = tangent_basis(&self.normal);
        self.tangents = [t0, t1];
    }
}

/// Build an orthonormal basis completing unit vector `a`.
///
/// Picks the seed axis least aligned with `a` so the cross products stay
/// well conditioned.
#[must_use]
pub fn tangent_basis(a: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // 0.577... ~ 1/sqrt(3): at least one component is always below it
    let b = if a.x.abs() >= 0.577_350_27 {
        Vector3::new(a.y, -a.x, 0.0)
    } else {
        Vector3::new(0.0, a.z, -a.y)
    };
    let b = b.normalize();
    let c = a.cross(&b);
    (b, c)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_push_and_clear() {
        let mut m = Manifold::new();
        m.push(Contact::new(Point3::origin(), 0.1, FeaturePair::default()));
        assert_eq!(m.count, 1);
        assert_eq!(m.contacts().len(), 1);
        m.clear();
        assert!(m.contacts().is_empty());
    }

    #[test]
    fn test_tangent_basis_orthonormal() {
        for n in [
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            Vector3::new(1.0, 1.0, 1.0).normalize(),
            Vector3::new(-0.3, 0.9, 0.1).normalize(),
        ] {
            let (t0, t1) = tangent_basis(&n);
            assert_relative_eq!(t0.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(t1.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(t0.dot(&n), 0.0, epsilon = 1e-12);
            assert_relative_eq!(t1.dot(&n), 0.0, epsilon = 1e-12);
            assert_relative_eq!(t0.dot(&t1), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_compute_basis_follows_normal() {
        let mut m = Manifold::new();
        m.normal = Vector3::y();
        m.compute_basis();
        assert_relative_eq!(m.tangents[0].dot(&m.normal), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.tangents[1].dot(&m.normal), 0.0, epsilon = 1e-12);
    }
}
