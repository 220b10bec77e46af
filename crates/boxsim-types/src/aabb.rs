//! Axis-aligned bounding boxes and half-spaces.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }
}

impl Aabb {
    /// Create an AABB from minimum and maximum corners.
    #[must_use]
    pub const fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with the given half-extents.
    #[must_use]
    pub fn from_center(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Whether this AABB fully contains another.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    /// Whether this AABB contains a point.
    #[must_use]
    pub fn contains_point(&self, p: &Point3<f64>) -> bool {
        self.min.x <= p.x
            && self.min.y <= p.y
            && self.min.z <= p.z
            && self.max.x >= p.x
            && self.max.y >= p.y
            && self.max.z >= p.z
    }

    /// Whether two AABBs overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// The smallest AABB enclosing both inputs.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// This AABB expanded by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let v = Vector3::new(margin, margin, margin);
        Self {
            min: self.min - v,
            max: self.max + v,
        }
    }
}

/// A half-space defined by a unit normal and distance from the origin.
///
/// Points `p` with `normal . p <= distance` are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalfSpace {
    /// Unit outward normal.
    pub normal: Vector3<f64>,
    /// Distance from the origin along the normal.
    pub distance: f64,
}

impl HalfSpace {
    /// Create a half-space from a normal and a distance.
    #[must_use]
    pub const fn new(normal: Vector3<f64>, distance: f64) -> Self {
        Self { normal, distance }
    }

    /// Create a half-space through point `p` with normal `n`.
    #[must_use]
    pub fn from_point(n: Vector3<f64>, p: &Point3<f64>) -> Self {
        Self {
            normal: n,
            distance: n.dot(&p.coords),
        }
    }

    /// A point on the boundary plane.
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.normal * self.distance)
    }

    /// Signed distance from `p` to the boundary plane.
    #[must_use]
    pub fn distance_to(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    /// `p` projected onto the boundary plane.
    #[must_use]
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal * self.distance_to(p)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_overlap_and_containment() {
        let a = Aabb::from_center(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let b = Aabb::from_center(Point3::new(1.5, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let c = Aabb::from_center(Point3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let inner = Aabb::from_center(Point3::origin(), Vector3::new(0.5, 0.5, 0.5));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
        assert!(a.contains_point(&Point3::new(0.9, -0.9, 0.0)));
    }

    #[test]
    fn test_touching_aabbs_overlap() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_surface_area_and_merge() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(a.surface_area(), 22.0, epsilon = 1e-12);

        let b = Aabb::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0));
        let m = a.merged(&b);
        assert_eq!(m.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(m.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_half_space_distance() {
        let hs = HalfSpace::new(Vector3::y(), 1.0);
        assert_relative_eq!(hs.distance_to(&Point3::new(0.0, 3.0, 0.0)), 2.0);
        let projected = hs.project(&Point3::new(5.0, 3.0, 1.0));
        assert_relative_eq!(projected.y, 1.0, epsilon = 1e-12);
    }
}
