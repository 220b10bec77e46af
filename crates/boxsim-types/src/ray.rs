//! Ray-cast input and output data.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bounded ray plus the result slots filled in by a successful cast.
///
/// `start + dir * t` is the far endpoint; `dir` must be unit length.
/// After a cast reports a hit, `toi` holds the solved time of impact and
/// `normal` the surface normal at the impact point.
///
/// # Example
///
/// ```
/// use boxsim_types::RayCast;
/// use nalgebra::{Point3, Vector3};
///
/// let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);
/// ray.toi = 9.0;
/// assert_eq!(ray.impact_point(), Point3::new(0.0, 1.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RayCast {
    /// Ray origin.
    pub start: Point3<f64>,
    /// Unit direction.
    pub dir: Vector3<f64>,
    /// Maximum travel distance along `dir`.
    pub t: f64,
    /// Solved time of impact. Only meaningful after a reported hit.
    pub toi: f64,
    /// Surface normal at the impact point. Only meaningful after a hit.
    pub normal: Vector3<f64>,
}

impl RayCast {
    /// Create a ray from `start` travelling `t` units along unit `dir`.
    #[must_use]
    pub fn new(start: Point3<f64>, dir: Vector3<f64>, t: f64) -> Self {
        Self {
            start,
            dir,
            t,
            toi: 0.0,
            normal: Vector3::zeros(),
        }
    }

    /// The impact point implied by `toi`. Only meaningful after a hit.
    #[must_use]
    pub fn impact_point(&self) -> Point3<f64> {
        self.start + self.dir * self.toi
    }

    /// The far endpoint of the ray.
    #[must_use]
    pub fn end_point(&self) -> Point3<f64> {
        self.start + self.dir * self.t
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_end_point() {
        let ray = RayCast::new(Point3::origin(), Vector3::x(), 5.0);
        assert_eq!(ray.end_point(), Point3::new(5.0, 0.0, 0.0));
    }
}
