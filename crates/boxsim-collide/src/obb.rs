//! Exact-shape queries against a single oriented box.
//!
//! All functions take the box's world pose and half-extents; composing a
//! body pose with the collider's local pose is the caller's job.

use nalgebra::{Point3, Vector3};

use boxsim_types::{Aabb, Pose, RayCast};

/// Direction components below this are treated as parallel to a slab.
const RAY_EPSILON: f64 = 1.0e-8;

/// The world-space AABB enclosing an oriented box.
#[must_use]
pub fn world_aabb(tx: &Pose, e: &Vector3<f64>) -> Aabb {
    // |R| * e projects the half-extents onto the world axes
    let half = tx.rotation_matrix().abs() * e;
    Aabb::from_center(tx.position, half)
}

/// Whether a world-space point lies inside the box.
#[must_use]
pub fn contains_point(tx: &Pose, e: &Vector3<f64>, p: &Point3<f64>) -> bool {
    let local = tx.inverse_transform_point(p);
    local.x.abs() <= e.x && local.y.abs() <= e.y && local.z.abs() <= e.z
}

/// Cast a bounded ray against the box using the slab method in local
/// space.
///
/// On a hit, `ray.toi` and `ray.normal` are filled in and `true` is
/// returned. A ray with `t <= 0` never hits. A ray starting inside the
/// box reports `toi = 0` with a zero normal.
#[must_use]
pub fn raycast_obb(tx: &Pose, e: &Vector3<f64>, ray: &mut RayCast) -> bool {
    if ray.t <= 0.0 {
        return false;
    }

    let p = tx.inverse_transform_point(&ray.start);
    let d = tx.inverse_transform_vector(&ray.dir);

    let mut tmin = 0.0;
    let mut tmax = ray.t;
    let mut normal_local = Vector3::zeros();

    for i in 0..3 {
        if d[i].abs() < RAY_EPSILON {
            // Parallel to the slab: must already be inside it
            if p[i] < -e[i] || p[i] > e[i] {
                return false;
            }
        } else {
            let inv = 1.0 / d[i];
            let sign = d[i].signum();
            let ei = e[i] * sign;

            let t_enter = -(ei + p[i]) * inv;
            let t_exit = (ei - p[i]) * inv;

            if t_enter > tmin {
                tmin = t_enter;
                normal_local = Vector3::zeros();
                normal_local[i] = -sign;
            }
            tmax = tmax.min(t_exit);
            if tmin > tmax {
                return false;
            }
        }
    }

    ray.toi = tmin;
    ray.normal = tx.transform_vector(&normal_local);
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_world_aabb_axis_aligned() {
        let tx = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
        let aabb = world_aabb(&tx, &Vector3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.min, Point3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.max, Point3::new(1.5, 3.0, 4.5));
    }

    #[test]
    fn test_world_aabb_rotated_grows() {
        // A unit cube rotated 45 degrees about z spans sqrt(2) in x and y.
        let tx = Pose::from_axis_angle(Point3::origin(), Vector3::z(), FRAC_PI_4);
        let aabb = world_aabb(&tx, &Vector3::new(0.5, 0.5, 0.5));
        let half = std::f64::consts::SQRT_2 * 0.5;
        assert_relative_eq!(aabb.max.x, half, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.y, half, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_contains_point() {
        let tx = Pose::from_axis_angle(Point3::origin(), Vector3::z(), FRAC_PI_4);
        let e = Vector3::new(0.5, 0.5, 0.5);
        // The rotated corner reaches further out on x than the extent
        assert!(contains_point(&tx, &e, &Point3::new(0.6, 0.0, 0.0)));
        assert!(!contains_point(&tx, &e, &Point3::new(0.6, 0.4, 0.0)));
        assert!(contains_point(&tx, &e, &Point3::origin()));
    }

    #[test]
    fn test_raycast_straight_down() {
        let tx = Pose::identity();
        let e = Vector3::new(50.0, 1.0, 50.0);
        let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);

        assert!(raycast_obb(&tx, &e, &mut ray));
        assert_relative_eq!(ray.toi, 9.0, epsilon = 1e-12);
        assert_relative_eq!(ray.impact_point().y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ray.normal.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_raycast_miss() {
        let tx = Pose::identity();
        let e = Vector3::new(0.5, 0.5, 0.5);
        let mut ray = RayCast::new(Point3::new(2.0, 10.0, 0.0), -Vector3::y(), 100.0);
        assert!(!raycast_obb(&tx, &e, &mut ray));
    }

    #[test]
    fn test_raycast_respects_range() {
        let tx = Pose::identity();
        let e = Vector3::new(0.5, 0.5, 0.5);
        // Box is 9.5 units away but the ray stops after 5.
        let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 5.0);
        assert!(!raycast_obb(&tx, &e, &mut ray));
    }

    #[test]
    fn test_raycast_zero_length() {
        let tx = Pose::identity();
        let e = Vector3::new(0.5, 0.5, 0.5);
        let mut ray = RayCast::new(Point3::origin(), Vector3::x(), 0.0);
        assert!(!raycast_obb(&tx, &e, &mut ray));
    }

    #[test]
    fn test_raycast_rotated_box_normal() {
        let tx = Pose::from_axis_angle(Point3::origin(), Vector3::z(), FRAC_PI_4);
        let e = Vector3::new(0.5, 0.5, 0.5);
        let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);

        assert!(raycast_obb(&tx, &e, &mut ray));
        // Impact normal is one of the rotated faces, unit length.
        assert_relative_eq!(ray.normal.norm(), 1.0, epsilon = 1e-12);
        assert!(ray.normal.y > 0.5);
    }
}
