//! OBB vs OBB manifold generation.
//!
//! Separating-axis test over the fifteen candidate axes, then either
//! reference-face clipping (face axis) or closest-points-between-edges
//! (edge axis). Every face contact carries a [`FeaturePair`] built from
//! incident corner ids and reference clip-edge ids; edge contacts are
//! keyed by the winning axis index. The same geometry must produce the
//! same keys every step - warm starting depends on it.

use nalgebra::{Matrix3, Point3, Vector3};

use boxsim_types::Pose;

use crate::{Contact, FeaturePair, Manifold};

/// Relative tolerance biasing axis selection toward faces.
const REL_TOLERANCE: f64 = 0.95;

/// Absolute tolerance biasing axis selection toward faces.
const ABS_TOLERANCE: f64 = 0.01;

/// Rotation matrix entries this close to 1 mark near-parallel axes;
/// edge cross products are skipped entirely in that case.
const PARALLEL_TOLERANCE: f64 = 1.0e-6;

/// Clip distances within this of a side plane count as on the plane.
const ON_PLANE_TOLERANCE: f64 = 0.005;

/// A clip-space vertex carrying its feature tag.
#[derive(Debug, Clone, Copy, Default)]
struct ClipVertex {
    v: Vector3<f64>,
    f: FeaturePair,
}

/// Compute the contact manifold between two oriented boxes.
///
/// `manifold.count` is zero when the boxes are separated. On contact the
/// manifold normal points from box A to box B; tangents and the sensor
/// bit are left for the caller.
pub fn collide_boxes(
    manifold: &mut Manifold,
    tx_a: &Pose,
    e_a: &Vector3<f64>,
    tx_b: &Pose,
    e_b: &Vector3<f64>,
) {
    manifold.clear();

    let ra = tx_a.rotation_matrix();
    let rb = tx_b.rotation_matrix();

    // B's rotation expressed in A's frame, and its absolute value
    let c = ra.transpose() * rb;
    let mut abs_c = Matrix3::zeros();
    let mut parallel = false;
    for i in 0..3 {
        for j in 0..3 {
            let val = c[(i, j)].abs();
            abs_c[(i, j)] = val;
            if val + PARALLEL_TOLERANCE >= 1.0 {
                parallel = true;
            }
        }
    }

    let t_world = tx_b.position - tx_a.position;
    let t = ra.transpose() * t_world;

    // Separations are negative while overlapping; track the largest
    // (smallest overlap) per axis family.
    let mut a_max = f64::NEG_INFINITY;
    let mut a_axis = 0usize;
    let mut n_a = Vector3::zeros();

    let mut b_max = f64::NEG_INFINITY;
    let mut b_axis = 0usize;
    let mut n_b = Vector3::zeros();

    let mut e_max = f64::NEG_INFINITY;
    let mut e_axis = usize::MAX;
    let mut n_e = Vector3::zeros();

    // Face axes of A
    for i in 0..3 {
        let rb_proj = abs_c[(i, 0)] * e_b.x + abs_c[(i, 1)] * e_b.y + abs_c[(i, 2)] * e_b.z;
        let s = t[i].abs() - (e_a[i] + rb_proj);
        if s > 0.0 {
            return;
        }
        if s > a_max {
            a_max = s;
            a_axis = i;
            n_a = ra.column(i).into_owned();
        }
    }

    // Face axes of B
    for j in 0..3 {
        let t_proj = (t.x * c[(0, j)] + t.y * c[(1, j)] + t.z * c[(2, j)]).abs();
        let ra_proj = abs_c[(0, j)] * e_a.x + abs_c[(1, j)] * e_a.y + abs_c[(2, j)] * e_a.z;
        let s = t_proj - (e_b[j] + ra_proj);
        if s > 0.0 {
            return;
        }
        if s > b_max {
            b_max = s;
            b_axis = 3 + j;
            n_b = rb.column(j).into_owned();
        }
    }

    // Edge-edge cross axes
    if !parallel {
        for i in 0..3 {
            for j in 0..3 {
                let i1 = (i + 1) % 3;
                let i2 = (i + 2) % 3;
                let j1 = (j + 1) % 3;
                let j2 = (j + 2) % 3;

                let ra_proj = e_a[i1] * abs_c[(i2, j)] + e_a[i2] * abs_c[(i1, j)];
                let rb_proj = e_b[j1] * abs_c[(i, j2)] + e_b[j2] * abs_c[(i, j1)];
                let s = (t[i2] * c[(i1, j)] - t[i1] * c[(i2, j)]).abs() - (ra_proj + rb_proj);
                if s > 0.0 {
                    return;
                }

                // Axis direction: a_i x b_j in A's frame
                let mut axis = Vector3::zeros();
                axis[i] = 1.0;
                let axis = axis.cross(&c.column(j).into_owned());
                let len = axis.norm();
                if len < PARALLEL_TOLERANCE {
                    continue;
                }

                // Normalize the separation so it compares against faces
                let s = s / len;
                if s > e_max {
                    e_max = s;
                    e_axis = 6 + i * 3 + j;
                    n_e = ra * (axis / len);
                }
            }
        }
    }

    // Prefer face axes on near-ties; hysteresis keeps the manifold kind
    // stable across frames.
    let face_max = a_max.max(b_max);
    let (axis, mut n) = if e_axis != usize::MAX && REL_TOLERANCE * e_max > face_max + ABS_TOLERANCE
    {
        (e_axis, n_e)
    } else if REL_TOLERANCE * b_max > a_max + ABS_TOLERANCE {
        (b_axis, n_b)
    } else {
        (a_axis, n_a)
    };

    // Orient from A toward B
    if n.dot(&t_world) < 0.0 {
        n = -n;
    }

    if axis < 6 {
        face_contact(manifold, tx_a, e_a, tx_b, e_b, axis, n);
    } else {
        edge_contact(manifold, tx_a, e_a, tx_b, e_b, axis, n, e_max);
    }
}

/// Build a face manifold by clipping the incident face against the
/// reference face's side planes.
#[allow(clippy::too_many_arguments)]
fn face_contact(
    manifold: &mut Manifold,
    tx_a: &Pose,
    e_a: &Vector3<f64>,
    tx_b: &Pose,
    e_b: &Vector3<f64>,
    axis: usize,
    n: Vector3<f64>,
) {
    let (rtx, itx, e_r, e_i, flip) = if axis < 3 {
        (tx_a, tx_b, e_a, e_b, false)
    } else {
        (tx_b, tx_a, e_b, e_a, true)
    };
    // Points from the reference box toward the incident box
    let n_ref = if flip { -n } else { n };

    let incident = compute_incident_face(itx, e_i, &n_ref);
    let (basis, extents, clip_edges) = reference_face_basis(rtx, e_r, &n_ref, axis);

    let mut out = [ClipVertex::default(); 8];
    let mut depths = [0.0_f64; 8];
    let count = clip_incident_face(
        &rtx.position,
        &extents,
        &clip_edges,
        &basis,
        &incident,
        &mut out,
        &mut depths,
    );

    if count == 0 {
        return;
    }

    manifold.normal = n;

    if count > 4 {
        let picks = reduce_contacts(&out[..count], &depths[..count], &n);
        for &k in &picks {
            push_face_contact(manifold, &out[k], depths[k], flip);
        }
    } else {
        for k in 0..count {
            push_face_contact(manifold, &out[k], depths[k], flip);
        }
    }
}

fn push_face_contact(manifold: &mut Manifold, v: &ClipVertex, depth: f64, flip: bool) {
    let feature = if flip { v.f.swapped() } else { v.f };
    manifold.push(Contact::new(Point3::from(v.v), depth, feature));
}

/// Build the single-point manifold for an edge-edge axis.
#[allow(clippy::too_many_arguments)]
fn edge_contact(
    manifold: &mut Manifold,
    tx_a: &Pose,
    e_a: &Vector3<f64>,
    tx_b: &Pose,
    e_b: &Vector3<f64>,
    axis: usize,
    n: Vector3<f64>,
    separation: f64,
) {
    let (pa, qa) = support_edge(tx_a, e_a, &n);
    let (pb, qb) = support_edge(tx_b, e_b, &(-n));
    let (ca, cb) = closest_on_edges(&pa, &qa, &pb, &qb);

    manifold.normal = n;
    // The axis index identifies the two supporting edges across frames.
    #[allow(clippy::cast_possible_truncation)]
    let feature = FeaturePair::from_key(axis as u32);
    let mid = Point3::from((ca.coords + cb.coords) * 0.5);
    manifold.push(Contact::new(mid, -separation, feature));
}

/// The four vertices of the incident face whose outward normal is most
/// anti-parallel to the reference normal, tagged with corner ids.
fn compute_incident_face(itx: &Pose, e: &Vector3<f64>, n_ref: &Vector3<f64>) -> [ClipVertex; 4] {
    let n = itx.inverse_transform_vector(n_ref);
    let abs_n = n.abs();

    let axis = if abs_n.x > abs_n.y && abs_n.x > abs_n.z {
        0
    } else if abs_n.y > abs_n.z {
        1
    } else {
        2
    };
    // Outward normal of the incident face opposes the reference normal
    let sign = if n[axis] > 0.0 { -1.0 } else { 1.0 };

    let u = (axis + 1) % 3;
    let v = (axis + 2) % 3;

    let mut out = [ClipVertex::default(); 4];
    for (k, (su, sv)) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)]
        .into_iter()
        .enumerate()
    {
        let mut p = Vector3::zeros();
        p[axis] = sign * e[axis];
        p[u] = su * e[u];
        p[v] = sv * e[v];

        let id = corner_id(axis, sign, u, su, v, sv);
        out[k].v = itx.transform_point(&Point3::from(p)).coords;
        out[k].f = FeaturePair {
            in_r: 0,
            out_r: 0,
            in_i: id,
            out_i: id,
        };
    }
    out
}

/// Corner id from the sign along each local axis: bit i set when the
/// corner sits at +e on axis i.
fn corner_id(axis: usize, sign: f64, u: usize, su: f64, v: usize, sv: f64) -> u8 {
    let mut id = 0u8;
    if sign > 0.0 {
        id |= 1 << axis;
    }
    if su > 0.0 {
        id |= 1 << u;
    }
    if sv > 0.0 {
        id |= 1 << v;
    }
    id
}

/// World-space basis (u, v, n) of the reference face, its half-extents
/// in that basis, and the ids of its four side planes.
fn reference_face_basis(
    rtx: &Pose,
    e_r: &Vector3<f64>,
    n_ref: &Vector3<f64>,
    axis: usize,
) -> (Matrix3<f64>, Vector3<f64>, [u8; 4]) {
    let a = if axis < 3 { axis } else { axis - 3 };
    let n_local = rtx.inverse_transform_vector(n_ref);
    let positive = n_local[a] > 0.0;

    // Swap u and v on negative faces so u x v = n holds
    let (u_idx, v_idx) = if positive {
        ((a + 1) % 3, (a + 2) % 3)
    } else {
        ((a + 2) % 3, (a + 1) % 3)
    };

    let r = rtx.rotation_matrix();
    let u = r.column(u_idx).into_owned();
    let v = r.column(v_idx).into_owned();
    let w = if positive {
        r.column(a).into_owned()
    } else {
        -r.column(a).into_owned()
    };
    let basis = Matrix3::from_columns(&[u, v, w]);
    let extents = Vector3::new(e_r[u_idx], e_r[v_idx], e_r[a]);

    #[allow(clippy::cast_possible_truncation)]
    let face_id = (a * 2 + usize::from(!positive)) as u8;
    let clip_edges = [
        face_id * 4,
        face_id * 4 + 1,
        face_id * 4 + 2,
        face_id * 4 + 3,
    ];

    (basis, extents, clip_edges)
}

/// Sutherland-Hodgman clip of the incident face against the four side
/// planes of the reference face, then the keep-below-face depth filter.
///
/// Returns the number of surviving vertices; positions come back in
/// world space with positive penetrations.
fn clip_incident_face(
    center: &Point3<f64>,
    extents: &Vector3<f64>,
    clip_edges: &[u8; 4],
    basis: &Matrix3<f64>,
    incident: &[ClipVertex; 4],
    out_verts: &mut [ClipVertex; 8],
    out_depths: &mut [f64; 8],
) -> usize {
    let mut poly_a = [ClipVertex::default(); 8];
    let mut poly_b = [ClipVertex::default(); 8];

    // Into the reference-face frame
    for (dst, src) in poly_a.iter_mut().zip(incident.iter()) {
        *dst = ClipVertex {
            v: basis.transpose() * (src.v - center.coords),
            f: src.f,
        };
    }

    let mut count = 4;
    count = orthographic(1.0, extents.x, 0, clip_edges[0], &poly_a, count, &mut poly_b);
    if count == 0 {
        return 0;
    }
    count = orthographic(1.0, extents.y, 1, clip_edges[1], &poly_b, count, &mut poly_a);
    if count == 0 {
        return 0;
    }
    count = orthographic(-1.0, extents.x, 0, clip_edges[2], &poly_a, count, &mut poly_b);
    if count == 0 {
        return 0;
    }
    count = orthographic(-1.0, extents.y, 1, clip_edges[3], &poly_b, count, &mut poly_a);

    // Keep only points at or below the reference face
    let mut kept = 0;
    for vertex in poly_a.iter().take(count) {
        let d = vertex.v.z - extents.z;
        if d <= 0.0 {
            out_verts[kept] = ClipVertex {
                v: basis * vertex.v + center.coords,
                f: vertex.f,
            };
            out_depths[kept] = -d;
            kept += 1;
        }
    }
    kept
}

/// Clip a polygon against one side plane (`sign * v[axis] <= extent`),
/// tagging generated vertices with the plane's clip-edge id.
fn orthographic(
    sign: f64,
    extent: f64,
    axis: usize,
    clip_edge: u8,
    input: &[ClipVertex; 8],
    in_count: usize,
    output: &mut [ClipVertex; 8],
) -> usize {
    let in_front = |d: f64| d < 0.0;
    let behind = |d: f64| d >= 0.0;
    let on = |d: f64| d.abs() < ON_PLANE_TOLERANCE;

    let mut out_count = 0;
    let mut push = |cv: ClipVertex, out_count: &mut usize| {
        debug_assert!(*out_count < 8);
        if *out_count < 8 {
            output[*out_count] = cv;
            *out_count += 1;
        }
    };

    let mut a = input[in_count - 1];
    for &b in input.iter().take(in_count) {
        let da = sign * a.v[axis] - extent;
        let db = sign * b.v[axis] - extent;

        if (in_front(da) && in_front(db)) || on(da) || on(db) {
            // Edge stays inside
            push(b, &mut out_count);
        } else if in_front(da) && behind(db) {
            // Leaving: emit the crossing point
            let mut cv = ClipVertex {
                v: a.v + (b.v - a.v) * (da / (da - db)),
                f: b.f,
            };
            cv.f.out_r = clip_edge;
            cv.f.out_i = 0;
            push(cv, &mut out_count);
        } else if behind(da) && in_front(db) {
            // Entering: emit the crossing point, then the inside vertex
            let mut cv = ClipVertex {
                v: a.v + (b.v - a.v) * (da / (da - db)),
                f: a.f,
            };
            cv.f.in_r = clip_edge;
            cv.f.in_i = 0;
            push(cv, &mut out_count);
            push(b, &mut out_count);
        }

        a = b;
    }
    out_count
}

/// Reduce more than four clip survivors to the four that best span the
/// contact region: the deepest point, the point farthest from it, and
/// the two points maximizing triangle area on either side.
fn reduce_contacts(verts: &[ClipVertex], depths: &[f64], normal: &Vector3<f64>) -> [usize; 4] {
    let mut deepest = 0;
    for (i, &d) in depths.iter().enumerate() {
        if d > depths[deepest] {
            deepest = i;
        }
    }
    let p0 = verts[deepest].v;

    let mut farthest = usize::MAX;
    let mut best = f64::NEG_INFINITY;
    for (i, v) in verts.iter().enumerate() {
        if i == deepest {
            continue;
        }
        let d = (v.v - p0).norm_squared();
        if d > best {
            best = d;
            farthest = i;
        }
    }
    let p1 = verts[farthest].v;

    let signed_area = |x: &Vector3<f64>| (p1 - p0).cross(&(x - p0)).dot(normal);

    let mut third = usize::MAX;
    let mut best = f64::NEG_INFINITY;
    for (i, v) in verts.iter().enumerate() {
        if i == deepest || i == farthest {
            continue;
        }
        let area = signed_area(&v.v);
        if area > best {
            best = area;
            third = i;
        }
    }

    let mut fourth = usize::MAX;
    let mut best = f64::INFINITY;
    for (i, v) in verts.iter().enumerate() {
        if i == deepest || i == farthest || i == third {
            continue;
        }
        let area = signed_area(&v.v);
        if area < best {
            best = area;
            fourth = i;
        }
    }

    [deepest, farthest, third, fourth]
}

/// The edge of the box most extreme along `n`.
fn support_edge(tx: &Pose, e: &Vector3<f64>, n: &Vector3<f64>) -> (Point3<f64>, Point3<f64>) {
    let n = tx.inverse_transform_vector(n);
    let abs_n = n.abs();

    // The edge runs along the axis with the smallest |n| component
    let (a, b) = if abs_n.x > abs_n.y {
        if abs_n.y > abs_n.z {
            (
                Vector3::new(e.x, e.y, e.z),
                Vector3::new(e.x, e.y, -e.z),
            )
        } else {
            (
                Vector3::new(e.x, e.y, e.z),
                Vector3::new(e.x, -e.y, e.z),
            )
        }
    } else if abs_n.x > abs_n.z {
        (
            Vector3::new(e.x, e.y, e.z),
            Vector3::new(e.x, e.y, -e.z),
        )
    } else {
        (
            Vector3::new(e.x, e.y, e.z),
            Vector3::new(-e.x, e.y, e.z),
        )
    };

    let sign = Vector3::new(n.x.signum(), n.y.signum(), n.z.signum());
    let a = a.component_mul(&sign);
    let b = b.component_mul(&sign);

    (
        tx.transform_point(&Point3::from(a)),
        tx.transform_point(&Point3::from(b)),
    )
}

/// Closest points between two (infinite) edge lines, clamped against a
/// degenerate denominator.
fn closest_on_edges(
    pa: &Point3<f64>,
    qa: &Point3<f64>,
    pb: &Point3<f64>,
    qb: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let da = qa - pa;
    let db = qb - pb;
    let r = pa - pb;

    let a = da.dot(&da);
    let e = db.dot(&db);
    let f = db.dot(&r);
    let c = da.dot(&r);
    let b = da.dot(&db);

    let denom = a * e - b * b;
    let ta = if denom.abs() > 1e-12 {
        (b * f - c * e) / denom
    } else {
        0.0
    };
    let tb = if e > 1e-12 { (b * ta + f) / e } else { 0.0 };

    (pa + da * ta, pb + db * tb)
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
    use std::f64::consts::FRAC_PI_4;

    fn unit() -> Vector3<f64> {
        Vector3::new(0.5, 0.5, 0.5)
    }

    fn collide(a: &Pose, ea: &Vector3<f64>, b: &Pose, eb: &Vector3<f64>) -> Manifold {
        let mut m = Manifold::new();
        collide_boxes(&mut m, a, ea, b, eb);
        m
    }

    #[test]
    fn test_separated_boxes() {
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(3.0, 0.0, 0.0));
        let m = collide(&a, &unit(), &b, &unit());
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_stacked_face_contact() {
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(0.0, 0.95, 0.0));
        let m = collide(&a, &unit(), &b, &unit());

        assert_eq!(m.count, 4);
        assert_relative_eq!(m.normal.y, 1.0, epsilon = 1e-12);
        for c in m.contacts() {
            assert_relative_eq!(c.penetration, 0.05, epsilon = 1e-9);
            assert!(c.position.y > 0.4 && c.position.y < 0.5);
        }
    }

    #[test]
    fn test_normal_points_a_to_b() {
        let a = Pose::from_position(Point3::new(0.0, 1.0, 0.0));
        let b = Pose::identity();
        let m = collide(&a, &unit(), &b, &unit());
        // B is below A, so A->B points down
        assert!(m.count > 0);
        assert_relative_eq!(m.normal.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cube_on_wide_floor() {
        let floor = Pose::identity();
        let floor_e = Vector3::new(50.0, 1.0, 50.0);
        let cube = Pose::from_position(Point3::new(0.0, 1.45, 0.0));
        let m = collide(&floor, &floor_e, &cube, &unit());

        assert_eq!(m.count, 4);
        assert_relative_eq!(m.normal.y, 1.0, epsilon = 1e-12);
        for c in m.contacts() {
            assert_relative_eq!(c.penetration, 0.05, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotated_overlap_reduces_to_four() {
        // A 45-degree twist makes the clipped polygon an octagon; the
        // reducer must bring it back to a spanning four.
        let a = Pose::identity();
        let b = Pose::from_axis_angle(Point3::new(0.0, 0.95, 0.0), Vector3::y(), FRAC_PI_4);
        let m = collide(&a, &unit(), &b, &unit());

        assert_eq!(m.count, 4);
        assert_relative_eq!(m.normal.y, 1.0, epsilon = 1e-9);

        // The four picks must be distinct points
        for i in 0..4 {
            for j in (i + 1)..4 {
                let d = (m.contacts[i].position - m.contacts[j].position).norm();
                assert!(d > 1e-6, "duplicate contact points after reduction");
            }
        }
    }

    #[test]
    fn test_edge_edge_contact() {
        // Two cubes rotated about different axes so their closest
        // features are crossing edges.
        let half = std::f64::consts::SQRT_2 * 0.5;
        let a = Pose::from_axis_angle(Point3::origin(), Vector3::z(), FRAC_PI_4);
        let b = Pose::from_axis_angle(
            Point3::new(0.0, 2.0 * half - 0.05, 0.0),
            Vector3::x(),
            FRAC_PI_4,
        );
        let m = collide(&a, &unit(), &b, &unit());

        assert_eq!(m.count, 1, "edge contact must produce exactly one point");
        assert!(m.contacts[0].penetration > 0.0);
        assert!(m.normal.y.abs() > 0.9, "normal {:?}", m.normal);
        // Contact sits near the crossing of the two edges
        assert!(m.contacts[0].position.x.abs() < 0.1);
        assert!(m.contacts[0].position.z.abs() < 0.1);
    }

    #[test]
    fn test_feature_keys_stable_across_frames() {
        let a = Pose::identity();
        let e = unit();

        let b0 = Pose::from_position(Point3::new(0.1, 0.95, 0.05));
        let b1 = Pose::from_position(Point3::new(0.1, 0.949, 0.051));

        let m0 = collide(&a, &e, &b0, &e);
        let m1 = collide(&a, &e, &b1, &e);

        assert_eq!(m0.count, m1.count);
        let mut k0: Vec<u32> = m0.contacts().iter().map(|c| c.feature.key()).collect();
        let mut k1: Vec<u32> = m1.contacts().iter().map(|c| c.feature.key()).collect();
        k0.sort_unstable();
        k1.sort_unstable();
        assert_eq!(k0, k1, "keys must be stable for persistent geometry");
    }

    #[test]
    fn test_face_keys_are_distinct() {
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(0.0, 0.9, 0.0));
        let m = collide(&a, &unit(), &b, &unit());

        let mut keys: Vec<u32> = m.contacts().iter().map(|c| c.feature.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), m.count, "keys within a manifold must differ");
    }

    #[test]
    fn test_swapped_pair_points_down() {
        // Same geometry as the floor test but with the cube as A: the
        // normal must flip to keep pointing from A to B.
        let cube = Pose::from_position(Point3::new(0.0, 1.45, 0.0));
        let floor = Pose::identity();
        let floor_e = Vector3::new(50.0, 1.0, 50.0);
        let m = collide(&cube, &unit(), &floor, &floor_e);

        assert_eq!(m.count, 4);
        assert_relative_eq!(m.normal.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deep_overlap_still_resolves() {
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(0.0, 0.5, 0.0));
        let m = collide(&a, &unit(), &b, &unit());
        assert!(m.count > 0);
        for c in m.contacts() {
            assert_relative_eq!(c.penetration, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_point_boxes_do_not_panic() {
        let a = Pose::identity();
        let b = Pose::from_position(Point3::new(0.0, 0.25, 0.0));
        let m = collide(&a, &Vector3::zeros(), &b, &unit());
        // Zero-extent box inside the other: some contact, no panic.
        assert!(m.count <= 4);
    }
}
