//! Broadphase collision detection over fattened AABBs.
//!
//! The broadphase maintains a mapping from integer handles to fattened
//! world-space AABBs. Stored AABBs are the tight bounds expanded by a
//! constant margin so that a slowly moving box can translate inside its
//! stored bounds without churning the pair set.
//!
//! # Pair generation contract
//!
//! [`update`](BroadPhase::update) marks a handle *moved* only when the
//! stored fat AABB no longer contains the new tight AABB. Pair
//! generation walks the moved set, emits every `(min, max)` handle pair
//! whose stored AABBs overlap, sorts the pairs lexicographically,
//! collapses duplicates (a pair touched from both ends appears twice),
//! and finally resets the moved set. The backing store here is a flat
//! slot array scanned linearly; a dynamic AABB tree or grid could sit
//! behind the same interface unchanged.

use boxsim_types::{Aabb, BodyId, RayCast};

/// Margin added to every side of a stored AABB.
pub const AABB_FATTENING: f64 = 0.5;

/// Guards slab tests against axis-aligned ray directions.
const RAY_EPSILON: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy)]
struct Proxy {
    aabb: Aabb,
    body: BodyId,
}

/// Handle-addressed store of fattened AABBs with a moved set.
#[derive(Debug, Clone, Default)]
pub struct BroadPhase {
    proxies: Vec<Option<Proxy>>,
    free: Vec<usize>,
    moved: Vec<usize>,
    pairs: Vec<(usize, usize)>,
}

impl BroadPhase {
    /// An empty broadphase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len() - self.free.len()
    }

    /// Whether the broadphase holds no proxies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a box with its tight AABB; returns the proxy handle.
    ///
    /// The stored AABB is fattened, and the new proxy starts in the
    /// moved set so the next pair generation sees it. Handles of removed
    /// proxies are reused.
    pub fn insert(&mut self, body: BodyId, aabb: &Aabb) -> usize {
        let proxy = Proxy {
            aabb: aabb.expanded(AABB_FATTENING),
            body,
        };
        let handle = if let Some(slot) = self.free.pop() {
            self.proxies[slot] = Some(proxy);
            slot
        } else {
            self.proxies.push(Some(proxy));
            self.proxies.len() - 1
        };
        self.moved.push(handle);
        handle
    }

    /// Remove a proxy. Its handle may be reused by later inserts.
    pub fn remove(&mut self, handle: usize) {
        debug_assert!(self.proxies[handle].is_some(), "removing a dead proxy");
        if self.proxies[handle].take().is_some() {
            self.free.push(handle);
        }
    }

    /// Update a proxy with a new tight AABB.
    ///
    /// A no-op while the stored fat AABB still contains the tight one;
    /// otherwise the stored AABB is re-fattened and the handle joins the
    /// moved set.
    pub fn update(&mut self, handle: usize, aabb: &Aabb) {
        let Some(proxy) = self.proxies[handle].as_mut() else {
            debug_assert!(false, "updating a dead proxy");
            return;
        };
        if !proxy.aabb.contains(aabb) {
            proxy.aabb = aabb.expanded(AABB_FATTENING);
            self.moved.push(handle);
        }
    }

    /// Whether the stored fat AABBs of two proxies overlap.
    #[must_use]
    pub fn test_overlap(&self, a: usize, b: usize) -> bool {
        match (&self.proxies[a], &self.proxies[b]) {
            (Some(pa), Some(pb)) => pa.aabb.overlaps(&pb.aabb),
            _ => false,
        }
    }

    /// The stored fat AABB of a proxy.
    #[must_use]
    pub fn fat_aabb(&self, handle: usize) -> Option<Aabb> {
        self.proxies.get(handle).copied().flatten().map(|p| p.aabb)
    }

    /// Generate the unique overlapping pairs involving the moved set,
    /// then reset it.
    ///
    /// Every moved proxy is tested against every live proxy; pairs come
    /// back as `(BodyId, BodyId)` sorted by handle with duplicates
    /// collapsed.
    pub fn update_pairs(&mut self) -> Vec<(BodyId, BodyId)> {
        self.pairs.clear();

        for &m in &self.moved {
            let Some(moving) = self.proxies[m] else {
                // Removed after being marked moved
                continue;
            };
            for (i, slot) in self.proxies.iter().enumerate() {
                if i == m {
                    continue;
                }
                let Some(other) = slot else { continue };
                if moving.aabb.overlaps(&other.aabb) {
                    self.pairs.push((m.min(i), m.max(i)));
                }
            }
        }
        self.moved.clear();

        self.pairs.sort_unstable();
        self.pairs.dedup();

        self.pairs
            .iter()
            .filter_map(|&(a, b)| {
                let pa = self.proxies[a]?;
                let pb = self.proxies[b]?;
                Some((pa.body, pb.body))
            })
            .collect()
    }

    /// Visit every proxy whose fat AABB overlaps `aabb`.
    ///
    /// The callback returns `false` to stop early.
    pub fn query_aabb(&self, aabb: &Aabb, mut cb: impl FnMut(BodyId) -> bool) {
        for slot in self.proxies.iter().flatten() {
            if slot.aabb.overlaps(aabb) && !cb(slot.body) {
                return;
            }
        }
    }

    /// Visit every proxy whose fat AABB is crossed by the ray segment.
    ///
    /// Separating-axis slab test between the segment and each stored
    /// AABB, with a small epsilon protecting axis-aligned directions.
    /// The callback returns `false` to stop early.
    pub fn query_ray(&self, ray: &RayCast, mut cb: impl FnMut(BodyId) -> bool) {
        let p0 = ray.start;
        let p1 = ray.end_point();
        let d = p1 - p0;

        for slot in self.proxies.iter().flatten() {
            let aabb = &slot.aabb;
            let e = aabb.max - aabb.min;
            let m = (p0.coords + p1.coords) - (aabb.min.coords + aabb.max.coords);

            let mut ad = d.abs();
            if m.x.abs() > e.x + ad.x || m.y.abs() > e.y + ad.y || m.z.abs() > e.z + ad.z {
                continue;
            }

            ad.x += RAY_EPSILON;
            ad.y += RAY_EPSILON;
            ad.z += RAY_EPSILON;

            if (m.y * d.z - m.z * d.y).abs() > e.y * ad.z + e.z * ad.y
                || (m.z * d.x - m.x * d.z).abs() > e.x * ad.z + e.z * ad.x
                || (m.x * d.y - m.y * d.x).abs() > e.x * ad.y + e.y * ad.x
            {
                continue;
            }

            if !cb(slot.body) {
                return;
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
    use nalgebra::{Point3, Vector3};

    fn unit_aabb(center: Point3<f64>) -> Aabb {
        Aabb::from_center(center, Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_insert_fattens() {
        let mut bp = BroadPhase::new();
        let h = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        let fat = bp.fat_aabb(h).unwrap();
        assert_eq!(fat.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(fat.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_update_inside_fat_is_noop() {
        let mut bp = BroadPhase::new();
        let h = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        let _ = bp.update_pairs(); // drain the insert's moved entry

        // Small translation stays inside the fat bounds
        bp.update(h, &unit_aabb(Point3::new(0.3, 0.0, 0.0)));
        let fat = bp.fat_aabb(h).unwrap();
        assert_eq!(fat.min.x, -1.0, "stored AABB must not move");

        // Large translation escapes and re-fattens
        bp.update(h, &unit_aabb(Point3::new(2.0, 0.0, 0.0)));
        let fat = bp.fat_aabb(h).unwrap();
        assert_eq!(fat.min.x, 1.0);
    }

    #[test]
    fn test_pairs_unique_and_complete() {
        let mut bp = BroadPhase::new();
        // Three mutually overlapping boxes: C(3,2) = 3 pairs even though
        // each pair is reachable from both of its ends.
        let a = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        let b = bp.insert(BodyId::new(1), &unit_aabb(Point3::new(0.4, 0.0, 0.0)));
        let c = bp.insert(BodyId::new(2), &unit_aabb(Point3::new(0.0, 0.4, 0.0)));
        let _ = (a, b, c);

        let pairs = bp.update_pairs();
        assert_eq!(pairs.len(), 3);

        // Moved set was reset: nothing new without motion
        assert!(bp.update_pairs().is_empty());
    }

    #[test]
    fn test_moved_proxy_reports_all_overlaps() {
        let mut bp = BroadPhase::new();
        let mover = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        for i in 1..5 {
            bp.insert(
                BodyId::new(i),
                &unit_aabb(Point3::new(0.2 * f64::from(i), 0.0, 0.0)),
            );
        }
        let _ = bp.update_pairs();

        // Move only the first proxy; it overlaps all four others and
        // every one of those pairs must be reported.
        bp.update(mover, &unit_aabb(Point3::new(4.0, 0.0, 0.0)));
        bp.update(mover, &unit_aabb(Point3::new(0.1, 0.0, 0.0)));
        let pairs = bp.update_pairs();
        let with_mover = pairs
            .iter()
            .filter(|(a, b)| *a == BodyId::new(0) || *b == BodyId::new(0))
            .count();
        assert_eq!(with_mover, 4);
    }

    #[test]
    fn test_handle_reuse() {
        let mut bp = BroadPhase::new();
        let a = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        bp.remove(a);
        let b = bp.insert(BodyId::new(1), &unit_aabb(Point3::new(5.0, 0.0, 0.0)));
        assert_eq!(a, b, "freed handles are reused");
        assert_eq!(bp.len(), 1);

        // The stale moved entry from the removed proxy must not emit
        // pairs for the new occupant with itself.
        let pairs = bp.update_pairs();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_removed_proxy_ignored_by_queries() {
        let mut bp = BroadPhase::new();
        let a = bp.insert(BodyId::new(0), &unit_aabb(Point3::origin()));
        let _b = bp.insert(BodyId::new(1), &unit_aabb(Point3::new(0.2, 0.0, 0.0)));
        bp.remove(a);

        let mut seen = Vec::new();
        bp.query_aabb(&unit_aabb(Point3::origin()), |id| {
            seen.push(id);
            true
        });
        assert_eq!(seen, vec![BodyId::new(1)]);
    }

    #[test]
    fn test_query_aabb_early_exit() {
        let mut bp = BroadPhase::new();
        for i in 0..4 {
            bp.insert(BodyId::new(i), &unit_aabb(Point3::origin()));
        }
        let mut count = 0;
        bp.query_aabb(&unit_aabb(Point3::origin()), |_| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_query_ray_hits_boxes_on_line() {
        let mut bp = BroadPhase::new();
        bp.insert(BodyId::new(0), &unit_aabb(Point3::new(0.0, 0.0, 0.0)));
        bp.insert(BodyId::new(1), &unit_aabb(Point3::new(0.0, -5.0, 0.0)));
        bp.insert(BodyId::new(2), &unit_aabb(Point3::new(10.0, 0.0, 0.0)));

        let ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);
        let mut hits = Vec::new();
        bp.query_ray(&ray, |id| {
            hits.push(id);
            true
        });
        hits.sort();
        assert_eq!(hits, vec![BodyId::new(0), BodyId::new(1)]);
    }

    #[test]
    fn test_query_ray_respects_segment_length() {
        let mut bp = BroadPhase::new();
        bp.insert(BodyId::new(0), &unit_aabb(Point3::new(0.0, -5.0, 0.0)));

        let short = RayCast::new(Point3::origin(), -Vector3::y(), 2.0);
        let mut hit = false;
        bp.query_ray(&short, |_| {
            hit = true;
            true
        });
        assert!(!hit, "segment ends before the box");
    }
}
