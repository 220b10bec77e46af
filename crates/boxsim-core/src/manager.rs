//! The contact manager: persistent constraint bookkeeping.
//!
//! Constraints live in a dense arena; each body keeps the indices of the
//! constraints touching it. Removal is swap-remove with back-patching of
//! the moved constraint's adjacency entries, which keeps destruction
//! O(degree) while the arena stays contiguous for the per-step sweep.

use boxsim_contact::{mix_friction, mix_restitution, ContactConstraint};
use boxsim_types::BodyId;

use crate::body::Body;
use crate::broad_phase::BroadPhase;
use crate::scene::{body_slot, body_slot_mut};

/// Receives contact begin/end events during
/// [`Scene::step_with_events`](crate::Scene::step_with_events).
///
/// Events fire when a constraint's touching state toggles, including for
/// sensors. The default implementations do nothing.
pub trait ContactListener {
    /// Two boxes started touching this step.
    fn begin_contact(&mut self, a: BodyId, b: BodyId) {
        let _ = (a, b);
    }

    /// Two boxes stopped touching this step (or their constraint was
    /// destroyed while touching).
    fn end_contact(&mut self, a: BodyId, b: BodyId) {
        let _ = (a, b);
    }
}

/// Listener that ignores every event.
pub(crate) struct NoListener;

impl ContactListener for NoListener {}

/// Owns every persistent contact constraint in the scene.
#[derive(Debug, Clone, Default)]
pub struct ContactManager {
    pub(crate) constraints: Vec<ContactConstraint>,
}

impl ContactManager {
    /// Number of live constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// The live constraints.
    #[must_use]
    pub fn constraints(&self) -> &[ContactConstraint] {
        &self.constraints
    }

    /// Register a broadphase pair, creating a constraint unless the pair
    /// is filtered or already tracked.
    pub(crate) fn add_contact(&mut self, bodies: &mut [Option<Body>], a: BodyId, b: BodyId) {
        let (friction, restitution, sensor) = {
            let body_a = body_slot(bodies, a);
            let body_b = body_slot(bodies, b);

            if !body_a.can_collide(body_b) {
                return;
            }
            let (Some(box_a), Some(box_b)) = (&body_a.collider, &body_b.collider) else {
                return;
            };

            // Walk A's adjacency: one constraint per pair
            for &ci in &body_a.edges {
                if self.constraints[ci].is_pair(a, b) {
                    return;
                }
            }

            (
                mix_friction(box_a.friction, box_b.friction),
                mix_restitution(box_a.restitution, box_b.restitution),
                box_a.sensor || box_b.sensor,
            )
        };

        let index = self.constraints.len();
        self.constraints
            .push(ContactConstraint::new(a, b, friction, restitution, sensor));
        body_slot_mut(bodies, a).edges.push(index);
        body_slot_mut(bodies, b).edges.push(index);
    }

    /// Destroy a constraint, unlinking it from both bodies.
    pub(crate) fn remove_contact(&mut self, bodies: &mut [Option<Body>], index: usize) {
        let removed = self.constraints.swap_remove(index);
        unlink_edge(body_slot_mut(bodies, removed.body_a), index);
        unlink_edge(body_slot_mut(bodies, removed.body_b), index);

        // Back-patch the constraint that slid into `index`
        let moved_from = self.constraints.len();
        if index < moved_from {
            let (a, b) = {
                let moved = &self.constraints[index];
                (moved.body_a, moved.body_b)
            };
            repatch_edge(body_slot_mut(bodies, a), moved_from, index);
            repatch_edge(body_slot_mut(bodies, b), moved_from, index);
        }
    }

    /// Destroy every constraint touching a body.
    ///
    /// Each removal unlinks the entry being traversed, so the walk
    /// re-reads the head of the adjacency list instead of iterating it.
    pub(crate) fn remove_contacts_from_body(&mut self, bodies: &mut [Option<Body>], id: BodyId) {
        loop {
            let Some(&index) = body_slot(bodies, id).edges.first() else {
                break;
            };
            self.remove_contact(bodies, index);
        }
    }

    /// Refresh every constraint: prune pairs that no longer qualify,
    /// re-run the narrowphase on the rest, and carry warm-start
    /// impulses across by feature key.
    pub(crate) fn test_collisions(
        &mut self,
        bodies: &mut [Option<Body>],
        broadphase: &BroadPhase,
        listener: &mut dyn ContactListener,
    ) {
        let mut i = 0;
        while i < self.constraints.len() {
            self.constraints[i].island = false;

            let (a, b) = (self.constraints[i].body_a, self.constraints[i].body_b);
            let was_touching = self.constraints[i].colliding;

            let keep = {
                let body_a = body_slot(bodies, a);
                let body_b = body_slot(bodies, b);
                body_a.can_collide(body_b)
                    && match (body_a.proxy, body_b.proxy) {
                        (Some(pa), Some(pb)) => broadphase.test_overlap(pa, pb),
                        _ => false,
                    }
            };

            if !keep {
                if was_touching {
                    listener.end_contact(a, b);
                }
                self.remove_contact(bodies, i);
                continue;
            }

            {
                let body_a = body_slot(bodies, a);
                let body_b = body_slot(bodies, b);
                let (Some(box_a), Some(box_b)) = (&body_a.collider, &body_b.collider) else {
                    debug_assert!(false, "constraint without colliders survived filtering");
                    i += 1;
                    continue;
                };

                let tx_a = box_a.world_pose(&body_a.pose);
                let tx_b = box_b.world_pose(&body_b.pose);
                let (e_a, e_b) = (box_a.half_extents, box_b.half_extents);

                self.constraints[i].update(&tx_a, &e_a, &tx_b, &e_b);
            }

            if self.constraints[i].began_touching() {
                listener.begin_contact(a, b);
            } else if self.constraints[i].stopped_touching() {
                listener.end_contact(a, b);
            }

            i += 1;
        }
    }
}

fn unlink_edge(body: &mut Body, index: usize) {
    if let Some(pos) = body.edges.iter().position(|&e| e == index) {
        body.edges.swap_remove(pos);
    }
}

fn repatch_edge(body: &mut Body, from: usize, to: usize) {
    for e in &mut body.edges {
        if *e == from {
            *e = to;
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
    use boxsim_collide::world_aabb;
    use boxsim_types::{BodyDef, BodyType, BoxCollider, BoxDef, Pose};
    use nalgebra::{Point3, Vector3};

    fn make_bodies(positions: &[(f64, f64, f64)]) -> (Vec<Option<Body>>, BroadPhase) {
        let mut bodies = Vec::new();
        let mut bp = BroadPhase::new();
        for (i, &(x, y, z)) in positions.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = BodyId::new(i as u32);
            let def = BodyDef::new(BodyType::Dynamic).with_position(Point3::new(x, y, z));
            let mut body = Body::new(id, &def);
            let collider =
                BoxCollider::from(BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)));
            body.collider = Some(collider);
            body.calculate_mass_data();
            let aabb = world_aabb(&body.pose, &collider.half_extents);
            body.proxy = Some(bp.insert(id, &aabb));
            bodies.push(Some(body));
        }
        (bodies, bp)
    }

    #[test]
    fn test_add_contact_deduplicates() {
        let (mut bodies, _bp) = make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0)]);
        let mut manager = ContactManager::default();

        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));
        manager.add_contact(&mut bodies, BodyId::new(1), BodyId::new(0));

        assert_eq!(manager.constraint_count(), 1);
        assert_eq!(bodies[0].as_ref().unwrap().edges.len(), 1);
        assert_eq!(bodies[1].as_ref().unwrap().edges.len(), 1);
    }

    #[test]
    fn test_add_contact_rejects_self_and_nondynamic() {
        let (mut bodies, _bp) = make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0)]);
        let mut manager = ContactManager::default();

        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(0));
        assert_eq!(manager.constraint_count(), 0);

        for body in bodies.iter_mut().flatten() {
            body.body_type = BodyType::Static;
        }
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));
        assert_eq!(manager.constraint_count(), 0);
    }

    #[test]
    fn test_remove_contact_backpatches() {
        let (mut bodies, _bp) =
            make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0), (0.9, 0.0, 0.0)]);
        let mut manager = ContactManager::default();

        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(2));
        manager.add_contact(&mut bodies, BodyId::new(1), BodyId::new(2));
        assert_eq!(manager.constraint_count(), 3);

        // Removing index 0 swaps constraint 2 into slot 0; the adjacency
        // of bodies 1 and 2 must follow it.
        manager.remove_contact(&mut bodies, 0);
        assert_eq!(manager.constraint_count(), 2);
        for body in bodies.iter().flatten() {
            for &e in &body.edges {
                assert!(e < 2, "stale constraint index {e} in adjacency");
                assert!(manager.constraints[e].involves(body.id));
            }
        }
    }

    #[test]
    fn test_remove_contacts_from_body() {
        let (mut bodies, _bp) =
            make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0), (0.9, 0.0, 0.0)]);
        let mut manager = ContactManager::default();

        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(2));
        manager.add_contact(&mut bodies, BodyId::new(1), BodyId::new(2));

        manager.remove_contacts_from_body(&mut bodies, BodyId::new(0));
        assert_eq!(manager.constraint_count(), 1);
        assert!(bodies[0].as_ref().unwrap().edges.is_empty());
        assert!(manager.constraints[0].is_pair(BodyId::new(1), BodyId::new(2)));
    }

    #[test]
    fn test_test_collisions_prunes_separated_pairs() {
        let (mut bodies, mut bp) = make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0)]);
        let mut manager = ContactManager::default();
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));

        let mut listener = NoListener;
        manager.test_collisions(&mut bodies, &bp, &mut listener);
        assert_eq!(manager.constraint_count(), 1);
        assert!(manager.constraints[0].colliding);

        // Move body 1 far away and resync its proxy
        {
            let body = bodies[1].as_mut().unwrap();
            body.pose.position = Point3::new(0.0, 50.0, 0.0);
            let aabb = world_aabb(&body.pose, &Vector3::new(0.5, 0.5, 0.5));
            bp.update(body.proxy.unwrap(), &aabb);
        }
        manager.test_collisions(&mut bodies, &bp, &mut listener);
        assert_eq!(manager.constraint_count(), 0, "fat AABBs no longer overlap");
    }

    #[test]
    fn test_contact_events_fire() {
        #[derive(Default)]
        struct Recorder {
            begins: usize,
            ends: usize,
        }
        impl ContactListener for Recorder {
            fn begin_contact(&mut self, _a: BodyId, _b: BodyId) {
                self.begins += 1;
            }
            fn end_contact(&mut self, _a: BodyId, _b: BodyId) {
                self.ends += 1;
            }
        }

        let (mut bodies, mut bp) = make_bodies(&[(0.0, 0.0, 0.0), (0.0, 0.9, 0.0)]);
        let mut manager = ContactManager::default();
        manager.add_contact(&mut bodies, BodyId::new(0), BodyId::new(1));

        let mut rec = Recorder::default();
        manager.test_collisions(&mut bodies, &bp, &mut rec);
        assert_eq!(rec.begins, 1);
        assert_eq!(rec.ends, 0);

        // Stays touching: no repeat events
        manager.test_collisions(&mut bodies, &bp, &mut rec);
        assert_eq!(rec.begins, 1);

        // Separate within the fat bounds: end fires, constraint survives
        {
            let body = bodies[1].as_mut().unwrap();
            body.pose.position = Point3::new(0.0, 1.3, 0.0);
            let aabb = world_aabb(&body.pose, &Vector3::new(0.5, 0.5, 0.5));
            bp.update(body.proxy.unwrap(), &aabb);
        }
        manager.test_collisions(&mut bodies, &bp, &mut rec);
        assert_eq!(rec.ends, 1);
        assert_eq!(manager.constraint_count(), 1);

        // Re-touch on the very next step: begin must fire a second time
        {
            let body = bodies[1].as_mut().unwrap();
            body.pose.position = Point3::new(0.0, 0.9, 0.0);
            let aabb = world_aabb(&body.pose, &Vector3::new(0.5, 0.5, 0.5));
            bp.update(body.proxy.unwrap(), &aabb);
        }
        manager.test_collisions(&mut bodies, &bp, &mut rec);
        assert_eq!(rec.begins, 2);
        assert_eq!(rec.ends, 1);
    }
}
