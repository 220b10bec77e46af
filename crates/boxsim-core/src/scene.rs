//! The scene: body lifecycle, the step pipeline, and world queries.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use boxsim_collide::{contains_point, raycast_obb, world_aabb};
use boxsim_types::{
    Aabb, BodyDef, BodyId, BoxDef, PhysicsError, RayCast, Result, SceneConfig,
};

use crate::body::Body;
use crate::broad_phase::{BroadPhase, AABB_FATTENING};
use crate::island::Island;
use crate::manager::{ContactListener, ContactManager, NoListener};

/// Resolve a handle against the body arena.
///
/// Handles are trusted internally; a stale handle is a caller logic
/// error and panics.
pub(crate) fn body_slot(bodies: &[Option<Body>], id: BodyId) -> &Body {
    match bodies.get(id.index()).and_then(Option::as_ref) {
        Some(body) => body,
        None => unreachable!("stale body handle {id}"),
    }
}

/// Mutable variant of [`body_slot`].
pub(crate) fn body_slot_mut(bodies: &mut [Option<Body>], id: BodyId) -> &mut Body {
    match bodies.get_mut(id.index()).and_then(Option::as_mut) {
        Some(body) => body,
        None => unreachable!("stale body handle {id}"),
    }
}

/// A fixed-timestep rigid-body world of oriented boxes.
///
/// The scene owns the body arena, the broadphase and the contact
/// manager. [`step`](Self::step) advances the world by exactly one
/// timestep; queries are read-only and may run between steps.
///
/// # Example
///
/// ```
/// use boxsim_core::Scene;
/// use boxsim_types::{BodyDef, BodyType, BoxDef, Pose, SceneConfig};
/// use nalgebra::{Point3, Vector3};
///
/// let mut scene = Scene::new(SceneConfig::default()).unwrap();
/// let body = scene
///     .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Point3::new(0.0, 3.0, 0.0)))
///     .unwrap();
/// scene
///     .set_box(body, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
///     .unwrap();
///
/// scene.step();
/// assert!(scene.body(body).unwrap().linear_velocity().y < 0.0);
/// ```
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    bodies: Vec<Option<Body>>,
    free: Vec<usize>,
    broad_phase: BroadPhase,
    manager: ContactManager,
    island: Island,
    stack: Vec<BodyId>,
    new_box: bool,
    step_count: u64,
}

impl Default for Scene {
    fn default() -> Self {
        match Self::new(SceneConfig::default()) {
            Ok(scene) => scene,
            Err(_) => unreachable!("default config is valid"),
        }
    }
}

impl Scene {
    /// Create a scene with the given configuration.
    ///
    /// Fails when the configuration is invalid (non-positive timestep,
    /// non-finite gravity, zero iterations).
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bodies: Vec::new(),
            free: Vec::new(),
            broad_phase: BroadPhase::new(),
            manager: ContactManager::default(),
            island: Island::new(),
            stack: Vec::new(),
            new_box: false,
            step_count: 0,
        })
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The world gravity vector.
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.config.gravity
    }

    /// Set the world gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.config.gravity = gravity;
    }

    /// Set the solver iteration count, clamped to at least 1.
    pub fn set_iterations(&mut self, iterations: usize) {
        self.config.iterations = iterations.max(1);
    }

    /// Enable or disable friction impulses.
    pub fn set_enable_friction(&mut self, enabled: bool) {
        self.config.enable_friction = enabled;
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len() - self.free.len()
    }

    /// Iterate over every live body.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().flatten()
    }

    /// Look up a body by handle.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index()).and_then(Option::as_ref)
    }

    /// Look up a body by handle, mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// The contact manager, for inspecting live constraints.
    #[must_use]
    pub fn contacts(&self) -> &ContactManager {
        &self.manager
    }

    /// Create a body from a definition and return its handle.
    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyId> {
        def.validate()?;

        let slot = self.free.pop().unwrap_or_else(|| {
            self.bodies.push(None);
            self.bodies.len() - 1
        });
        #[allow(clippy::cast_possible_truncation)]
        let id = BodyId::new(slot as u32);
        self.bodies[slot] = Some(Body::new(id, def));
        Ok(id)
    }

    /// Remove a body, destroying its contacts and broadphase proxy.
    pub fn remove_body(&mut self, id: BodyId) -> Result<()> {
        if self.body(id).is_none() {
            return Err(PhysicsError::InvalidBodyId(id.raw()));
        }

        let Self {
            bodies,
            manager,
            broad_phase,
            ..
        } = self;
        manager.remove_contacts_from_body(bodies, id);
        if let Some(proxy) = body_slot(bodies, id).proxy {
            broad_phase.remove(proxy);
        }

        self.bodies[id.index()] = None;
        self.free.push(id.index());
        Ok(())
    }

    /// Remove every body in the scene.
    pub fn remove_all_bodies(&mut self) {
        self.bodies.clear();
        self.free.clear();
        self.broad_phase = BroadPhase::new();
        self.manager.constraints.clear();
        self.new_box = false;
    }

    /// Attach (or replace) the body's box collider.
    ///
    /// Mass data is recomputed and the box enters the broadphase; no
    /// contacts are created until the next [`step`](Self::step).
    pub fn set_box(&mut self, id: BodyId, def: &BoxDef) -> Result<()> {
        def.validate()?;
        if self.body(id).is_none() {
            return Err(PhysicsError::InvalidBodyId(id.raw()));
        }
        if self.body(id).and_then(|b| b.collider).is_some() {
            self.remove_box(id)?;
        }

        let Self {
            bodies,
            broad_phase,
            ..
        } = self;
        let body = body_slot_mut(bodies, id);
        let collider = (*def).into();
        body.collider = Some(collider);
        body.calculate_mass_data();

        let tx = collider.world_pose(&body.pose);
        let aabb = world_aabb(&tx, &collider.half_extents);
        body.proxy = Some(broad_phase.insert(id, &aabb));
        self.new_box = true;
        Ok(())
    }

    /// Detach the body's box collider, destroying its contacts.
    pub fn remove_box(&mut self, id: BodyId) -> Result<()> {
        if self.body(id).is_none() {
            return Err(PhysicsError::InvalidBodyId(id.raw()));
        }

        let Self {
            bodies,
            manager,
            broad_phase,
            ..
        } = self;
        manager.remove_contacts_from_body(bodies, id);

        let body = body_slot_mut(bodies, id);
        if let Some(proxy) = body.proxy.take() {
            broad_phase.remove(proxy);
        }
        body.collider = None;
        body.calculate_mass_data();
        Ok(())
    }

    /// Teleport a body's origin to a world position.
    ///
    /// Manually placed bodies behave non-physically; contacts update on
    /// the next step.
    pub fn set_transform(&mut self, id: BodyId, position: Point3<f64>) -> Result<()> {
        self.set_transform_rotated(id, position, Vector3::zeros(), 0.0)
    }

    /// Teleport a body's origin and orientation.
    pub fn set_transform_rotated(
        &mut self,
        id: BodyId,
        position: Point3<f64>,
        axis: Vector3<f64>,
        angle: f64,
    ) -> Result<()> {
        if self.body(id).is_none() {
            return Err(PhysicsError::InvalidBodyId(id.raw()));
        }

        let Self {
            bodies,
            broad_phase,
            ..
        } = self;
        let body = body_slot_mut(bodies, id);
        body.pose = boxsim_types::Pose::from_axis_angle(position, axis, angle);
        body.world_center = body
            .pose
            .transform_point(&Point3::from(body.local_center));

        if let (Some(proxy), Some(collider)) = (body.proxy, body.collider.as_ref()) {
            let tx = collider.world_pose(&body.pose);
            broad_phase.update(proxy, &world_aabb(&tx, &collider.half_extents));
        }
        Ok(())
    }

    /// Advance the world by one fixed timestep.
    pub fn step(&mut self) {
        self.step_with_events(&mut NoListener);
    }

    /// Advance the world by one fixed timestep, reporting contact
    /// begin/end events to `listener`.
    pub fn step_with_events(&mut self, listener: &mut dyn ContactListener) {
        // Boxes added since the last step must pair up before testing
        if self.new_box {
            self.find_new_contacts();
            self.new_box = false;
        }

        {
            let Self {
                bodies,
                manager,
                broad_phase,
                ..
            } = self;
            manager.test_collisions(bodies, broad_phase, listener);
        }

        for body in self.bodies.iter_mut().flatten() {
            body.island = false;
        }

        // Build and solve one island per unvisited non-static seed
        let mut islands = 0_usize;
        for seed_index in 0..self.bodies.len() {
            let seed_id = match &self.bodies[seed_index] {
                Some(seed) if !seed.island && !seed.body_type.is_static() => seed.id,
                _ => continue,
            };

            let Self {
                bodies,
                manager,
                island,
                stack,
                config,
                ..
            } = self;
            island.build(seed_id, bodies, manager, stack);
            island.solve(
                bodies,
                manager,
                config.gravity,
                config.timestep,
                config.iterations,
                config.enable_friction,
            );

            // Statics may participate in many islands per step
            for &id in island.bodies() {
                let body = body_slot_mut(bodies, id);
                if body.body_type.is_static() {
                    body.island = false;
                }
            }
            islands += 1;
        }

        // Refresh broadphase bounds for everything that can move
        {
            let Self {
                bodies,
                broad_phase,
                ..
            } = self;
            for body in bodies.iter_mut().flatten() {
                if body.body_type.is_static() {
                    continue;
                }
                let (Some(proxy), Some(collider)) = (body.proxy, body.collider.as_ref()) else {
                    continue;
                };
                let tx = collider.world_pose(&body.pose);
                broad_phase.update(proxy, &world_aabb(&tx, &collider.half_extents));
            }
        }

        self.find_new_contacts();

        for body in self.bodies.iter_mut().flatten() {
            body.force = Vector3::zeros();
            body.torque = Vector3::zeros();
        }

        self.step_count += 1;
        debug!(
            step = self.step_count,
            bodies = self.body_count(),
            constraints = self.manager.constraint_count(),
            islands,
            "step complete"
        );
    }

    fn find_new_contacts(&mut self) {
        let pairs = self.broad_phase.update_pairs();
        let Self {
            bodies, manager, ..
        } = self;
        for (a, b) in pairs {
            manager.add_contact(bodies, a, b);
        }
    }

    /// Visit every box whose exact bounds overlap `aabb`.
    ///
    /// The callback returns `false` to stop the query early.
    pub fn query_aabb(&self, aabb: &Aabb, mut cb: impl FnMut(BodyId) -> bool) {
        self.broad_phase.query_aabb(aabb, |id| {
            let body = body_slot(&self.bodies, id);
            let Some(collider) = body.collider.as_ref() else {
                return true;
            };
            let tx = collider.world_pose(&body.pose);
            if world_aabb(&tx, &collider.half_extents).overlaps(aabb) {
                return cb(id);
            }
            true
        });
    }

    /// Visit every box containing the world-space point `p`.
    pub fn query_point(&self, p: &Point3<f64>, mut cb: impl FnMut(BodyId) -> bool) {
        let probe = Aabb::from_center(*p, Vector3::new(AABB_FATTENING, AABB_FATTENING, AABB_FATTENING));
        self.broad_phase.query_aabb(&probe, |id| {
            let body = body_slot(&self.bodies, id);
            let Some(collider) = body.collider.as_ref() else {
                return true;
            };
            let tx = collider.world_pose(&body.pose);
            if contains_point(&tx, &collider.half_extents, p) {
                return cb(id);
            }
            true
        });
    }

    /// Cast a ray through the world.
    ///
    /// For every box the ray hits, `ray.toi` and `ray.normal` are
    /// updated and the callback is invoked with the hit body; returning
    /// `false` stops the cast. Hit order follows broadphase storage, not
    /// distance - track the nearest `toi` in the callback if needed.
    pub fn ray_cast(
        &self,
        ray: &mut RayCast,
        mut cb: impl FnMut(BodyId, &RayCast) -> bool,
    ) {
        let probe = *ray;
        let mut keep_going = true;
        self.broad_phase.query_ray(&probe, |id| {
            if !keep_going {
                return false;
            }
            let body = body_slot(&self.bodies, id);
            let Some(collider) = body.collider.as_ref() else {
                return true;
            };
            let tx = collider.world_pose(&body.pose);
            if raycast_obb(&tx, &collider.half_extents, ray) {
                keep_going = cb(id, ray);
                return keep_going;
            }
            true
        });
    }

    /// Write human-readable reconstruction commands for the whole scene.
    pub fn dump(&self, w: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(w, "// boxsim scene dump")?;
        writeln!(
            w,
            "let mut scene = Scene::new(SceneConfig::with_timestep({:.15})",
            self.config.timestep
        )?;
        writeln!(
            w,
            "    .with_gravity(Vector3::new({:.15}, {:.15}, {:.15}))",
            self.config.gravity.x, self.config.gravity.y, self.config.gravity.z
        )?;
        writeln!(w, "    .with_iterations({})", self.config.iterations)?;
        writeln!(w, "    .with_friction({}))?;", self.config.enable_friction)?;

        for body in self.bodies() {
            let idx = body.id.raw();
            writeln!(w, "let b{idx} = scene.create_body(")?;
            writeln!(w, "    &BodyDef::new(BodyType::{:?})", body.body_type)?;
            writeln!(
                w,
                "        .with_position(Point3::new({:.15}, {:.15}, {:.15}))",
                body.pose.position.x, body.pose.position.y, body.pose.position.z
            )?;
            if let Some((axis, angle)) = body.pose.rotation.axis_angle() {
                writeln!(
                    w,
                    "        .with_rotation(Vector3::new({:.15}, {:.15}, {:.15}), {:.15})",
                    axis.x, axis.y, axis.z, angle
                )?;
            }
            writeln!(
                w,
                "        .with_linear_velocity(Vector3::new({:.15}, {:.15}, {:.15}))",
                body.velocity.linear.x, body.velocity.linear.y, body.velocity.linear.z
            )?;
            writeln!(
                w,
                "        .with_angular_velocity(Vector3::new({:.15}, {:.15}, {:.15}))",
                body.velocity.angular.x, body.velocity.angular.y, body.velocity.angular.z
            )?;
            writeln!(
                w,
                "        .with_gravity_scale({:.15})",
                body.gravity_scale
            )?;
            writeln!(
                w,
                "        .with_damping({:.15}, {:.15}),",
                body.linear_damping, body.angular_damping
            )?;
            writeln!(w, ")?;")?;

            if let Some(collider) = &body.collider {
                writeln!(w, "let mut def = BoxDef::default();")?;
                writeln!(
                    w,
                    "def.half_extents = Vector3::new({:.15}, {:.15}, {:.15});",
                    collider.half_extents.x, collider.half_extents.y, collider.half_extents.z
                )?;
                writeln!(
                    w,
                    "def.local = Pose::from_position(Point3::new({:.15}, {:.15}, {:.15}));",
                    collider.local.position.x, collider.local.position.y, collider.local.position.z
                )?;
                writeln!(w, "def.friction = {:.15};", collider.friction)?;
                writeln!(w, "def.restitution = {:.15};", collider.restitution)?;
                writeln!(w, "def.density = {:.15};", collider.density)?;
                writeln!(w, "def.sensor = {};", collider.sensor)?;
                writeln!(w, "scene.set_box(b{idx}, &def)?;")?;
            }
        }
        Ok(())
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
    use boxsim_types::{BodyType, Pose};

    fn unit_box() -> BoxDef {
        BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0))
    }

    fn dynamic_cube(scene: &mut Scene, at: Point3<f64>) -> BodyId {
        let id = scene
            .create_body(&BodyDef::new(BodyType::Dynamic).with_position(at))
            .unwrap();
        scene.set_box(id, &unit_box()).unwrap();
        id
    }

    #[test]
    fn test_body_lifecycle_and_slot_reuse() {
        let mut scene = Scene::default();
        let a = scene.create_body(&BodyDef::default()).unwrap();
        let b = scene.create_body(&BodyDef::default()).unwrap();
        assert_eq!(scene.body_count(), 2);
        assert_ne!(a, b);

        scene.remove_body(a).unwrap();
        assert_eq!(scene.body_count(), 1);
        assert!(scene.body(a).is_none());
        assert!(scene.remove_body(a).is_err(), "double remove is an error");

        let c = scene.create_body(&BodyDef::default()).unwrap();
        assert_eq!(c, a, "slots are reused");
        assert_eq!(scene.body_count(), 2);
    }

    #[test]
    fn test_set_box_builds_mass_and_proxy() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::origin());

        let body = scene.body(id).unwrap();
        assert_relative_eq!(body.mass(), 1.0, epsilon = 1e-12);
        assert!(body.collider().is_some());

        scene.remove_box(id).unwrap();
        let body = scene.body(id).unwrap();
        assert!(body.collider().is_none());
        assert!(scene.broad_phase.is_empty());
    }

    #[test]
    fn test_gravity_accelerates_dynamic_bodies() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::new(0.0, 10.0, 0.0));

        for _ in 0..30 {
            scene.step();
        }
        let body = scene.body(id).unwrap();
        assert!(body.position().y < 10.0);
        assert!(body.linear_velocity().y < 0.0);
    }

    #[test]
    fn test_gravity_scale_zero_floats() {
        let mut scene = Scene::default();
        let id = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic)
                    .with_position(Point3::new(0.0, 10.0, 0.0))
                    .with_gravity_scale(0.0),
            )
            .unwrap();
        scene.set_box(id, &unit_box()).unwrap();

        for _ in 0..30 {
            scene.step();
        }
        let body = scene.body(id).unwrap();
        assert_relative_eq!(body.position().y, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_static_bodies_never_move() {
        let mut scene = Scene::default();
        let id = scene
            .create_body(&BodyDef::default().with_position(Point3::new(1.0, 2.0, 3.0)))
            .unwrap();
        scene.set_box(id, &unit_box()).unwrap();

        let before = *scene.body(id).unwrap().pose();
        for _ in 0..60 {
            scene.step();
        }
        let after = *scene.body(id).unwrap().pose();
        assert_eq!(before, after, "static pose must be bit-identical");
        assert_eq!(scene.body(id).unwrap().linear_velocity(), Vector3::zeros());
    }

    #[test]
    fn test_forces_cleared_after_step() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::new(0.0, 10.0, 0.0));

        scene
            .body_mut(id)
            .unwrap()
            .apply_linear_force(Vector3::new(5.0, 0.0, 0.0));
        scene.body_mut(id).unwrap().apply_torque(Vector3::y());
        scene.step();

        let body = scene.body(id).unwrap();
        assert_eq!(body.force(), Vector3::zeros());
        assert_eq!(body.torque(), Vector3::zeros());
    }

    #[test]
    fn test_pair_deduplication() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        dynamic_cube(&mut scene, Point3::new(0.0, 0.0, 0.0));
        dynamic_cube(&mut scene, Point3::new(0.6, 0.0, 0.0));
        dynamic_cube(&mut scene, Point3::new(0.0, 0.6, 0.0));

        scene.step();
        assert_eq!(
            scene.contacts().constraint_count(),
            3,
            "three overlapping boxes give C(3,2) constraints"
        );

        scene.step();
        assert_eq!(scene.contacts().constraint_count(), 3, "no duplicates");
    }

    #[test]
    fn test_kinematic_integrates_velocity() {
        let mut scene = Scene::default();
        let id = scene
            .create_body(
                &BodyDef::new(BodyType::Kinematic)
                    .with_linear_velocity(Vector3::new(1.0, 0.0, 0.0)),
            )
            .unwrap();
        scene.set_box(id, &unit_box()).unwrap();

        for _ in 0..60 {
            scene.step();
        }
        let body = scene.body(id).unwrap();
        assert_relative_eq!(body.position().x, 1.0, epsilon = 1e-9);
        // Forces (gravity included) never touch kinematic bodies
        assert_relative_eq!(body.position().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion_stays_normalized() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        let id = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic)
                    .with_angular_velocity(Vector3::new(3.0, 5.0, -2.0))
                    .with_damping(0.0, 0.0),
            )
            .unwrap();
        scene.set_box(id, &unit_box()).unwrap();

        for _ in 0..240 {
            scene.step();
        }
        let q = scene.body(id).unwrap().pose().rotation;
        assert!((q.into_inner().norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_query_aabb_exact() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::origin());
        let _far = dynamic_cube(&mut scene, Point3::new(10.0, 0.0, 0.0));

        let mut hits = Vec::new();
        scene.query_aabb(
            &Aabb::from_center(Point3::new(0.4, 0.0, 0.0), Vector3::new(0.2, 0.2, 0.2)),
            |hit| {
                hits.push(hit);
                true
            },
        );
        assert_eq!(hits, vec![id]);

        // Inside the fat AABB but outside the exact box: no hit
        let mut hits = Vec::new();
        scene.query_aabb(
            &Aabb::from_center(Point3::new(0.8, 0.0, 0.0), Vector3::new(0.1, 0.1, 0.1)),
            |hit| {
                hits.push(hit);
                true
            },
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_point() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::origin());

        let mut hits = Vec::new();
        scene.query_point(&Point3::new(0.25, 0.25, 0.25), |hit| {
            hits.push(hit);
            true
        });
        assert_eq!(hits, vec![id]);

        let mut hits = Vec::new();
        scene.query_point(&Point3::new(0.75, 0.0, 0.0), |hit| {
            hits.push(hit);
            true
        });
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ray_cast_reports_hit_data() {
        let mut scene = Scene::default();
        let id = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(id, &BoxDef::new(Pose::identity(), Vector3::new(100.0, 2.0, 100.0)))
            .unwrap();

        let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);
        let mut hit = None;
        scene.ray_cast(&mut ray, |body, data| {
            hit = Some((body, data.toi, data.normal));
            true
        });

        let (body, toi, normal) = hit.unwrap();
        assert_eq!(body, id);
        assert_relative_eq!(toi, 9.0, epsilon = 1e-9);
        assert_relative_eq!(normal.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_set_transform_moves_queries() {
        let mut scene = Scene::default();
        let id = dynamic_cube(&mut scene, Point3::origin());

        scene
            .set_transform(id, Point3::new(5.0, 0.0, 0.0))
            .unwrap();

        let mut hits = Vec::new();
        scene.query_point(&Point3::new(5.0, 0.0, 0.0), |hit| {
            hits.push(hit);
            true
        });
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn test_contact_events_through_step() {
        #[derive(Default)]
        struct Count(usize, usize);
        impl ContactListener for Count {
            fn begin_contact(&mut self, _: BodyId, _: BodyId) {
                self.0 += 1;
            }
            fn end_contact(&mut self, _: BodyId, _: BodyId) {
                self.1 += 1;
            }
        }

        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        dynamic_cube(&mut scene, Point3::origin());
        dynamic_cube(&mut scene, Point3::new(0.0, 0.8, 0.0));

        let mut count = Count::default();
        scene.step_with_events(&mut count);
        assert_eq!(count.0, 1, "begin fires once");
        scene.step_with_events(&mut count);
        assert_eq!(count.0, 1, "no repeat while touching");
        assert_eq!(count.1, 0);
    }

    #[test]
    fn test_remove_all_bodies() {
        let mut scene = Scene::default();
        dynamic_cube(&mut scene, Point3::origin());
        dynamic_cube(&mut scene, Point3::new(0.5, 0.0, 0.0));
        scene.step();

        scene.remove_all_bodies();
        assert_eq!(scene.body_count(), 0);
        assert_eq!(scene.contacts().constraint_count(), 0);
        scene.step(); // must not panic on an empty world
    }

    #[test]
    fn test_dump_emits_commands() {
        let mut scene = Scene::default();
        dynamic_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));

        let mut out = Vec::new();
        scene.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("create_body"));
        assert!(text.contains("set_box"));
        assert!(text.contains("with_gravity"));
    }
}
