//! boxsim: a fixed-timestep 3D rigid-body engine for oriented boxes.
//!
//! This crate re-exports the complete engine stack:
//!
//! - [`boxsim_types`] - Pure data (poses, definitions, AABBs, config)
//! - [`boxsim_collide`] - OBB narrowphase with feature-tagged manifolds
//! - [`boxsim_contact`] - Persistent constraints and the impulse solver
//! - [`boxsim_core`] - Scene, broadphase, islands, queries, debug draw
//!
//! # Quick Start
//!
//! ```
//! use boxsim::prelude::*;
//!
//! // A world with default gravity stepping at 60 Hz
//! let mut scene = Scene::new(SceneConfig::default()).unwrap();
//!
//! // Static floor
//! let floor = scene.create_body(&BodyDef::default()).unwrap();
//! scene
//!     .set_box(floor, &BoxDef::new(Pose::identity(), Vector3::new(50.0, 1.0, 50.0)))
//!     .unwrap();
//!
//! // A dynamic cube dropped from above
//! let cube = scene
//!     .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Point3::new(0.0, 2.0, 0.0)))
//!     .unwrap();
//! scene
//!     .set_box(cube, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
//!     .unwrap();
//!
//! // Four seconds of simulation: the cube comes to rest on the floor
//! for _ in 0..240 {
//!     scene.step();
//! }
//! let body = scene.body(cube).unwrap();
//! assert!(body.linear_velocity().norm() < 0.05);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   boxsim (this crate)                   │
//! │                 Unified API / re-exports                │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//!                   ┌──────────────────┐
//!                   │   boxsim-core    │
//!                   │ Scene, islands,  │
//!                   │ broadphase       │
//!                   └────────┬─────────┘
//!              ┌─────────────┴───────────┐
//!              ▼                         ▼
//!    ┌──────────────────┐     ┌──────────────────┐
//!    │  boxsim-contact  │────▶│  boxsim-collide  │
//!    │ constraints,     │     │ SAT + clipping,  │
//!    │ impulse solver   │     │ feature pairs    │
//!    └────────┬─────────┘     └────────┬─────────┘
//!             │                        │
//!             └──────────┬─────────────┘
//!                        ▼
//!              ┌──────────────────┐
//!              │   boxsim-types   │
//!              │   Data structs   │
//!              └──────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/boxsim/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use boxsim_collide;
pub use boxsim_contact;
pub use boxsim_core;
pub use boxsim_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// Import everything you need with a single line:
///
/// ```
/// use boxsim::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core data types
    // ========================================================================

    pub use boxsim_types::{
        Aabb, BodyDef, BodyId, BodyType, BoxCollider, BoxDef, HalfSpace, MassData, PhysicsError,
        Pose, RayCast, SceneConfig, Twist,
    };

    // ========================================================================
    // Collision detection
    // ========================================================================

    pub use boxsim_collide::{
        collide_boxes, contains_point, raycast_obb, world_aabb, Contact, FeaturePair, Manifold,
    };

    // ========================================================================
    // Contact dynamics
    // ========================================================================

    pub use boxsim_contact::{ContactConstraint, ContactSolver, VelocityState};

    // ========================================================================
    // The engine
    // ========================================================================

    pub use boxsim_core::{Body, BroadPhase, ContactListener, ContactManager, DebugDraw, Scene};

    // ========================================================================
    // Math types from nalgebra
    // ========================================================================

    pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn scene_with_gravity() -> Scene {
        let config = SceneConfig::default().with_gravity(Vector3::new(0.0, -9.8, 0.0));
        Scene::new(config).unwrap()
    }

    /// Floor from the drop scenarios: 50 x 1 x 50 extents centered at
    /// the origin, so its top face sits at y = 0.5.
    fn add_floor(scene: &mut Scene) -> BodyId {
        let floor = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(
                floor,
                &BoxDef::new(Pose::identity(), Vector3::new(50.0, 1.0, 50.0)),
            )
            .unwrap();
        floor
    }

    fn add_unit_cube(scene: &mut Scene, at: Point3<f64>) -> BodyId {
        let cube = scene
            .create_body(&BodyDef::new(BodyType::Dynamic).with_position(at))
            .unwrap();
        scene
            .set_box(cube, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
            .unwrap();
        cube
    }

    // ------------------------------------------------------------------
    // End-to-end scenarios
    // ------------------------------------------------------------------

    #[test]
    fn scenario_single_box_comes_to_rest() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        let cube = add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));

        for _ in 0..240 {
            scene.step();
        }

        let body = scene.body(cube).unwrap();
        // Floor top 0.5 + half extent 0.5, less up to one slop of
        // allowed penetration.
        let y = body.position().y;
        assert!((0.90..=1.10).contains(&y), "rest height {y}");
        assert!(
            body.linear_velocity().norm() < 0.01,
            "residual speed {}",
            body.linear_velocity().norm()
        );
    }

    #[test]
    fn scenario_two_box_stack_is_stable() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        let lower = add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));
        let upper = add_unit_cube(&mut scene, Point3::new(0.0, 4.0, 0.0));

        for _ in 0..240 {
            scene.step();
        }

        let y_lower = scene.body(lower).unwrap().position().y;
        let y_upper = scene.body(upper).unwrap().position().y;
        assert!((y_lower - 1.0).abs() < 0.15, "lower cube at {y_lower}");
        assert!((y_upper - 2.0).abs() < 0.15, "upper cube at {y_upper}");

        for id in [lower, upper] {
            let speed = scene.body(id).unwrap().linear_velocity().norm();
            assert!(speed < 0.02, "cube still moving at {speed}");
        }

        // The stack must not have slid sideways
        assert!(scene.body(upper).unwrap().position().x.abs() < 0.05);
    }

    #[test]
    fn scenario_restitution_bounce() {
        let mut scene = scene_with_gravity();

        let floor = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(
                floor,
                &BoxDef::new(Pose::identity(), Vector3::new(50.0, 1.0, 50.0))
                    .with_restitution(0.0),
            )
            .unwrap();

        let cube = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic).with_position(Point3::new(0.0, 5.0, 0.0)),
            )
            .unwrap();
        scene
            .set_box(
                cube,
                &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0))
                    .with_restitution(1.0),
            )
            .unwrap();

        // Run until the cube has bounced and reached its first apex
        let mut was_rising = false;
        let mut apex = 0.0_f64;
        for _ in 0..600 {
            scene.step();
            let body = scene.body(cube).unwrap();
            let vy = body.linear_velocity().y;
            if vy > 0.0 {
                was_rising = true;
                apex = apex.max(body.position().y);
            } else if was_rising {
                break;
            }
        }

        assert!(was_rising, "cube never bounced");
        assert!(apex >= 4.7, "first apex {apex} lost too much energy");
        assert!(apex <= 6.5, "first apex {apex} gained too much energy");
    }

    #[test]
    fn scenario_ray_hits_floor() {
        let mut scene = scene_with_gravity();
        // Floor with half-extents (50, 1, 50): top face at y = 1.
        let floor = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(
                floor,
                &BoxDef::new(Pose::identity(), Vector3::new(100.0, 2.0, 100.0)),
            )
            .unwrap();
        scene.step();

        let mut ray = RayCast::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y(), 100.0);
        let mut hit = None;
        scene.ray_cast(&mut ray, |body, data| {
            hit = Some((body, data.toi, data.impact_point(), data.normal));
            true
        });

        let (body, toi, impact, normal) = hit.expect("ray must hit the floor");
        assert_eq!(body, floor);
        assert!((8.9..=9.1).contains(&toi), "toi {toi}");
        assert!((0.9..=1.1).contains(&impact.y), "impact {impact}");
        approx::assert_relative_eq!(normal, Vector3::y(), epsilon = 1e-9);
    }

    #[test]
    fn scenario_momentum_without_gravity() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        let cube = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic)
                    .with_linear_velocity(Vector3::new(1.0, 0.0, 0.0)),
            )
            .unwrap();
        scene
            .set_box(cube, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
            .unwrap();

        for _ in 0..60 {
            scene.step();
        }

        let body = scene.body(cube).unwrap();
        approx::assert_relative_eq!(body.position().x, 1.0, epsilon = 1e-3);
        approx::assert_relative_eq!(body.position().y, 0.0, epsilon = 1e-9);
        approx::assert_relative_eq!(
            body.linear_velocity(),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn scenario_pair_deduplication() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        add_unit_cube(&mut scene, Point3::new(0.0, 0.0, 0.0));
        add_unit_cube(&mut scene, Point3::new(0.6, 0.0, 0.0));
        add_unit_cube(&mut scene, Point3::new(0.0, 0.6, 0.0));

        scene.step();
        assert_eq!(scene.contacts().constraint_count(), 3);

        scene.step();
        assert_eq!(
            scene.contacts().constraint_count(),
            3,
            "re-reported pairs must not duplicate constraints"
        );
    }

    // ------------------------------------------------------------------
    // Quantified invariants
    // ------------------------------------------------------------------

    #[test]
    fn invariant_forces_cleared_every_step() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        let cube = add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));
        scene
            .body_mut(cube)
            .unwrap()
            .apply_torque(Vector3::new(0.0, 1.0, 0.0));

        for _ in 0..10 {
            scene.step();
            for body in scene.bodies() {
                assert_eq!(body.force(), Vector3::zeros());
                assert_eq!(body.torque(), Vector3::zeros());
            }
        }
    }

    #[test]
    fn invariant_quaternions_stay_unit() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        for i in 0..3 {
            let cube = add_unit_cube(
                &mut scene,
                Point3::new(0.2 * f64::from(i), 2.0 + 1.1 * f64::from(i), 0.0),
            );
            scene
                .body_mut(cube)
                .unwrap()
                .set_angular_velocity(Vector3::new(1.0, 2.0, 3.0));
        }

        for _ in 0..240 {
            scene.step();
        }
        for body in scene.bodies() {
            let norm = body.pose().rotation.into_inner().norm();
            assert!((norm - 1.0).abs() < 1e-4, "quaternion norm {norm}");
        }
    }

    #[test]
    fn invariant_static_bodies_byte_identical() {
        let mut scene = scene_with_gravity();
        let floor = add_floor(&mut scene);
        add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));

        let pose_before = *scene.body(floor).unwrap().pose();
        for _ in 0..240 {
            scene.step();
        }
        let pose_after = *scene.body(floor).unwrap().pose();
        assert_eq!(pose_before, pose_after);
        assert_eq!(
            scene.body(floor).unwrap().linear_velocity(),
            Vector3::zeros()
        );
    }

    #[test]
    fn invariant_impulses_respect_cone_and_sign() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));
        add_unit_cube(&mut scene, Point3::new(0.0, 4.0, 0.0));

        for _ in 0..240 {
            scene.step();
        }

        let mut seen_contacts = 0;
        for constraint in scene.contacts().constraints() {
            let mu = constraint.friction;
            for contact in constraint.manifold.contacts() {
                seen_contacts += 1;
                assert!(
                    contact.normal_impulse >= 0.0,
                    "normal impulse {} must be non-negative",
                    contact.normal_impulse
                );
                for t in contact.tangent_impulse {
                    assert!(
                        t.abs() <= mu * contact.normal_impulse + 1e-9,
                        "friction impulse {t} outside the cone"
                    );
                }
            }
        }
        assert!(seen_contacts > 0, "settled stack must keep contacts");
    }

    #[test]
    fn invariant_manifold_cardinality() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        for i in 0..4 {
            add_unit_cube(
                &mut scene,
                Point3::new(0.3 * f64::from(i), 1.5 + 1.1 * f64::from(i), 0.1 * f64::from(i)),
            );
        }

        for _ in 0..240 {
            scene.step();
            for constraint in scene.contacts().constraints() {
                let count = constraint.manifold.count;
                assert!(count <= 4, "face manifolds reduce to at most 4, got {count}");
            }
        }
    }

    #[test]
    fn invariant_feature_keys_stable_at_rest() {
        let mut scene = scene_with_gravity();
        add_floor(&mut scene);
        add_unit_cube(&mut scene, Point3::new(0.0, 2.0, 0.0));

        for _ in 0..240 {
            scene.step();
        }
        let keys_before: Vec<Vec<u32>> = scene
            .contacts()
            .constraints()
            .iter()
            .map(|c| c.manifold.contacts().iter().map(|p| p.feature.key()).collect())
            .collect();

        scene.step();
        let keys_after: Vec<Vec<u32>> = scene
            .contacts()
            .constraints()
            .iter()
            .map(|c| c.manifold.contacts().iter().map(|p| p.feature.key()).collect())
            .collect();

        assert_eq!(keys_before, keys_after, "resting keys must not churn");

        // And the warm-start channel must actually be carrying them
        for constraint in scene.contacts().constraints() {
            for contact in constraint.manifold.contacts() {
                assert!(contact.warm_started > 0, "contact never warm started");
            }
        }
    }

    #[test]
    fn sensors_report_but_never_push() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();

        let sensor = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(
                sensor,
                &BoxDef::new(Pose::identity(), Vector3::new(2.0, 2.0, 2.0)).with_sensor(true),
            )
            .unwrap();

        let cube = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic)
                    .with_position(Point3::new(-3.0, 0.0, 0.0))
                    .with_linear_velocity(Vector3::new(2.0, 0.0, 0.0)),
            )
            .unwrap();
        scene
            .set_box(cube, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
            .unwrap();

        struct Events(usize);
        impl ContactListener for Events {
            fn begin_contact(&mut self, _: BodyId, _: BodyId) {
                self.0 += 1;
            }
        }
        let mut events = Events(0);

        for _ in 0..240 {
            scene.step_with_events(&mut events);
        }

        assert!(events.0 > 0, "sensor overlap must raise an event");
        // The cube sailed straight through: the sensor never pushed back
        let body = scene.body(cube).unwrap();
        approx::assert_relative_eq!(
            body.linear_velocity(),
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-9
        );
        assert!(body.position().x > 3.0);
    }

    #[test]
    fn prelude_types_are_accessible() {
        let _pose = Pose::identity();
        let _def = BodyDef::default();
        let _box = BoxDef::default();
        let _config = SceneConfig::default();
        let _pair = FeaturePair::default();
        let _manifold = Manifold::new();
        let _ray = RayCast::new(Point3::origin(), Vector3::x(), 1.0);
        let _aabb = Aabb::from_center(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let _half = HalfSpace::new(Vector3::y(), 0.0);
        let _twist = Twist::zero();
    }
}
