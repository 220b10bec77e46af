//! Rigid bodies.
//!
//! A body owns at most one box collider, its mass data derived from that
//! box, and its dynamic state. The orientation quaternion is
//! authoritative; rotation matrices are derived from it when needed.

use nalgebra::{Matrix3, Point3, Vector3};
use tracing::warn;

use boxsim_types::{BodyDef, BodyId, BodyType, BoxCollider, Pose, Twist};

/// A rigid body with one optional oriented-box collider.
///
/// Bodies are created through [`Scene::create_body`](crate::Scene) and
/// addressed by [`BodyId`]. State that feeds back into the broadphase
/// (the collider, the transform) is mutated through scene methods;
/// everything else is mutated directly here.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) id: BodyId,
    pub(crate) body_type: BodyType,
    pub(crate) pose: Pose,
    pub(crate) velocity: Twist,
    pub(crate) force: Vector3<f64>,
    pub(crate) torque: Vector3<f64>,
    pub(crate) mass: f64,
    pub(crate) inv_mass: f64,
    pub(crate) inv_inertia_model: Matrix3<f64>,
    pub(crate) inv_inertia_world: Matrix3<f64>,
    pub(crate) local_center: Vector3<f64>,
    pub(crate) world_center: Point3<f64>,
    pub(crate) gravity_scale: f64,
    pub(crate) linear_damping: f64,
    pub(crate) angular_damping: f64,
    pub(crate) collider: Option<BoxCollider>,
    /// Broadphase handle while a box is attached.
    pub(crate) proxy: Option<usize>,
    /// Indices of the contact constraints touching this body.
    pub(crate) edges: Vec<usize>,
    /// Island-membership marker, reset every step.
    pub(crate) island: bool,
    /// Slot inside the island currently being solved.
    pub(crate) island_index: usize,
}

impl Body {
    pub(crate) fn new(id: BodyId, def: &BodyDef) -> Self {
        let pose = def.pose();
        let velocity = if def.body_type.is_static() {
            Twist::zero()
        } else {
            Twist::new(def.linear_velocity, def.angular_velocity)
        };

        let mut body = Self {
            id,
            body_type: def.body_type,
            pose,
            velocity,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            mass: 0.0,
            inv_mass: 0.0,
            inv_inertia_model: Matrix3::zeros(),
            inv_inertia_world: Matrix3::zeros(),
            local_center: Vector3::zeros(),
            world_center: pose.position,
            gravity_scale: def.gravity_scale,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            collider: None,
            proxy: None,
            edges: Vec::new(),
            island: false,
            island_index: 0,
        };
        body.calculate_mass_data();
        body
    }

    /// The body's handle.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// The body's kind.
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// The body's world pose.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// The body origin's world position.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.pose.position
    }

    /// The world-space center of mass.
    #[must_use]
    pub fn world_center(&self) -> Point3<f64> {
        self.world_center
    }

    /// Linear velocity in world space.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.velocity.linear
    }

    /// Angular velocity in world space.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.velocity.angular
    }

    /// The body's mass in kg. Zero for static and kinematic bodies.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass; zero for static and kinematic bodies.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// The attached box collider, if any.
    #[must_use]
    pub fn collider(&self) -> Option<&BoxCollider> {
        self.collider.as_ref()
    }

    /// Set the friction coefficient of the attached box.
    ///
    /// Constraints that already exist keep the mixed value they were
    /// created with; new contacts pick up the change.
    pub fn set_friction(&mut self, friction: f64) {
        if let Some(collider) = &mut self.collider {
            collider.friction = friction;
        }
    }

    /// Set the restitution coefficient of the attached box.
    pub fn set_restitution(&mut self, restitution: f64) {
        if let Some(collider) = &mut self.collider {
            collider.restitution = restitution;
        }
    }

    /// Mark the attached box as a sensor (or not).
    pub fn set_sensor(&mut self, sensor: bool) {
        if let Some(collider) = &mut self.collider {
            collider.sensor = sensor;
        }
    }

    /// Set the density of the attached box and recompute mass data.
    pub fn set_density(&mut self, density: f64) {
        let Some(collider) = &mut self.collider else {
            return;
        };
        collider.density = density;
        self.calculate_mass_data();
    }

    /// The gravity multiplier.
    #[must_use]
    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    /// Set the gravity multiplier.
    pub fn set_gravity_scale(&mut self, scale: f64) {
        self.gravity_scale = scale;
    }

    /// Set linear and angular damping.
    pub fn set_damping(&mut self, linear: f64, angular: f64) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }

    /// Set the linear velocity.
    ///
    /// Static bodies cannot move; this is a debug assertion and a no-op
    /// in release builds.
    pub fn set_linear_velocity(&mut self, v: Vector3<f64>) {
        debug_assert!(
            !self.body_type.is_static(),
            "velocity of a static body cannot be set"
        );
        if !self.body_type.is_static() {
            self.velocity.linear = v;
        }
    }

    /// Set the angular velocity. Same static-body rules as
    /// [`set_linear_velocity`](Self::set_linear_velocity).
    pub fn set_angular_velocity(&mut self, w: Vector3<f64>) {
        debug_assert!(
            !self.body_type.is_static(),
            "velocity of a static body cannot be set"
        );
        if !self.body_type.is_static() {
            self.velocity.angular = w;
        }
    }

    /// Apply a force through the center of mass.
    ///
    /// The input is scaled by the body's mass, so equal inputs produce
    /// equal accelerations regardless of mass; gravity flows through the
    /// same path. Only dynamic bodies accumulate forces.
    pub fn apply_linear_force(&mut self, force: Vector3<f64>) {
        if self.body_type.is_dynamic() {
            self.force += force * self.mass;
        }
    }

    /// Apply a force at a world-space point, adding the resulting torque.
    pub fn apply_force_at_world_point(&mut self, force: Vector3<f64>, point: Point3<f64>) {
        if self.body_type.is_dynamic() {
            self.force += force * self.mass;
            self.torque += (point - self.world_center).cross(&force);
        }
    }

    /// Apply a linear impulse through the center of mass.
    pub fn apply_linear_impulse(&mut self, impulse: Vector3<f64>) {
        if self.body_type.is_dynamic() {
            self.velocity.linear += impulse * self.inv_mass;
        }
    }

    /// Apply a linear impulse at a world-space point.
    pub fn apply_linear_impulse_at_world_point(
        &mut self,
        impulse: Vector3<f64>,
        point: Point3<f64>,
    ) {
        if self.body_type.is_dynamic() {
            self.velocity.linear += impulse * self.inv_mass;
            self.velocity.angular +=
                self.inv_inertia_world * (point - self.world_center).cross(&impulse);
        }
    }

    /// Apply a torque.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if self.body_type.is_dynamic() {
            self.torque += torque;
        }
    }

    /// Accumulated force. Cleared at the end of every step.
    #[must_use]
    pub fn force(&self) -> Vector3<f64> {
        self.force
    }

    /// Accumulated torque. Cleared at the end of every step.
    #[must_use]
    pub fn torque(&self) -> Vector3<f64> {
        self.torque
    }

    /// A world-space point expressed in body coordinates.
    #[must_use]
    pub fn local_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.pose.inverse_transform_point(p)
    }

    /// A world-space vector expressed in body coordinates.
    #[must_use]
    pub fn local_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.pose.inverse_transform_vector(v)
    }

    /// A body-space point expressed in world coordinates.
    #[must_use]
    pub fn world_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.pose.transform_point(p)
    }

    /// A body-space vector expressed in world coordinates.
    #[must_use]
    pub fn world_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.pose.transform_vector(v)
    }

    /// Velocity of the material point currently at `p` in world space.
    #[must_use]
    pub fn velocity_at_world_point(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.velocity.velocity_at(&(p - self.world_center))
    }

    /// Whether this body may collide with another.
    ///
    /// A pair is valid when the bodies differ and at least one is
    /// dynamic.
    #[must_use]
    pub fn can_collide(&self, other: &Self) -> bool {
        if self.id == other.id {
            return false;
        }
        self.body_type.is_dynamic() || other.body_type.is_dynamic()
    }

    /// Recompute mass, center of mass and inertia from the collider.
    ///
    /// Static and kinematic bodies always have infinite mass (inverse
    /// zero). A dynamic body whose collider contributes no mass is
    /// forced to unit mass with zero inertia.
    pub(crate) fn calculate_mass_data(&mut self) {
        self.inv_inertia_model = Matrix3::zeros();
        self.inv_inertia_world = Matrix3::zeros();
        self.inv_mass = 0.0;
        self.mass = 0.0;

        if !self.body_type.is_dynamic() {
            self.local_center = Vector3::zeros();
            self.world_center = self.pose.position;
            return;
        }

        let mut mass = 0.0;
        let mut inertia = Matrix3::zeros();
        let mut lc = Vector3::zeros();

        if let Some(collider) = &self.collider {
            if collider.density != 0.0 {
                let md = collider.mass_data();
                mass += md.mass;
                inertia += md.inertia;
                lc += md.center * md.mass;
            }
        }

        if mass > 0.0 {
            self.mass = mass;
            self.inv_mass = 1.0 / mass;
            lc *= self.inv_mass;
            // Shift the origin-relative inertia to the center of mass
            inertia -= (Matrix3::identity() * lc.dot(&lc) - lc * lc.transpose()) * mass;
            self.inv_inertia_model = inertia.try_inverse().unwrap_or_else(Matrix3::zeros);
        } else {
            if self.collider.is_some() {
                warn!(body = %self.id, "dynamic body has zero mass; forcing mass of 1");
            }
            self.mass = 1.0;
            self.inv_mass = 1.0;
            self.inv_inertia_model = Matrix3::zeros();
            self.inv_inertia_world = Matrix3::zeros();
        }

        self.local_center = lc;
        self.world_center = self.pose.transform_point(&Point3::from(lc));
    }

    /// Rebuild the world-space inverse inertia tensor: `R * I^-1 * R^T`.
    pub(crate) fn update_world_inertia(&mut self) {
        let r = self.pose.rotation_matrix();
        self.inv_inertia_world = r * self.inv_inertia_model * r.transpose();
    }

    /// Re-derive the body origin from the center of mass after
    /// integration moved the latter.
    pub(crate) fn refresh_origin(&mut self) {
        self.pose.position =
            self.world_center - self.pose.rotation_matrix() * self.local_center;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boxsim_types::BoxDef;

    fn dynamic_body_with_unit_cube() -> Body {
        let mut body = Body::new(BodyId::new(0), &BodyDef::new(BodyType::Dynamic));
        body.collider = Some(BoxCollider::from(BoxDef::new(
            Pose::identity(),
            Vector3::new(1.0, 1.0, 1.0),
        )));
        body.calculate_mass_data();
        body
    }

    #[test]
    fn test_unit_cube_mass_data() {
        let body = dynamic_body_with_unit_cube();
        assert_relative_eq!(body.mass(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.inv_mass(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            body.inv_inertia_model[(0, 0)],
            6.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_static_body_is_massless() {
        let mut body = Body::new(BodyId::new(0), &BodyDef::default());
        body.collider = Some(BoxCollider::from(BoxDef::default()));
        body.calculate_mass_data();
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia_model, Matrix3::zeros());
    }

    #[test]
    fn test_zero_mass_dynamic_forced_to_unit() {
        let mut body = Body::new(BodyId::new(0), &BodyDef::new(BodyType::Dynamic));
        body.collider = Some(BoxCollider::from(
            BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)).with_density(0.0),
        ));
        body.calculate_mass_data();
        assert_eq!(body.mass(), 1.0);
        assert_eq!(body.inv_mass(), 1.0);
        assert_eq!(body.inv_inertia_model, Matrix3::zeros());
    }

    #[test]
    fn test_static_ignores_velocity() {
        let def = BodyDef::default().with_linear_velocity(Vector3::x());
        let body = Body::new(BodyId::new(0), &def);
        assert_eq!(body.linear_velocity(), Vector3::zeros());
    }

    #[test]
    fn test_force_scaled_by_mass() {
        let mut body = dynamic_body_with_unit_cube();
        body.apply_linear_force(Vector3::new(0.0, -9.81, 0.0));
        assert_relative_eq!(body.force().y, -9.81, epsilon = 1e-12);

        // Impulse applies straight to velocity
        body.apply_linear_impulse(Vector3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(body.linear_velocity().x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_impulse_at_point_spins() {
        let mut body = dynamic_body_with_unit_cube();
        body.update_world_inertia();
        body.apply_linear_impulse_at_world_point(
            Vector3::new(0.0, 0.0, 1.0),
            Point3::new(0.5, 0.0, 0.0),
        );
        // r x J = (0.5,0,0) x (0,0,1) = (0,-0.5,0)
        assert!(body.angular_velocity().y < 0.0);
    }

    #[test]
    fn test_kinematic_ignores_forces_but_keeps_velocity() {
        let def = BodyDef::new(BodyType::Kinematic).with_linear_velocity(Vector3::x());
        let mut body = Body::new(BodyId::new(0), &def);
        body.apply_linear_force(Vector3::new(100.0, 0.0, 0.0));
        assert_eq!(body.force(), Vector3::zeros());
        assert_eq!(body.linear_velocity(), Vector3::x());
    }

    #[test]
    fn test_can_collide_rules() {
        let a = Body::new(BodyId::new(0), &BodyDef::new(BodyType::Dynamic));
        let b = Body::new(BodyId::new(1), &BodyDef::default());
        let c = Body::new(BodyId::new(2), &BodyDef::default());

        assert!(a.can_collide(&b));
        assert!(b.can_collide(&a));
        assert!(!b.can_collide(&c), "two non-dynamic bodies never collide");
        assert!(!a.can_collide(&a), "a body cannot collide with itself");
    }

    #[test]
    fn test_set_density_recomputes_mass() {
        let mut body = dynamic_body_with_unit_cube();
        assert_relative_eq!(body.mass(), 1.0, epsilon = 1e-12);

        body.set_density(2.0);
        assert_relative_eq!(body.mass(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(body.inv_mass(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_material_setters_touch_collider() {
        let mut body = dynamic_body_with_unit_cube();
        body.set_friction(0.9);
        body.set_restitution(0.1);
        body.set_sensor(true);

        let collider = body.collider().unwrap();
        assert_eq!(collider.friction, 0.9);
        assert_eq!(collider.restitution, 0.1);
        assert!(collider.sensor);
    }

    #[test]
    fn test_velocity_at_world_point() {
        let mut body = dynamic_body_with_unit_cube();
        body.set_angular_velocity(Vector3::new(0.0, 0.0, 1.0));
        let v = body.velocity_at_world_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }
}
