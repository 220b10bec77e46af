//! Debug rendering sink.
//!
//! The engine never draws anything itself; it walks its state and feeds
//! a caller-supplied [`DebugDraw`] sink. The pen model is stateful
//! (color, position, scale) so a renderer can batch primitives however
//! it likes. All default method bodies are no-ops.

use nalgebra::{Point3, Vector3};

use crate::scene::Scene;

/// Receives debug-draw primitives from [`Scene::debug_draw`].
pub trait DebugDraw {
    /// Set the current pen color.
    fn set_pen_color(&mut self, r: f64, g: f64, b: f64) {
        let _ = (r, g, b);
    }

    /// Move the pen without drawing.
    fn set_pen_position(&mut self, p: &Point3<f64>) {
        let _ = p;
    }

    /// Set the current primitive scale.
    fn set_scale(&mut self, sx: f64, sy: f64, sz: f64) {
        let _ = (sx, sy, sz);
    }

    /// Set the normal used for subsequent triangles.
    fn set_tri_normal(&mut self, n: &Vector3<f64>) {
        let _ = n;
    }

    /// Draw a line from the pen position to `to`, leaving the pen at
    /// `to`.
    fn line(&mut self, to: &Point3<f64>) {
        let _ = to;
    }

    /// Draw a triangle.
    fn triangle(&mut self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) {
        let _ = (a, b, c);
    }

    /// Draw a point at the pen position.
    fn point(&mut self) {}
}

impl Scene {
    /// Feed the whole scene to a debug-draw sink: every box as a
    /// wireframe and every live contact as a point with its normal.
    pub fn debug_draw(&self, render: &mut dyn DebugDraw) {
        for body in self.bodies() {
            let Some(collider) = body.collider() else {
                continue;
            };
            let tx = collider.world_pose(body.pose());
            let e = collider.half_extents;

            // The eight corners, indexed by sign bits per axis
            let mut corners = [Point3::origin(); 8];
            for (i, corner) in corners.iter_mut().enumerate() {
                let local = Point3::new(
                    if i & 1 == 0 { -e.x } else { e.x },
                    if i & 2 == 0 { -e.y } else { e.y },
                    if i & 4 == 0 { -e.z } else { e.z },
                );
                *corner = tx.transform_point(&local);
            }

            render.set_pen_color(0.2, 0.8, 0.4);
            for i in 0..8 {
                for axis in 0..3 {
                    let j = i | (1 << axis);
                    if j > i {
                        render.set_pen_position(&corners[i]);
                        render.line(&corners[j]);
                    }
                }
            }
        }

        for constraint in self.contacts().constraints() {
            if !constraint.colliding {
                continue;
            }
            let manifold = &constraint.manifold;
            for contact in manifold.contacts() {
                // Warm-started contacts draw hot, fresh ones cold
                if contact.warm_started > 0 {
                    render.set_pen_color(1.0, 0.3, 0.1);
                } else {
                    render.set_pen_color(0.2, 0.4, 1.0);
                }
                render.set_pen_position(&contact.position);
                render.point();

                render.set_pen_color(1.0, 1.0, 1.0);
                render.set_pen_position(&contact.position);
                render.line(&(contact.position + manifold.normal * 0.5));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use boxsim_types::{BodyDef, BodyType, BoxDef, Pose, SceneConfig};
    use nalgebra::Vector3 as V3;

    #[derive(Default)]
    struct Recorder {
        lines: usize,
        points: usize,
    }

    impl DebugDraw for Recorder {
        fn line(&mut self, _to: &Point3<f64>) {
            self.lines += 1;
        }
        fn point(&mut self) {
            self.points += 1;
        }
    }

    #[test]
    fn test_wireframe_has_twelve_edges() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        let id = scene.create_body(&BodyDef::default()).unwrap();
        scene
            .set_box(id, &BoxDef::new(Pose::identity(), V3::new(1.0, 1.0, 1.0)))
            .unwrap();

        let mut rec = Recorder::default();
        scene.debug_draw(&mut rec);
        assert_eq!(rec.lines, 12);
        assert_eq!(rec.points, 0);
    }

    #[test]
    fn test_contacts_draw_points_and_normals() {
        let mut scene = Scene::new(SceneConfig::default().zero_gravity()).unwrap();
        for y in [0.0, 0.9] {
            let id = scene
                .create_body(
                    &BodyDef::new(BodyType::Dynamic)
                        .with_position(Point3::new(0.0, y, 0.0)),
                )
                .unwrap();
            scene
                .set_box(id, &BoxDef::new(Pose::identity(), V3::new(1.0, 1.0, 1.0)))
                .unwrap();
        }
        scene.step();

        let mut rec = Recorder::default();
        scene.debug_draw(&mut rec);
        // 2 wireframes + one line per contact point
        assert_eq!(rec.points, 4);
        assert_eq!(rec.lines, 24 + 4);
    }
}
