use glam::{Mat4, Quat, Vec3};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::asset::Mesh;
use crate::renderer::primitives;
use crate::renderer::{BatchBackend, RenderError, SceneRenderer, TextureId};
use crate::scene::Camera;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Cube,
    Sphere,
    Panel,
}

struct DemoObject {
    shape: Shape,
    position: Vec3,
    axis: Vec3,
    spin: f32,
    scale: f32,
    color: [f32; 4],
    textured: bool,
}

/// Field of generated meshes re-submitted every frame, so the batcher sees a
/// fresh stream of geometry each time.
pub struct DemoScene {
    cube: Mesh,
    sphere: Mesh,
    panel: Mesh,
    objects: Vec<DemoObject>,
    camera: Camera,
    orbit_radius: f32,
    orbit_height: f32,
    time: f32,
    texture: Option<TextureId>,
}

impl DemoScene {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let extent = (count as f32).cbrt().max(1.0) * 1.5;

        let objects = (0..count)
            .map(|_| {
                let shape = match rng.gen_range(0..3) {
                    0 => Shape::Cube,
                    1 => Shape::Sphere,
                    _ => Shape::Panel,
                };
                DemoObject {
                    shape,
                    position: Vec3::new(
                        rng.gen_range(-extent..extent),
                        rng.gen_range(-extent..extent),
                        rng.gen_range(-extent..extent),
                    ),
                    axis: Vec3::new(rng.gen(), rng.gen(), rng.gen()).normalize_or(Vec3::Y),
                    spin: rng.gen_range(-2.0..2.0),
                    scale: rng.gen_range(0.3..0.9),
                    color: [rng.gen(), rng.gen(), rng.gen(), 1.0],
                    textured: rng.gen_bool(0.5),
                }
            })
            .collect();

        info!("Demo scene with {} meshes", count);

        Self {
            cube: primitives::cube([1.0; 4]),
            sphere: primitives::sphere(16, 12, [1.0; 4]),
            panel: primitives::grid(4, 4, 0.25, [1.0; 4]),
            objects,
            camera: Camera::default(),
            orbit_radius: extent * 3.0,
            orbit_height: extent,
            time: 0.0,
            texture: None,
        }
    }

    /// Texture sampled by roughly half of the objects.
    pub fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        let t = self.time * 0.3;
        self.camera.eye = Vec3::new(
            t.cos() * self.orbit_radius,
            self.orbit_height,
            t.sin() * self.orbit_radius,
        );
        self.camera.target = Vec3::ZERO;
        self.camera.up = Vec3::Y;
    }

    /// One full scene: every object is regenerated in world space and submitted.
    ///
    /// Meshes the batcher cannot take are skipped; it has already logged them.
    pub fn render<B: BatchBackend>(
        &self,
        renderer: &mut SceneRenderer<B>,
    ) -> Result<(), RenderError> {
        renderer.begin_scene(&self.camera)?;

        for object in &self.objects {
            let slot = match (object.textured, self.texture) {
                (true, Some(texture)) => renderer.texture_slot(texture)?,
                _ => 0,
            };
            let mesh = self.world_mesh(object, slot);
            match renderer.submit(&mesh) {
                Ok(()) | Err(RenderError::CapacityExceeded { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        renderer.end_scene()
    }

    fn world_mesh(&self, object: &DemoObject, slot: u32) -> Mesh {
        let base = match object.shape {
            Shape::Cube => &self.cube,
            Shape::Sphere => &self.sphere,
            Shape::Panel => &self.panel,
        };
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(object.scale),
            Quat::from_axis_angle(object.axis, object.spin * self.time),
            object.position,
        );

        let mut mesh = base.clone().with_color(object.color);
        mesh.transform(model);
        // Untextured objects sample slot 0; without a bound texture that is
        // the backend's white fallback.
        mesh.with_texture_slot(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessBackend;
    use crate::settings::BatchLimits;

    #[test]
    fn same_seed_generates_same_scene() {
        let a = DemoScene::new(20, 7);
        let b = DemoScene::new(20, 7);
        assert!(a
            .objects
            .iter()
            .zip(&b.objects)
            .all(|(x, y)| x.position == y.position && x.shape == y.shape));
    }

    #[test]
    fn render_submits_every_object() {
        let scene = DemoScene::new(50, 1);
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), BatchLimits::default());

        scene.render(&mut renderer).unwrap();

        let stats = renderer.stats();
        assert_eq!(stats.dropped_meshes, 0);
        let expected: u64 = scene
            .objects
            .iter()
            .map(|o| scene.world_mesh(o, 0).vertex_count() as u64)
            .sum();
        assert_eq!(stats.vertices, expected);
    }

    #[test]
    fn small_arena_forces_several_flushes() {
        let scene = DemoScene::new(40, 3);
        let limits = BatchLimits {
            max_vertex_count: 512,
            max_index_count: 2048,
            max_draw_commands: 8,
        };
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits);

        scene.render(&mut renderer).unwrap();

        assert!(renderer.backend().draw_call_count() > 1);
        assert_eq!(renderer.stats().dropped_meshes, 0);
        assert!(!renderer.is_accumulating());
    }

    #[test]
    fn update_orbits_camera_around_origin() {
        let mut scene = DemoScene::new(1, 0);
        scene.update(1.0);
        let eye = scene.camera_mut().eye;
        let horizontal = Vec3::new(eye.x, 0.0, eye.z).length();
        assert!((horizontal - scene.orbit_radius).abs() < 1e-4);
    }
}
