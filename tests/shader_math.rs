//! CPU mirrors of the batch shader's vertex stage.
//!
//! Conventions:
//! - Right-handed view space (camera looks down -Z).
//! - Clip/NDC depth range is [0, 1] (wgpu). Near -> 0, far -> 1.
//! - `texture_index` travels as f32 and is rounded to the nearest slot.
use glam::{Mat4, Vec3, Vec4};
use wgpu_batch::renderer::primitives;
use wgpu_batch::renderer::{FrameUniform, MAX_TEXTURE_SLOTS};
use wgpu_batch::scene::{Camera, OrthographicCamera, SceneCamera};

const EPSILON: f32 = 1e-5;

/// `out.clip = frame.view_proj * vec4(in.pos, 1.0)`
fn run_vertex_shader(frame: &FrameUniform, pos: [f32; 3]) -> Vec4 {
    Mat4::from_cols_array_2d(&frame.view_proj) * Vec3::from_array(pos).extend(1.0)
}

/// `u32(in.texture_index + 0.5)` followed by the fragment `switch`.
fn shader_slot(texture_index: f32) -> Option<u32> {
    let slot = (texture_index + 0.5) as u32;
    (slot < MAX_TEXTURE_SLOTS as u32).then_some(slot)
}

fn ndc(clip: Vec4) -> Vec3 {
    clip.truncate() / clip.w
}

#[test]
fn near_and_far_planes_map_to_wgpu_depth_range() {
    let camera = Camera {
        eye: Vec3::ZERO,
        target: Vec3::new(0.0, 0.0, -1.0),
        ..Camera::default()
    };
    let frame = FrameUniform::from_matrix(camera.view_proj());

    let near = ndc(run_vertex_shader(&frame, [0.0, 0.0, -camera.near]));
    let far = ndc(run_vertex_shader(&frame, [0.0, 0.0, -camera.far]));

    assert!(near.z.abs() < EPSILON, "near depth {}", near.z);
    assert!((far.z - 1.0).abs() < 1e-4, "far depth {}", far.z);
}

#[test]
fn target_projects_to_screen_centre() {
    let camera = Camera {
        eye: Vec3::new(3.0, 4.0, 5.0),
        target: Vec3::new(-1.0, 0.5, 2.0),
        ..Camera::default()
    };
    let frame = FrameUniform::from_matrix(camera.view_proj());

    let centre = ndc(run_vertex_shader(&frame, camera.target.to_array()));

    assert!(centre.x.abs() < 1e-4);
    assert!(centre.y.abs() < 1e-4);
    assert!((0.0..=1.0).contains(&centre.z));
}

#[test]
fn orthographic_quad_fills_the_view() {
    let camera = OrthographicCamera::new(2.0, 2.0);
    let frame = FrameUniform::from_matrix(camera.view_proj());
    let quad = primitives::quad(2.0, 2.0, [1.0; 4]);

    for vertex in quad.vertices() {
        let p = ndc(run_vertex_shader(&frame, vertex.pos));
        assert!((p.x.abs() - 1.0).abs() < EPSILON);
        assert!((p.y.abs() - 1.0).abs() < EPSILON);
    }
}

#[test]
fn texture_index_rounds_to_nearest_slot() {
    assert_eq!(shader_slot(0.0), Some(0));
    assert_eq!(shader_slot(2.9999), Some(3));
    assert_eq!(shader_slot(3.0001), Some(3));
    assert_eq!(shader_slot(15.0), Some(15));
    assert_eq!(shader_slot(16.0), None);
}

#[test]
fn every_slot_survives_the_float_round_trip() {
    let mesh = primitives::unit_quad();
    for slot in 0..MAX_TEXTURE_SLOTS as u32 {
        let tagged = mesh.clone().with_texture_slot(slot);
        assert!(tagged
            .vertices()
            .iter()
            .all(|v| shader_slot(v.texture_index) == Some(slot)));
    }
}
