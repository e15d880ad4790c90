use glam::{Mat4, Vec3};

/// Source of the matrices `begin_scene` combines into the view-projection.
pub trait SceneCamera {
    fn projection(&self) -> Mat4;
    fn view(&self) -> Mat4;

    fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn position(&self) -> Vec3 {
        self.eye
    }
}

impl SceneCamera for Camera {
    fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// 2D camera looking down -Z with a world-space window of `width` x `height`
/// centred on `position`.
#[derive(Clone, Copy, Debug)]
pub struct OrthographicCamera {
    pub position: Vec3,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl OrthographicCamera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            width,
            height,
            zoom: 1.0,
        }
    }
}

impl SceneCamera for OrthographicCamera {
    fn projection(&self) -> Mat4 {
        let half_w = self.width * 0.5 / self.zoom.max(f32::EPSILON);
        let half_h = self.height * 0.5 / self.zoom.max(f32::EPSILON);
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
    }

    fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position)
    }
}
