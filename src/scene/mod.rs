// scene/mod.rs

pub mod camera;
pub mod demo;

pub use camera::{Camera, OrthographicCamera, SceneCamera};
pub use demo::DemoScene;
