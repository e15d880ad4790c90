pub mod app;
pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;

use app::App;
use scene::DemoScene;
use settings::RenderSettings;
use winit::event_loop::EventLoop;

const DEMO_MESH_COUNT: usize = 2000;
const DEMO_SEED: u64 = 0x5eed;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> Result<(), winit::error::EventLoopError> {
    init_logging();

    log::info!("Starting wgpu batch renderer");

    let settings = RenderSettings::load();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, DemoScene::new(DEMO_MESH_COUNT, DEMO_SEED));

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}
