pub mod animate;
pub mod camera;
pub mod cli;
pub mod environment;
pub mod hud;
pub mod loaders;
pub mod renderer;
pub mod scene;
pub mod video;

pub use animate::{playback_progress, SpinMode, SpinTimer};
pub use camera::Camera;
pub use hud::Hud;
pub use renderer::Renderer;
pub use scene::{ReadyLatch, SceneGraph};
pub use video::VideoSource;
