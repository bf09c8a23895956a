pub mod gltf;
pub mod hdr;
pub mod progress;

pub use gltf::{install_model, load_model, LoadedModel, ModelNode};
pub use hdr::{load_hdr, HdrImage};
pub use progress::{spawn_asset_loader, LoadEvent, LoadTracker, MIN_DISPLAY_TIME_MS};
