// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

use crate::video::DEFAULT_STREAM_URL;

#[derive(Parser, Debug, Clone)]
#[command(name = "walkman-viewer")]
#[command(about = "Walkman model viewer with an HLS video screen", long_about = None)]
pub struct Cli {
    /// Path to the glTF model
    #[arg(long, default_value = "assets/model/model.gltf")]
    pub model: PathBuf,

    /// Path to the equirectangular HDR environment image
    #[arg(long, default_value = "assets/little_paris_under_tower_1k.hdr")]
    pub environment: PathBuf,

    /// HLS manifest URL
    #[arg(long, default_value = DEFAULT_STREAM_URL)]
    pub stream: String,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Disable UI elements (loading screen, now-playing bar)
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}
