//! Dither transition viewer
//!
//! Renders a flag and a character through the forward, dither overlay and
//! skybox passes while a scripted camera flies past them. Frames can be
//! exported as PNG files.
//!
//! Usage: `dither_viewer [config.toml|config.ron]`

mod app;
mod controller;
mod error;
mod scripted_ui;

use dither_engine::config::Config;
use dither_engine::core::ViewerConfig;
use dither_engine::foundation::logging;

use crate::app::DitherViewerApp;
use crate::error::ViewerResult;

fn load_config() -> ViewerResult<ViewerConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load_from_file(&path)?,
        None => ViewerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> ViewerResult<()> {
    let config = load_config()?;
    logging::init_with_level(&config.engine.log_level);
    log::info!(
        "Starting '{}' at {}x{}",
        config.window.title,
        config.window.width,
        config.window.height
    );

    let mut app = DitherViewerApp::new(config)?;
    if let Err(e) = app.run() {
        log::error!("Viewer stopped: {}", e);
        return Err(e);
    }

    log::info!("Dither viewer completed");
    Ok(())
}
