//! Viewer error type

use dither_engine::config::ConfigError;
use dither_engine::render::RenderError;
use thiserror::Error;

/// Everything that can stop the viewer
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering core failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Frame capture could not be encoded or written
    #[error("Frame export failed: {0}")]
    Image(#[from] image::ImageError),

    /// Frame directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene is missing a node the viewer drives
    #[error("Scene has no node named '{0}'")]
    MissingNode(String),

    /// Readback size does not match the framebuffer
    #[error("Color readback of {actual} bytes does not fill a {width}x{height} frame")]
    Readback {
        /// Framebuffer width
        width: u32,
        /// Framebuffer height
        height: u32,
        /// Bytes returned by the device
        actual: usize,
    },
}

/// Result alias for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;
