//! # Core Engine Module
//!
//! Shared configuration types consumed by the renderer and by applications.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for engine, window, renderer, dither
//!   tunables and frame output

pub mod config;

pub use config::{
    ViewerConfig,
    EngineConfig,
    WindowConfig,
    RendererConfig,
    DitherSettings,
    OutputConfig,
};
pub use crate::config::{Config, ConfigError};
