//! # Unified Configuration System
//!
//! Configuration structures for every subsystem of a viewer built on the
//! engine. All types are serializable and can be loaded from TOML or RON
//! through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: Logging behavior
//! - **Window Config**: Framebuffer size and title
//! - **Renderer Config**: Clear values, stencil test, light budget
//! - **Dither Settings**: Live-tunable dither transition parameters
//! - **Output Config**: Frame count, shader directory, frame export

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl EngineConfig {
    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Framebuffer dimensions and window title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Framebuffer width in pixels
    pub width: u32,
    /// Framebuffer height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
}

impl WindowConfig {
    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            title: "Scene Viewer demo".to_string(),
        }
    }
}

/// # Renderer Configuration
///
/// Frame-level state the renderer applies before running its passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// RGBA clear color
    pub clear_color: [f32; 4],
    /// Depth clear value
    pub clear_depth: f32,
    /// Stencil clear value
    pub clear_stencil: u8,
    /// Enable the stencil test for the whole frame
    ///
    /// The stencil choreography between the forward and dither overlay
    /// passes only works with this enabled.
    pub enable_stencil_test: bool,
    /// Maximum number of lights collected per frame
    pub max_lights: usize,
}

impl RendererConfig {
    /// Set the clear color
    #[must_use]
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable or disable the stencil test
    #[must_use]
    pub fn with_stencil_test(mut self, enabled: bool) -> Self {
        self.enable_stencil_test = enabled;
        self
    }

    /// Set the light budget
    #[must_use]
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        self.max_lights = max_lights;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.clear_depth) {
            return Err(ConfigError::Invalid(format!(
                "clear_depth must be within [0, 1], got {}",
                self.clear_depth
            )));
        }
        if self.max_lights == 0 {
            return Err(ConfigError::Invalid("max_lights must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            clear_stencil: 0,
            enable_stencil_test: true,
            max_lights: 8,
        }
    }
}

/// Live-tunable dither transition parameters
///
/// Owned by the renderer and snapshotted once per frame before any pass runs;
/// the debug UI edits them between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DitherSettings {
    /// Camera distance below which the dither transition starts
    pub threshold: f32,
    /// Scale of the dither pattern
    pub scale: f32,
    /// Strength of the overlay dither on the character
    pub amount: f32,
}

impl DitherSettings {
    /// Slider range of the threshold
    pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 10.0);
    /// Slider range of the scale
    pub const SCALE_RANGE: (f32, f32) = (0.0, 1.0);
    /// Slider range of the amount
    pub const AMOUNT_RANGE: (f32, f32) = (0.0, 1.0);

    /// Clamp every value into its slider range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            threshold: self.threshold.clamp(Self::THRESHOLD_RANGE.0, Self::THRESHOLD_RANGE.1),
            scale: self.scale.clamp(Self::SCALE_RANGE.0, Self::SCALE_RANGE.1),
            amount: self.amount.clamp(Self::AMOUNT_RANGE.0, Self::AMOUNT_RANGE.1),
        }
    }
}

impl Default for DitherSettings {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            scale: 1.0,
            amount: 0.8,
        }
    }
}

/// Frame loop and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of frames the viewer renders before exiting
    pub frame_count: u32,
    /// Directory containing the shader sources
    pub shader_dir: String,
    /// Directory receiving PNG captures, `None` disables export
    pub frame_dir: Option<String>,
    /// Export every n-th frame
    pub capture_interval: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            frame_count: 120,
            shader_dir: "resources/shaders".to_string(),
            frame_dir: None,
            capture_interval: 30,
        }
    }
}

/// # Complete Viewer Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Framebuffer configuration
    pub window: WindowConfig,
    /// Rendering configuration
    pub renderer: RendererConfig,
    /// Initial dither tunables
    pub dither: DitherSettings,
    /// Frame loop and output configuration
    pub output: OutputConfig,
}

impl ViewerConfig {
    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "framebuffer must be non-empty, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.output.capture_interval == 0 {
            return Err(ConfigError::Invalid("capture_interval must be at least 1".to_string()));
        }
        self.renderer.validate()
    }
}

impl Config for ViewerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dither_defaults_match_demo_values() {
        let dither = DitherSettings::default();
        assert_eq!(dither.threshold, 3.0);
        assert_eq!(dither.scale, 1.0);
        assert_eq!(dither.amount, 0.8);
    }

    #[test]
    fn test_dither_clamped_into_slider_ranges() {
        let dither = DitherSettings { threshold: 12.0, scale: -1.0, amount: 0.5 }.clamped();
        assert_eq!(dither.threshold, 10.0);
        assert_eq!(dither.scale, 0.0);
        assert_eq!(dither.amount, 0.5);
    }

    #[test]
    fn test_renderer_config_validation() {
        assert!(RendererConfig::default().validate().is_ok());
        assert!(RendererConfig::default().with_max_lights(0).validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ViewerConfig = toml::from_str("[dither]\nthreshold = 5.0\n").unwrap();
        assert_eq!(config.dither.threshold, 5.0);
        assert_eq!(config.dither.amount, 0.8);
        assert_eq!(config.window, WindowConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_ron() {
        let path = std::env::temp_dir().join(format!("dither_engine_config_{}.ron", std::process::id()));
        let config = ViewerConfig {
            dither: DitherSettings { threshold: 4.5, scale: 0.5, amount: 0.25 },
            ..ViewerConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = ViewerConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
