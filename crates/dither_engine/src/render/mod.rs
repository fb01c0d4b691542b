//! # Rendering Core
//!
//! Multi-pass rendering built on a [`device::GraphicsDevice`]:
//!
//! - [`material`]: program plus filtered uniform values and fixed-function state
//! - [`registry`]: per-program uniform and light update callbacks
//! - [`drawcall`]: drawcalls bucketed by integer id
//! - [`passes`]: forward, dither overlay and skybox passes
//! - [`renderer`]: owns the device, the registry and the ordered pass list
//!
//! ## Frame Flow
//!
//! Scene visitors fill the renderer's buckets, lights and camera. The
//! renderer then runs its passes in insertion order. Each drawcall goes
//! through prepare (program, shared uniforms, material state) and the light
//! loop before the actual draw.

use thiserror::Error;

pub mod camera;
pub mod device;
pub mod drawcall;
pub mod lighting;
pub mod material;
pub mod passes;
pub mod registry;
pub mod renderer;
pub mod shader;

#[cfg(test)]
mod tests;

pub use camera::{Camera, CameraSnapshot};
pub use drawcall::{Drawcall, DrawcallBuckets, DrawcallInfo};
pub use lighting::{Light, LightType};
pub use material::Material;
pub use passes::{DitherOverlayPass, ForwardPass, FrameContext, OverlayFilter, RenderPass, SkyboxPass};
pub use registry::ShaderProgramRegistry;
pub use renderer::{FrameStats, Renderer};

/// Errors raised by the rendering core
#[derive(Error, Debug)]
pub enum RenderError {
    /// A shader stage failed to compile
    #[error("Shader compilation failed for '{name}': {message}")]
    ShaderCompilation {
        /// Program or file name
        name: String,
        /// Compiler output
        message: String,
    },

    /// Program linking failed
    #[error("Shader link failed for '{name}': {message}")]
    ShaderLink {
        /// Program name
        name: String,
        /// Linker output
        message: String,
    },

    /// A uniform name is not active in the program
    #[error("Uniform '{uniform}' not found in program '{program}'")]
    UnknownUniform {
        /// Program name
        program: String,
        /// Requested uniform
        uniform: String,
    },

    /// A material tried to store a uniform the registry owns or the program lacks
    #[error("Material '{material}' may not bind uniform '{uniform}'")]
    BindingViolation {
        /// Material name
        material: String,
        /// Rejected uniform
        uniform: String,
    },

    /// A value does not match the declared uniform type
    #[error("Uniform '{uniform}' expects {expected}, got {actual}")]
    UniformTypeMismatch {
        /// Uniform name
        uniform: String,
        /// Declared type
        expected: String,
        /// Supplied value kind
        actual: String,
    },

    /// A drawcall references a program the registry does not know
    #[error("Shader program '{0}' has no registry entry")]
    UnregisteredProgram(String),

    /// A GPU resource could not be created or was used incorrectly
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// File access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the rendering core
pub type RenderResult<T> = Result<T, RenderError>;
