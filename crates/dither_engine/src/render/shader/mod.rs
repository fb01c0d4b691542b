//! Shader sources, compiled programs and uniform values

pub mod loader;
pub mod program;
pub mod uniform;

pub use loader::{ShaderLoader, ShaderSource, ShaderStage};
pub use program::ShaderProgram;
pub use uniform::{name_set, NameSet, UniformValue};
