//! # Dither Engine
//!
//! Multi-pass rendering core for a small scene viewer.
//!
//! ## Features
//!
//! - **Render passes**: ordered forward, dither overlay and skybox passes
//! - **Materials**: shared shader programs with filtered uniform ownership and
//!   per-material depth, stencil and blend state
//! - **Shader registry**: per-program uniform and light update callbacks fed
//!   by an explicit per-drawcall context
//! - **Scene visitors**: per-frame bucket assembly and debug UI reflection
//! - **Software device**: a CPU reference device with GL depth/stencil
//!   semantics for headless runs and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use dither_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let device = Box::new(SoftwareDevice::new(256, 256));
//!     let mut renderer = Renderer::new(device, RendererConfig::default());
//!
//!     let vertex = ShaderLoader::new(ShaderStage::Vertex).load(&["shaders/default.vert"])?;
//!     let fragment = ShaderLoader::new(ShaderStage::Fragment).load(&["shaders/default.frag"])?;
//!     let program = ShaderProgram::build(renderer.device_mut(), "default", &vertex, &fragment)?;
//!     renderer.register_shader_program(Rc::clone(&program), UpdateUniforms::transform(), UpdateLights::per_light());
//!     renderer.add_render_pass(Box::new(ForwardPass::new(0)))?;
//!
//!     let material = Rc::new(renderer.create_material("default", &program)?);
//!     let model = Rc::new(Model::from_mesh(renderer.device_mut(), &Mesh::cube(1.0), material)?);
//!
//!     let mut scene = Scene::new();
//!     scene.add_node(SceneNode::camera("camera", Camera::default()));
//!     scene.add_node(SceneNode::model("cube", model, Transform::identity()));
//!
//!     scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer))?;
//!     let stats = renderer.render()?;
//!     println!("{} draws", stats.draws);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod ui;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{DitherSettings, RendererConfig, ViewerConfig},
        foundation::math::{Mat4, Transform, Vec3, Vec4},
        render::{
            device::{
                BlendMode, GraphicsDevice, SoftwareDevice, StencilOperation, TestFunction, TextureDesc, TextureId,
                TextureKind,
            },
            registry::{DitherUniforms, UpdateLights, UpdateUniforms},
            shader::{ShaderLoader, ShaderProgram, ShaderSource, ShaderStage, UniformValue},
            Camera, DitherOverlayPass, ForwardPass, FrameStats, Light, Material, OverlayFilter, RenderError,
            RenderPass, RenderResult, Renderer, ShaderProgramRegistry, SkyboxPass,
        },
        scene::{GuiSceneVisitor, Mesh, Model, RendererSceneVisitor, Scene, SceneNode, SceneVisitor},
        ui::DebugUi,
    };
}
