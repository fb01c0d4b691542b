//! Per-drawcall uniform update strategies
//!
//! An update function receives everything it may read through a
//! [`DrawUniformContext`]; it captures nothing from the renderer.

use crate::core::config::DitherSettings;
use crate::foundation::math::Mat4;
use crate::render::camera::CameraSnapshot;
use crate::render::device::GraphicsDevice;
use crate::render::shader::{name_set, NameSet, ShaderProgram};
use crate::render::RenderResult;

/// Uniforms pushed by [`UpdateUniforms::transform`]
pub const TRANSFORM_UNIFORMS: [&str; 3] = ["WorldMatrix", "ViewProjMatrix", "CameraPosition"];

/// Tunables snapshotted once per frame before any pass runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTunables {
    /// Dither parameters edited through the debug UI
    pub dither: DitherSettings,
    /// Distance from the camera to the dithered object
    pub camera_object_distance: f32,
}

/// Inputs of a per-drawcall uniform update
#[derive(Debug, Clone, Copy)]
pub struct DrawUniformContext<'a> {
    /// World matrix of the drawcall
    pub world_matrix: Mat4,
    /// Camera state of the frame
    pub camera: &'a CameraSnapshot,
    /// Whether camera uniforms must be pushed
    pub camera_changed: bool,
    /// Frame tunables
    pub tunables: &'a FrameTunables,
}

/// Which dither uniforms a dithered program receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherUniforms {
    /// `DitherThreshold`, `DitherScale`, `CameraObjectDistance`
    Transition,
    /// [`DitherUniforms::Transition`] plus `MarioDitherAmount`
    TransitionWithAmount,
}

impl DitherUniforms {
    /// Uniform names pushed for this variant
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Transition => &["DitherThreshold", "DitherScale", "CameraObjectDistance"],
            Self::TransitionWithAmount => &["DitherThreshold", "DitherScale", "CameraObjectDistance", "MarioDitherAmount"],
        }
    }
}

/// Callback signature of an uniform update
pub type UpdateUniformsFn = dyn Fn(&ShaderProgram, &mut dyn GraphicsDevice, &DrawUniformContext<'_>) -> RenderResult<()>;

/// A uniform update callback and the names it owns
pub struct UpdateUniforms {
    names: NameSet,
    func: Box<UpdateUniformsFn>,
}

impl std::fmt::Debug for UpdateUniforms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUniforms").field("names", &self.names).finish_non_exhaustive()
    }
}

impl UpdateUniforms {
    /// Wrap a custom callback that owns `names`
    pub fn new<F>(names: NameSet, func: F) -> Self
    where
        F: Fn(&ShaderProgram, &mut dyn GraphicsDevice, &DrawUniformContext<'_>) -> RenderResult<()> + 'static,
    {
        Self {
            names,
            func: Box::new(func),
        }
    }

    /// Push nothing
    pub fn none() -> Self {
        Self::new(NameSet::new(), |_, _, _| Ok(()))
    }

    /// World matrix on every drawcall, camera uniforms when the camera changed
    pub fn transform() -> Self {
        Self::new(name_set(TRANSFORM_UNIFORMS), push_transform)
    }

    /// [`Self::transform`] plus the dither tunables
    pub fn dithered(dither: DitherUniforms) -> Self {
        let names = name_set(TRANSFORM_UNIFORMS.iter().chain(dither.names()).copied());
        Self::new(names, move |program, device, ctx| {
            push_transform(program, device, ctx)?;
            let settings = ctx.tunables.dither;
            program.set_uniform_if_present(device, "DitherThreshold", settings.threshold)?;
            program.set_uniform_if_present(device, "DitherScale", settings.scale)?;
            program.set_uniform_if_present(device, "CameraObjectDistance", ctx.tunables.camera_object_distance)?;
            if dither == DitherUniforms::TransitionWithAmount {
                program.set_uniform_if_present(device, "MarioDitherAmount", settings.amount)?;
            }
            Ok(())
        })
    }

    /// Names this callback writes
    pub fn names(&self) -> &NameSet {
        &self.names
    }

    /// Run the callback
    pub fn call(&self, program: &ShaderProgram, device: &mut dyn GraphicsDevice, ctx: &DrawUniformContext<'_>) -> RenderResult<()> {
        (self.func)(program, device, ctx)
    }
}

fn push_transform(program: &ShaderProgram, device: &mut dyn GraphicsDevice, ctx: &DrawUniformContext<'_>) -> RenderResult<()> {
    program.set_uniform_if_present(device, "WorldMatrix", ctx.world_matrix)?;
    if ctx.camera_changed {
        program.set_uniform_if_present(device, "ViewProjMatrix", ctx.camera.view_projection)?;
        program.set_uniform_if_present(device, "CameraPosition", ctx.camera.position)?;
    }
    Ok(())
}
