//! # Render Passes
//!
//! A pass consumes one bucket of drawcalls each frame and draws them with
//! either their own materials or a material of its own. The renderer runs
//! its passes in registration order; the dither overlay relies on running
//! after the forward pass so the depth and stencil buffers hold the base
//! pass results.
//!
//! ## Per-drawcall sequence
//! 1. apply the material (program, stored uniforms, fixed-function state)
//! 2. run the registry's uniform update with the drawcall's world matrix
//! 3. bind the vertex array
//! 4. light loop: update lights, set lighting render states, draw; repeat
//!    while the light update asks for another iteration

use crate::foundation::math::Mat4;
use crate::render::camera::CameraSnapshot;
use crate::render::device::{GraphicsDevice, ProgramId};
use crate::render::drawcall::{BucketId, Drawcall, DrawcallBuckets, DrawcallInfo};
use crate::render::lighting::{set_lighting_render_states, Light};
use crate::render::material::Material;
use crate::render::registry::{DrawUniformContext, FrameTunables, ShaderProgramRegistry};
use crate::render::renderer::FrameStats;
use crate::render::{RenderError, RenderResult};

pub mod dither_overlay;
pub mod forward;
pub mod skybox;

pub use dither_overlay::{DitherOverlayPass, OverlayFilter};
pub use forward::ForwardPass;
pub use skybox::SkyboxPass;

/// Everything a pass reads during one frame
///
/// Built by the renderer after the camera-changed flag and the tunables were
/// fixed for the frame; passes cannot change either.
pub struct FrameContext<'a> {
    /// Device all draws go to
    pub device: &'a mut dyn GraphicsDevice,
    /// Program callbacks
    pub registry: &'a ShaderProgramRegistry,
    /// Drawcalls collected from the scene
    pub buckets: &'a DrawcallBuckets,
    /// World matrices indexed by [`DrawcallInfo::world_matrix_index`]
    pub world_matrices: &'a [Mat4],
    /// Active lights
    pub lights: &'a [Light],
    /// Camera of the frame
    pub camera: &'a CameraSnapshot,
    /// Whether the camera moved since the previous frame
    pub camera_changed: bool,
    /// Tunables snapshotted for the frame
    pub tunables: &'a FrameTunables,
    /// Global stencil switch from the renderer configuration
    pub stencil_test_enabled: bool,
    /// Counters accumulated by the passes
    pub stats: FrameStats,
}

impl<'a> FrameContext<'a> {
    /// Drawcalls of a bucket, empty when nothing was collected into it
    pub fn drawcalls(&self, bucket: BucketId) -> &'a [DrawcallInfo] {
        self.buckets.get(bucket)
    }

    /// World matrix of a drawcall
    pub fn world_matrix(&self, info: &DrawcallInfo) -> RenderResult<Mat4> {
        self.world_matrices
            .get(info.world_matrix_index)
            .copied()
            .ok_or_else(|| RenderError::InvalidResource(format!("world matrix {} missing", info.world_matrix_index)))
    }

    /// Apply `material`, push per-drawcall uniforms and bind the geometry
    pub fn prepare_drawcall(&mut self, info: &DrawcallInfo, material: &Material) -> RenderResult<()> {
        let world_matrix = self.world_matrix(info)?;
        material.apply(self.device)?;
        if !self.stencil_test_enabled {
            self.device.set_stencil_test_enabled(false);
        }

        let ctx = DrawUniformContext {
            world_matrix,
            camera: self.camera,
            camera_changed: self.camera_changed,
            tunables: self.tunables,
        };
        self.registry.update_uniforms(material.program().id(), self.device, &ctx)?;
        self.device.bind_vertex_array(info.vertex_array);
        self.stats.drawcalls += 1;
        Ok(())
    }

    /// Draw a prepared drawcall once per light iteration
    ///
    /// Always draws at least once; later iterations blend additively.
    pub fn draw_lit(&mut self, info: &DrawcallInfo, material: &Material) -> RenderResult<()> {
        let program = material.program().id();
        let mut light_index = 0;
        let mut first = true;
        loop {
            let more = self
                .registry
                .update_lights(program, self.device, self.lights, &mut light_index)?;
            set_lighting_render_states(self.device, material.depth_state(), material.blend_mode(), first);
            info.drawcall.draw(self.device);
            self.stats.draws += 1;
            if !more {
                break;
            }
            first = false;
        }
        Ok(())
    }

    /// Draw once with the bound state, without touching lights
    pub fn draw_unlit(&mut self, drawcall: &Drawcall) {
        drawcall.draw(self.device);
        self.stats.draws += 1;
    }
}

/// A stage of the frame
pub trait RenderPass {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Programs this pass draws with that must be registered
    fn required_programs(&self) -> Vec<ProgramId> {
        Vec::new()
    }

    /// Draw this pass's share of the frame
    fn render(&self, frame: &mut FrameContext<'_>) -> RenderResult<()>;
}
