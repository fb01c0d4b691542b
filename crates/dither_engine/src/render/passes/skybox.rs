//! # Skybox Pass
//!
//! Draws a full-screen quad on the far plane sampling an environment
//! cubemap. The depth test is `LessEqual` without writes, so the sky only
//! fills pixels no geometry covered. Running it last keeps it from being
//! shaded under opaque geometry.
//!
//! The pass owns its program and pushes its two camera uniforms itself; it
//! does not go through the registry.

use crate::foundation::math::{Mat4, Vec3};
use crate::render::device::{GraphicsDevice, PrimitiveMode, TestFunction, TextureId, VertexArrayId};
use crate::render::drawcall::Drawcall;
use crate::render::material::Material;
use crate::render::passes::{FrameContext, RenderPass};
use crate::render::shader::{name_set, ShaderProgram, ShaderSource, ShaderStage};
use crate::render::RenderResult;

const SKYBOX_VERTEX_SHADER: &str = include_str!("shaders/skybox.vert");
const SKYBOX_FRAGMENT_SHADER: &str = include_str!("shaders/skybox.frag");

/// Environment cubemap drawn behind everything
#[derive(Debug)]
pub struct SkyboxPass {
    material: Material,
    vertex_array: VertexArrayId,
    drawcall: Drawcall,
}

impl SkyboxPass {
    /// Build the skybox program and quad for `cubemap`
    pub fn new(device: &mut dyn GraphicsDevice, cubemap: TextureId) -> RenderResult<Self> {
        let vertex = ShaderSource::inline(ShaderStage::Vertex, "skybox.vert", SKYBOX_VERTEX_SHADER);
        let fragment = ShaderSource::inline(ShaderStage::Fragment, "skybox.frag", SKYBOX_FRAGMENT_SHADER);
        let program = ShaderProgram::build(device, "skybox", &vertex, &fragment)?;

        let mut material = Material::new("skybox", program, &name_set(["InvViewProjMatrix", "CameraPosition"]));
        material.set_uniform_value("SkyboxTexture", cubemap)?;
        material.set_depth_test_function(Some(TestFunction::LessEqual));
        material.set_depth_write(false);

        let corners = [
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let vertex_array = device.create_vertex_array(&corners, &[0, 1, 2, 0, 2, 3])?;

        Ok(Self {
            material,
            vertex_array,
            drawcall: Drawcall::indexed(PrimitiveMode::Triangles, 0, 6),
        })
    }

    /// Skybox material
    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl RenderPass for SkyboxPass {
    fn name(&self) -> &str {
        "skybox"
    }

    fn render(&self, frame: &mut FrameContext<'_>) -> RenderResult<()> {
        let inverse = frame.camera.view_projection.try_inverse().unwrap_or_else(|| {
            log::warn!("View-projection matrix is singular, drawing skybox with identity");
            Mat4::identity()
        });

        self.material.apply(frame.device)?;
        let program = self.material.program();
        program.set_uniform(frame.device, "InvViewProjMatrix", inverse)?;
        program.set_uniform(frame.device, "CameraPosition", frame.camera.position)?;
        frame.device.bind_vertex_array(self.vertex_array);
        frame.stats.drawcalls += 1;
        frame.draw_unlit(&self.drawcall);
        Ok(())
    }
}
