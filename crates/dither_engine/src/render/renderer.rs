//! # Renderer
//!
//! Owns the graphics device, the shader program registry, the ordered pass
//! list and the per-frame scene state (drawcall buckets, world matrices,
//! lights, camera).
//!
//! ## Frame Lifecycle
//! 1. [`Renderer::begin_frame`] drops last frame's scene state
//! 2. scene visitors set the camera, add lights and add models
//! 3. [`Renderer::render`] fixes the camera-changed flag and the tunables for
//!    the frame, clears the framebuffer and runs every pass in order
//!
//! The camera-changed flag compares the current camera snapshot with the one
//! of the previous rendered frame. It is computed once and every pass sees
//! the same value.

use std::rc::Rc;

use crate::core::config::{DitherSettings, RendererConfig};
use crate::foundation::math::Mat4;
use crate::render::camera::{Camera, CameraSnapshot};
use crate::render::device::{ClearFlags, ClearValues, GraphicsDevice};
use crate::render::drawcall::{BucketId, DrawcallBuckets, DrawcallInfo};
use crate::render::lighting::Light;
use crate::render::material::Material;
use crate::render::passes::{FrameContext, RenderPass};
use crate::render::registry::{FrameTunables, ShaderProgramRegistry, UpdateLights, UpdateUniforms};
use crate::render::shader::ShaderProgram;
use crate::render::{RenderError, RenderResult};
use crate::scene::Model;

/// Counters of one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Passes executed
    pub passes: usize,
    /// Drawcalls prepared
    pub drawcalls: usize,
    /// Draws issued, counting every light iteration
    pub draws: usize,
}

/// Multi-pass renderer
pub struct Renderer {
    device: Box<dyn GraphicsDevice>,
    config: RendererConfig,
    registry: ShaderProgramRegistry,
    passes: Vec<Box<dyn RenderPass>>,
    buckets: DrawcallBuckets,
    world_matrices: Vec<Mat4>,
    lights: Vec<Light>,
    camera: Option<CameraSnapshot>,
    previous_camera: Option<CameraSnapshot>,
    dither: DitherSettings,
    camera_object_distance: f32,
    frame_count: u64,
}

impl Renderer {
    /// Create a renderer drawing to `device`
    pub fn new(device: Box<dyn GraphicsDevice>, config: RendererConfig) -> Self {
        let (width, height) = device.framebuffer_size();
        log::info!(
            "Renderer created ({}x{}, max {} lights, stencil test {})",
            width,
            height,
            config.max_lights,
            if config.enable_stencil_test { "on" } else { "off" }
        );
        Self {
            device,
            config,
            registry: ShaderProgramRegistry::new(),
            passes: Vec::new(),
            buckets: DrawcallBuckets::new(),
            world_matrices: Vec::new(),
            lights: Vec::new(),
            camera: None,
            previous_camera: None,
            dither: DitherSettings::default(),
            camera_object_distance: 0.0,
            frame_count: 0,
        }
    }

    /// Graphics device
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Graphics device, for building programs and uploading resources
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Shader program registry
    pub fn registry(&self) -> &ShaderProgramRegistry {
        &self.registry
    }

    /// Register a program's callbacks, replacing any earlier registration
    pub fn register_shader_program(
        &mut self,
        program: Rc<ShaderProgram>,
        update_uniforms: UpdateUniforms,
        update_lights: UpdateLights,
    ) -> bool {
        self.registry
            .register_shader_program(program, update_uniforms, update_lights)
    }

    /// Create a material for a registered program
    pub fn create_material(&self, name: impl Into<String>, program: &Rc<ShaderProgram>) -> RenderResult<Material> {
        self.registry.create_material(name, program)
    }

    /// Append a pass; passes run in the order they were added
    ///
    /// Fails when the pass draws with a program that is not registered.
    pub fn add_render_pass(&mut self, pass: Box<dyn RenderPass>) -> RenderResult<()> {
        for program in pass.required_programs() {
            if !self.registry.is_registered(program) {
                return Err(RenderError::UnregisteredProgram(format!(
                    "{:?} used by pass '{}'",
                    program,
                    pass.name()
                )));
            }
        }
        log::info!("Added render pass #{} '{}'", self.passes.len(), pass.name());
        self.passes.push(pass);
        Ok(())
    }

    /// Names of the passes in execution order
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Drop the scene state collected for the previous frame
    pub fn begin_frame(&mut self) {
        self.buckets.clear();
        self.world_matrices.clear();
        self.lights.clear();
        self.camera = None;
    }

    /// Use `camera` for the frame
    pub fn set_current_camera(&mut self, camera: &Camera) {
        self.camera = Some(camera.snapshot());
    }

    /// Camera of the frame, if one was set
    pub fn current_camera(&self) -> Option<&CameraSnapshot> {
        self.camera.as_ref()
    }

    /// Add a light; lights beyond the configured maximum are ignored
    pub fn add_light(&mut self, light: Light) {
        if self.lights.len() >= self.config.max_lights {
            log::warn!("Ignoring light beyond the limit of {}", self.config.max_lights);
            return;
        }
        self.lights.push(light);
    }

    /// Lights of the frame
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Collect a model's drawcalls into each of `buckets`
    ///
    /// Every submesh material must use a registered program.
    pub fn add_model(&mut self, model: &Model, world_matrix: Mat4, buckets: &[BucketId]) -> RenderResult<()> {
        for submesh in model.submeshes() {
            let material = model.material(submesh.material_index)?;
            if !self.registry.is_registered(material.program().id()) {
                return Err(RenderError::UnregisteredProgram(format!(
                    "'{}' used by material '{}'",
                    material.program().name(),
                    material.name()
                )));
            }
        }

        let world_matrix_index = self.world_matrices.len();
        self.world_matrices.push(world_matrix);
        for &bucket in buckets {
            for submesh in model.submeshes() {
                self.buckets.add(
                    bucket,
                    DrawcallInfo {
                        drawcall: submesh.drawcall,
                        material: Rc::clone(model.material(submesh.material_index)?),
                        world_matrix_index,
                        vertex_array: model.vertex_array(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Drawcalls collected for the frame
    pub fn buckets(&self) -> &DrawcallBuckets {
        &self.buckets
    }

    /// Check that every collected drawcall uses a registered program
    pub fn validate_scene(&self) -> RenderResult<()> {
        for (bucket, info) in self.buckets.iter() {
            let program = info.material.program();
            if !self.registry.is_registered(program.id()) {
                return Err(RenderError::UnregisteredProgram(format!(
                    "'{}' in bucket {}",
                    program.name(),
                    bucket
                )));
            }
        }
        Ok(())
    }

    /// Dither tunables
    pub fn dither_settings(&self) -> DitherSettings {
        self.dither
    }

    /// Replace the dither tunables, clamped to their ranges
    pub fn set_dither_settings(&mut self, settings: DitherSettings) {
        self.dither = settings.clamped();
    }

    /// Distance from the camera to the dithered object
    pub fn set_camera_object_distance(&mut self, distance: f32) {
        self.camera_object_distance = distance;
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the current camera differs from the last rendered one
    pub fn camera_changed(&self) -> bool {
        match (self.camera, self.previous_camera) {
            (Some(current), Some(previous)) => current != previous,
            _ => true,
        }
    }

    /// Render one frame through every pass
    ///
    /// Without a camera nothing is drawn.
    pub fn render(&mut self) -> RenderResult<FrameStats> {
        let Some(camera) = self.camera else {
            log::warn!("No camera set for frame {}, skipping render", self.frame_count);
            return Ok(FrameStats::default());
        };
        let camera_changed = self.camera_changed();
        let tunables = FrameTunables {
            dither: self.dither,
            camera_object_distance: self.camera_object_distance,
        };

        self.device.clear(
            ClearFlags::all(),
            &ClearValues {
                color: self.config.clear_color,
                depth: self.config.clear_depth,
                stencil: self.config.clear_stencil,
            },
        );

        let mut frame = FrameContext {
            device: self.device.as_mut(),
            registry: &self.registry,
            buckets: &self.buckets,
            world_matrices: &self.world_matrices,
            lights: &self.lights,
            camera: &camera,
            camera_changed,
            tunables: &tunables,
            stencil_test_enabled: self.config.enable_stencil_test,
            stats: FrameStats::default(),
        };
        for pass in &self.passes {
            pass.render(&mut frame)?;
            frame.stats.passes += 1;
        }
        let stats = frame.stats;

        self.previous_camera = Some(camera);
        self.frame_count += 1;
        log::trace!(
            "Frame {}: camera changed {}, {} passes, {} drawcalls, {} draws",
            self.frame_count,
            camera_changed,
            stats.passes,
            stats.drawcalls,
            stats.draws
        );
        Ok(stats)
    }

    /// Color buffer as RGBA8 rows
    pub fn read_color_rgba8(&self) -> Vec<u8> {
        self.device.read_color_rgba8()
    }
}
