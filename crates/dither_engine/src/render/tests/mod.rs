//! Frame-level tests driven through the software device
//!
//! The fixture mirrors the dither demo: a base PBR-like program, a dithered
//! overlay program, a flag material writing stencil 1, a character material
//! zeroing it, and an overlay material reading it.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::core::config::RendererConfig;
use crate::foundation::math::{Transform, Vec3};
use crate::render::device::{SoftwareDevice, StencilOperation, TestFunction};
use crate::render::passes::{DitherOverlayPass, ForwardPass, OverlayFilter};
use crate::render::registry::{DitherUniforms, UpdateLights, UpdateUniforms};
use crate::render::shader::{ShaderProgram, ShaderSource, ShaderStage};
use crate::render::{Camera, Material, Renderer};
use crate::scene::{Mesh, Model, RendererSceneVisitor, Scene, SceneNode};

mod frame_scenarios;
mod stencil_choreography;

const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);

const TRANSFORM_VS: &str = "uniform mat4 WorldMatrix;\nuniform mat4 ViewProjMatrix;\nvoid main() {}\n";
const LIT_FS: &str = "uniform vec3 Color;\nuniform vec3 CameraPosition;\nuniform int LightIndirect;\n\
                      uniform vec3 LightColor;\nuniform vec4 LightPosition;\nuniform vec3 LightDirection;\n\
                      uniform vec4 LightAttenuation;\n";
const DITHER_FS: &str = "uniform float DitherThreshold;\nuniform float DitherScale;\n\
                         uniform float CameraObjectDistance;\nuniform float MarioDitherAmount;\n";

struct Fixture {
    renderer: Renderer,
    pbr: Rc<ShaderProgram>,
    dither: Rc<ShaderProgram>,
    flag_material: Rc<Material>,
    mario_material: Rc<Material>,
    overlay_material: Rc<Material>,
}

impl Fixture {
    fn new() -> Self {
        Self::build(RendererConfig::default(), |_, _| character_filter())
    }

    fn with_config(config: RendererConfig) -> Self {
        Self::build(config, |_, _| character_filter())
    }

    /// `filter` receives the base and the overlay program
    fn with_overlay_filter(filter: impl FnOnce(&ShaderProgram, &ShaderProgram) -> OverlayFilter) -> Self {
        Self::build(RendererConfig::default(), filter)
    }

    fn build(config: RendererConfig, filter: impl FnOnce(&ShaderProgram, &ShaderProgram) -> OverlayFilter) -> Self {
        let mut renderer = Renderer::new(Box::new(SoftwareDevice::new(16, 16)), config);

        let vertex = ShaderSource::inline(ShaderStage::Vertex, "test.vert", TRANSFORM_VS);
        let pbr_fragment = ShaderSource::inline(ShaderStage::Fragment, "pbr.frag", format!("{}void main() {{}}\n", LIT_FS));
        let dither_fragment = ShaderSource::inline(
            ShaderStage::Fragment,
            "dither.frag",
            format!("{}{}void main() {{}}\n", LIT_FS, DITHER_FS),
        );
        let pbr = ShaderProgram::build(renderer.device_mut(), "pbr", &vertex, &pbr_fragment).unwrap();
        let dither = ShaderProgram::build(renderer.device_mut(), "mario dither", &vertex, &dither_fragment).unwrap();

        renderer.register_shader_program(Rc::clone(&pbr), UpdateUniforms::transform(), UpdateLights::per_light());
        renderer.register_shader_program(
            Rc::clone(&dither),
            UpdateUniforms::dithered(DitherUniforms::TransitionWithAmount),
            UpdateLights::per_light(),
        );

        let mut base = renderer.create_material("pbr", &pbr).unwrap();
        base.set_stencil_test_function(TestFunction::Always, 1, 0xFF);

        let mut flag = base.duplicate("flag");
        flag.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Replace);
        flag.set_uniform_value("Color", RED).unwrap();

        let mut mario = base.duplicate("mario pbr");
        mario.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Zero);
        mario.set_uniform_value("Color", GREEN).unwrap();

        let mut overlay = renderer.create_material("mario dither", &dither).unwrap();
        overlay.set_depth_test_function(Some(TestFunction::NotEqual));
        overlay.set_stencil_test_function(TestFunction::Equal, 1, 0xFF);
        overlay.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Keep);
        overlay.set_uniform_value("Color", BLUE).unwrap();
        let overlay = Rc::new(overlay);

        renderer.add_render_pass(Box::new(ForwardPass::new(0))).unwrap();
        renderer
            .add_render_pass(Box::new(
                DitherOverlayPass::new(1, Rc::clone(&overlay), filter(&pbr, &dither)),
            ))
            .unwrap();

        Self {
            renderer,
            pbr,
            dither,
            flag_material: Rc::new(flag),
            mario_material: Rc::new(mario),
            overlay_material: overlay,
        }
    }

    fn quad_model(&mut self, material: &Rc<Material>) -> Rc<Model> {
        let model = Model::from_mesh(self.renderer.device_mut(), &Mesh::quad(2.0, 2.0), Rc::clone(material)).unwrap();
        Rc::new(model)
    }

    /// Flag at the origin in bucket 0, character behind it to the right in buckets 0 and 1
    fn flag_and_mario_scene(&mut self, mario_offset: Vec3) -> Scene {
        let (flag_material, mario_material) = (Rc::clone(&self.flag_material), Rc::clone(&self.mario_material));
        let flag = self.quad_model(&flag_material);
        let mario = self.quad_model(&mario_material);

        let mut scene = Scene::new();
        scene.add_node(SceneNode::camera("camera", camera()));
        scene.add_node(SceneNode::model("flag", flag, Transform::identity()));
        scene.add_node(
            SceneNode::model("mario", mario, Transform::from_translation(mario_offset)).with_buckets(vec![0, 1]),
        );
        scene
    }

    fn render(&mut self, scene: &Scene) -> crate::render::FrameStats {
        scene.accept_visitor(&mut RendererSceneVisitor::new(&mut self.renderer)).unwrap();
        self.renderer.render().unwrap()
    }

    fn device(&self) -> &SoftwareDevice {
        software(&self.renderer)
    }
}

/// Overlay only the character's own drawcalls
fn character_filter() -> OverlayFilter {
    OverlayFilter::SourceMaterial("mario pbr".to_string())
}

fn camera() -> Camera {
    Camera::perspective(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0, 0.1, 10.0)
}

fn software(renderer: &Renderer) -> &SoftwareDevice {
    renderer
        .device()
        .as_any()
        .downcast_ref::<SoftwareDevice>()
        .expect("renderer drives a software device")
}

fn pixels_with_color(device: &SoftwareDevice, color: Vec3) -> BTreeSet<(u32, u32)> {
    let (width, height) = crate::render::device::GraphicsDevice::framebuffer_size(device);
    let mut pixels = BTreeSet::new();
    for y in 0..height {
        for x in 0..width {
            let c = device.color_at(x, y);
            if c[0] == color.x && c[1] == color.y && c[2] == color.z {
                pixels.insert((x, y));
            }
        }
    }
    pixels
}
