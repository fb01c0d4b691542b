//! Dither viewer application
//!
//! Builds the flag/character scene, owns the renderer and drives the frame
//! loop: camera flight, scene collection, rendering, debug UI and capture.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::rc::Rc;

use dither_engine::core::{DitherSettings, ViewerConfig};
use dither_engine::foundation::math::{Transform, Vec3};
use dither_engine::render::device::{
    GraphicsDevice, SoftwareDevice, StencilOperation, TestFunction, TextureDesc, TextureId, TextureKind,
};
use dither_engine::render::registry::{DitherUniforms, UpdateLights, UpdateUniforms};
use dither_engine::render::shader::{ShaderLoader, ShaderProgram, ShaderSource, ShaderStage};
use dither_engine::render::{
    Camera, DitherOverlayPass, ForwardPass, FrameStats, Light, Material, OverlayFilter, Renderer, SkyboxPass,
};
use dither_engine::scene::{GuiSceneVisitor, Mesh, Model, RendererSceneVisitor, Scene, SceneNode};
use dither_engine::ui;

use crate::controller::FlybyController;
use crate::error::{ViewerError, ViewerResult};
use crate::scripted_ui::ScriptedUi;

const CAMERA_NODE: &str = "camera";
const FLAG_NODE: &str = "flag";

/// Bucket drawn by the forward pass
const OPAQUE_BUCKET: u32 = 0;
/// Bucket drawn again by the dither overlay pass
const OVERLAY_BUCKET: u32 = 1;

const SKY_FACE_SIZE: u32 = 8;

/// Programs of the demo
struct Programs {
    pbr: Rc<ShaderProgram>,
    flag_dither: Rc<ShaderProgram>,
    mario_dither: Rc<ShaderProgram>,
}

/// Materials of the demo
struct Materials {
    environment: Rc<Material>,
    flag: Rc<Material>,
    mario: Rc<Material>,
    mario_dither: Rc<Material>,
}

/// Flag and character dither transition demo
pub struct DitherViewerApp {
    config: ViewerConfig,
    renderer: Renderer,
    scene: Scene,
    controller: FlybyController,
    ui: ScriptedUi,
}

impl DitherViewerApp {
    /// Build the renderer, shaders, materials, passes and scene
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        let device = SoftwareDevice::new(config.window.width, config.window.height);
        let mut renderer = Renderer::new(Box::new(device), config.renderer.clone());
        renderer.set_dither_settings(config.dither);

        let programs = Self::load_programs(&mut renderer, &config.output.shader_dir)?;
        let environment_map = renderer.device_mut().create_texture(&procedural_sky(SKY_FACE_SIZE))?;
        let materials = Self::create_materials(&renderer, &programs, environment_map)?;

        renderer.add_render_pass(Box::new(ForwardPass::new(OPAQUE_BUCKET)))?;
        renderer.add_render_pass(Box::new(DitherOverlayPass::new(
            OVERLAY_BUCKET,
            Rc::clone(&materials.mario_dither),
            OverlayFilter::SourceMaterial(materials.mario.name().to_string()),
        )))?;
        let skybox = SkyboxPass::new(renderer.device_mut(), environment_map)?;
        renderer.add_render_pass(Box::new(skybox))?;
        log::info!("Render passes: {:?}", renderer.pass_names());

        let scene = Self::build_scene(&mut renderer, &config, &materials)?;
        scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer))?;
        renderer.validate_scene()?;

        let start = scene
            .node_by_name(CAMERA_NODE)
            .map(|node| node.transform.translation)
            .ok_or_else(|| ViewerError::MissingNode(CAMERA_NODE.to_string()))?;

        Ok(Self {
            controller: FlybyController::demo_path(start, Vec3::zeros()),
            ui: ScriptedUi::new()
                .with_edit(60, "Dither Threshold", 5.0)
                .with_edit(90, "Mario Dither Amount", 0.4),
            config,
            renderer,
            scene,
        })
    }

    fn load_programs(renderer: &mut Renderer, shader_dir: &str) -> ViewerResult<Programs> {
        let vertex = ShaderLoader::new(ShaderStage::Vertex)
            .with_search_dir(shader_dir)
            .load(&["version.glsl", "transform.vert"])?;
        let fragment = ShaderLoader::new(ShaderStage::Fragment).with_search_dir(shader_dir);
        let pbr_source = fragment.load(&["version.glsl", "lighting_array.glsl", "pbr.frag"])?;
        let flag_source = fragment.load(&["version.glsl", "lighting.glsl", "dither.glsl", "flag_dither.frag"])?;
        let mario_source = fragment.load(&["version.glsl", "lighting.glsl", "dither.glsl", "mario_dither.frag"])?;

        let build = |renderer: &mut Renderer, name: &str, source: &ShaderSource| {
            ShaderProgram::build(renderer.device_mut(), name, &vertex, source)
        };
        let programs = Programs {
            pbr: build(renderer, "pbr", &pbr_source)?,
            flag_dither: build(renderer, "flag dither", &flag_source)?,
            mario_dither: build(renderer, "mario dither", &mario_source)?,
        };

        renderer.register_shader_program(
            Rc::clone(&programs.pbr),
            UpdateUniforms::transform(),
            UpdateLights::all_at_once(),
        );
        renderer.register_shader_program(
            Rc::clone(&programs.flag_dither),
            UpdateUniforms::dithered(DitherUniforms::Transition),
            UpdateLights::per_light(),
        );
        renderer.register_shader_program(
            Rc::clone(&programs.mario_dither),
            UpdateUniforms::dithered(DitherUniforms::TransitionWithAmount),
            UpdateLights::per_light(),
        );
        Ok(programs)
    }

    fn create_materials(renderer: &Renderer, programs: &Programs, environment_map: TextureId) -> ViewerResult<Materials> {
        let mut pbr = renderer.create_material("pbr", &programs.pbr)?;
        pbr.set_stencil_test_function(TestFunction::Always, 1, 0xFF);
        pbr.set_uniform_value("EnvironmentTexture", environment_map)?;

        let mut environment = pbr.duplicate("environment");
        environment.set_uniform_value("Color", Vec3::new(0.45, 0.42, 0.38))?;

        // Flag marks its pixels, the character clears the ones it wins
        let mut flag = renderer.create_material("flag dither", &programs.flag_dither)?;
        flag.set_stencil_test_function(TestFunction::Always, 1, 0xFF);
        flag.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Replace);
        flag.set_uniform_value("EnvironmentTexture", environment_map)?;
        flag.set_uniform_value("Color", Vec3::new(0.8, 0.1, 0.1))?;

        let mut mario = pbr.duplicate("mario pbr");
        mario.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Zero);
        mario.set_uniform_value("Color", Vec3::new(0.2, 0.3, 0.9))?;

        let mut mario_dither = renderer.create_material("mario dither", &programs.mario_dither)?;
        mario_dither.set_depth_test_function(Some(TestFunction::NotEqual));
        mario_dither.set_stencil_test_function(TestFunction::Equal, 1, 0xFF);
        mario_dither.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Keep);
        mario_dither.set_uniform_value("EnvironmentTexture", environment_map)?;
        mario_dither.set_uniform_value("Color", Vec3::new(0.2, 0.3, 0.9))?;

        Ok(Materials {
            environment: Rc::new(environment),
            flag: Rc::new(flag),
            mario: Rc::new(mario),
            mario_dither: Rc::new(mario_dither),
        })
    }

    fn build_scene(renderer: &mut Renderer, config: &ViewerConfig, materials: &Materials) -> ViewerResult<Scene> {
        let device = renderer.device_mut();
        let ground = Rc::new(Model::from_mesh(device, &Mesh::quad(20.0, 20.0), Rc::clone(&materials.environment))?);
        let flag = Rc::new(Model::from_mesh(device, &Mesh::quad(1.0, 0.6), Rc::clone(&materials.flag))?);
        let mario = Rc::new(Model::from_mesh(device, &Mesh::cube(0.8), Rc::clone(&materials.mario))?);

        let mut camera = Camera::perspective(Vec3::new(-1.0, 1.0, 1.0), 45.0, config.window.aspect_ratio(), 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));

        let mut ground_transform = Transform::from_translation(Vec3::new(0.0, -0.5, 0.0));
        ground_transform.set_rotation_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0));

        let mut scene = Scene::new();
        scene.add_node(SceneNode::camera(CAMERA_NODE, camera));
        scene.add_node(SceneNode::light(
            "sun",
            Light::directional(Vec3::new(-0.3, -1.0, -0.3), Vec3::new(1.0, 1.0, 1.0), 3.0),
        ));
        scene.add_node(SceneNode::model("environment", ground, ground_transform));
        scene.add_node(SceneNode::model(FLAG_NODE, flag, Transform::from_translation(Vec3::new(0.0, 0.5, 0.0))));
        scene.add_node(
            SceneNode::model("mario", mario, Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)))
                .with_buckets(vec![OPAQUE_BUCKET, OVERLAY_BUCKET]),
        );
        log::info!("Scene built with {} nodes", scene.len());
        Ok(scene)
    }

    /// Render the configured number of frames
    pub fn run(&mut self) -> ViewerResult<()> {
        let frame_count = self.config.output.frame_count;
        let mut total = FrameStats::default();
        for _ in 0..frame_count {
            let stats = self.step()?;
            total.drawcalls += stats.drawcalls;
            total.draws += stats.draws;
        }
        log::info!(
            "Rendered {} frames: {} drawcalls, {} draws",
            self.renderer().frame_count(),
            total.drawcalls,
            total.draws
        );
        Ok(())
    }

    /// Advance the camera and render one frame
    pub fn step(&mut self) -> ViewerResult<FrameStats> {
        let flag_position = self.flag_position()?;
        let camera = self
            .scene
            .node_by_name_mut(CAMERA_NODE)
            .and_then(SceneNode::as_camera_mut)
            .ok_or_else(|| ViewerError::MissingNode(CAMERA_NODE.to_string()))?;
        self.controller.update(camera);
        let distance = camera.distance_to(flag_position);

        self.scene.accept_visitor(&mut RendererSceneVisitor::new(&mut self.renderer))?;
        self.renderer.set_camera_object_distance(distance);
        let stats = self.renderer.render()?;
        log::debug!(
            "Frame {}: flag distance {:.2}, {} draws",
            self.renderer.frame_count(),
            distance,
            stats.draws
        );

        self.draw_gui()?;
        self.export_frame()?;
        Ok(stats)
    }

    fn flag_position(&self) -> ViewerResult<Vec3> {
        self.scene
            .node_by_name(FLAG_NODE)
            .map(|node| node.transform.translation)
            .ok_or_else(|| ViewerError::MissingNode(FLAG_NODE.to_string()))
    }

    fn draw_gui(&mut self) -> ViewerResult<()> {
        let scene = &self.scene;
        let mut settings = self.renderer.dither_settings();
        let (listed, changed) = ui::frame(&mut self.ui, |ui| {
            let listed = ui::window(ui, "Scene", |ui| scene.accept_visitor(&mut GuiSceneVisitor::new(ui)));
            let changed = ui::window(ui, DitherSettings::WINDOW_NAME, |ui| settings.draw_gui(ui));
            (listed, changed.unwrap_or(false))
        });
        listed.transpose()?;
        log::trace!("UI frame {} drew {} lines", self.ui.frame(), self.ui.lines().len());
        if changed {
            log::info!("Dither settings now {:?}", settings);
            self.renderer.set_dither_settings(settings);
        }
        Ok(())
    }

    fn export_frame(&self) -> ViewerResult<()> {
        let Some(dir) = &self.config.output.frame_dir else {
            return Ok(());
        };
        let frame = self.renderer.frame_count();
        if frame % u64::from(self.config.output.capture_interval) != 0 {
            return Ok(());
        }

        let (width, height) = self.renderer.device().framebuffer_size();
        let pixels = self.renderer.read_color_rgba8();
        let actual = pixels.len();
        let image = image::RgbaImage::from_raw(width, height, pixels).ok_or(ViewerError::Readback {
            width,
            height,
            actual,
        })?;

        std::fs::create_dir_all(dir)?;
        let path = Path::new(dir).join(format!("frame_{:04}.png", frame));
        image.save(&path)?;
        log::info!("Captured {}", path.display());
        Ok(())
    }

    /// Renderer driven by the app
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

/// Six-face sky gradient, light at the zenith and dark below the horizon
fn procedural_sky(size: u32) -> TextureDesc {
    const ZENITH: [f32; 3] = [0.35, 0.55, 0.95];
    const HORIZON: [f32; 3] = [0.85, 0.9, 1.0];
    const GROUND: [f32; 3] = [0.3, 0.25, 0.2];

    let texel = |c: [f32; 3]| c.map(|v| (v * 255.0).round() as u8);
    let mix = |a: [f32; 3], b: [f32; 3], t: f32| [0, 1, 2].map(|i| a[i] + (b[i] - a[i]) * t);

    let mut pixels = Vec::with_capacity((size * size * 6) as usize);
    // +X, -X, +Y, -Y, +Z, -Z
    for face in 0..6 {
        for row in 0..size {
            let t = (row as f32 + 0.5) / size as f32;
            let color = match face {
                2 => ZENITH,
                3 => GROUND,
                _ if t < 0.5 => mix(ZENITH, HORIZON, t * 2.0),
                _ => mix(HORIZON, GROUND, (t - 0.5) * 2.0),
            };
            let [r, g, b] = texel(color);
            pixels.extend(std::iter::repeat([r, g, b, 255]).take(size as usize));
        }
    }

    TextureDesc {
        kind: TextureKind::Cubemap,
        width: size,
        height: size,
        pixels,
    }
}
