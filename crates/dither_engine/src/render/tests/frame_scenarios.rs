//! Whole-frame scenarios: light iteration, camera gating, registration

use std::cell::Cell;

use super::*;
use crate::core::config::DitherSettings;
use crate::render::device::{
    BlendMode, DepthState, DeviceCommand, FixedFunctionState, GraphicsDevice, StencilState, TextureDesc, TextureKind,
};
use crate::render::passes::SkyboxPass;
use crate::render::registry::uniforms::TRANSFORM_UNIFORMS;
use crate::render::shader::{name_set, UniformValue};
use crate::render::{Light, RenderError};

const BEHIND_FLAG: Vec3 = Vec3::new(1.0, 0.0, -1.0);

fn draw_states(device: &SoftwareDevice, from: usize) -> Vec<FixedFunctionState> {
    device.commands()[from..]
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::Draw { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

fn uniform_pushes(device: &SoftwareDevice, from: usize, uniform: &str) -> usize {
    device.commands()[from..]
        .iter()
        .filter(|command| matches!(command, DeviceCommand::SetUniform { name, .. } if name == uniform))
        .count()
}

fn add_lights(scene: &mut Scene) {
    scene.add_node(SceneNode::light(
        "sun",
        Light::directional(Vec3::new(-0.3, -1.0, -0.3), Vec3::new(1.0, 1.0, 1.0), 3.0),
    ));
    scene.add_node(SceneNode::light(
        "lamp",
        Light::point(Vec3::new(0.0, 2.0, 1.0), Vec3::new(1.0, 0.5, 0.0), 1.0, 6.0),
    ));
}

#[test]
fn test_zero_lights_draw_each_drawcall_once() {
    let mut fixture = Fixture::new();
    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    let stats = fixture.render(&scene);

    assert_eq!(stats.passes, 2);
    assert_eq!(stats.drawcalls, 3);
    assert_eq!(stats.draws, 3);
    let states = draw_states(fixture.device(), 0);
    assert_eq!(states.len(), 3);
    assert!(states.iter().all(|state| state.blend == BlendMode::Disabled));
}

#[test]
fn test_each_light_adds_an_additive_iteration() {
    let mut fixture = Fixture::new();
    let mut scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    add_lights(&mut scene);
    let stats = fixture.render(&scene);

    assert_eq!(stats.drawcalls, 3);
    assert_eq!(stats.draws, 6);

    let states = draw_states(fixture.device(), 0);
    assert_eq!(states[0].blend, BlendMode::Disabled);
    assert_eq!(states[0].depth, DepthState::default());
    assert_eq!(states[1].blend, BlendMode::Additive);
    assert_eq!(
        states[1].depth,
        DepthState {
            function: Some(TestFunction::LessEqual),
            write: false
        }
    );
    // Overlay keeps its NotEqual test on the accumulation draw
    assert_eq!(states[5].blend, BlendMode::Additive);
    assert_eq!(states[5].depth.function, Some(TestFunction::NotEqual));
}

#[test]
fn test_lights_beyond_limit_are_ignored() {
    let mut fixture = Fixture::with_config(RendererConfig::default().with_max_lights(1));
    let mut scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    add_lights(&mut scene);
    let stats = fixture.render(&scene);

    assert_eq!(fixture.renderer.lights().len(), 1);
    assert_eq!(stats.draws, 3);
}

#[test]
fn test_array_lights_draw_once_without_blending() {
    let mut renderer = Renderer::new(Box::new(SoftwareDevice::new(16, 16)), RendererConfig::default());
    let vertex = ShaderSource::inline(ShaderStage::Vertex, "test.vert", TRANSFORM_VS);
    let fragment = ShaderSource::inline(
        ShaderStage::Fragment,
        "array.frag",
        "uniform vec3 Color;\nuniform vec3 CameraPosition;\nuniform int LightCount;\n\
         uniform vec3 LightColor[4];\nuniform vec4 LightPosition[4];\nuniform vec3 LightDirection[4];\n\
         uniform vec4 LightAttenuation[4];\nvoid main() {}\n",
    );
    let program = ShaderProgram::build(renderer.device_mut(), "array lit", &vertex, &fragment).unwrap();
    renderer.register_shader_program(Rc::clone(&program), UpdateUniforms::transform(), UpdateLights::all_at_once());
    renderer.add_render_pass(Box::new(ForwardPass::new(0))).unwrap();

    let mut material = renderer.create_material("array lit", &program).unwrap();
    material.set_uniform_value("Color", GREEN).unwrap();
    let model = Model::from_mesh(renderer.device_mut(), &Mesh::quad(2.0, 2.0), Rc::new(material)).unwrap();

    let mut scene = Scene::new();
    scene.add_node(SceneNode::camera("camera", camera()));
    scene.add_node(SceneNode::model("quad", Rc::new(model), Transform::identity()));
    add_lights(&mut scene);
    scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer)).unwrap();
    let stats = renderer.render().unwrap();

    assert_eq!(stats.drawcalls, 1);
    assert_eq!(stats.draws, 1);
    let device = software(&renderer);
    let states = draw_states(device, 0);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].blend, BlendMode::Disabled);
    assert_eq!(device.uniform_value(program.id(), "LightCount"), Some(UniformValue::Int(2)));
    assert_eq!(uniform_pushes(device, 0, "LightIndirect"), 0);
    assert_eq!(uniform_pushes(device, 0, "LightColor[1]"), 1);
}

#[test]
fn test_reregistration_replaces_uniform_callback() {
    let mut fixture = Fixture::new();
    let first_calls = Rc::new(Cell::new(0));
    let second_calls = Rc::new(Cell::new(0));

    let counter = Rc::clone(&first_calls);
    fixture.renderer.register_shader_program(
        Rc::clone(&fixture.pbr),
        UpdateUniforms::new(name_set(TRANSFORM_UNIFORMS), move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(())
        }),
        UpdateLights::per_light(),
    );
    let counter = Rc::clone(&second_calls);
    let replaced = fixture.renderer.register_shader_program(
        Rc::clone(&fixture.pbr),
        UpdateUniforms::new(name_set(TRANSFORM_UNIFORMS), move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(())
        }),
        UpdateLights::per_light(),
    );
    assert!(replaced);

    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    fixture.render(&scene);

    assert_eq!(first_calls.get(), 0);
    assert_eq!(second_calls.get(), 2);
}

#[test]
fn test_camera_uniforms_pushed_only_when_camera_moves() {
    let mut fixture = Fixture::new();
    let mut scene = fixture.flag_and_mario_scene(BEHIND_FLAG);

    fixture.render(&scene);
    assert_eq!(uniform_pushes(fixture.device(), 0, "ViewProjMatrix"), 3);
    assert_eq!(uniform_pushes(fixture.device(), 0, "CameraPosition"), 3);

    let start = fixture.device().commands().len();
    assert!(!fixture.renderer.camera_changed());
    fixture.render(&scene);
    assert_eq!(uniform_pushes(fixture.device(), start, "ViewProjMatrix"), 0);
    assert_eq!(uniform_pushes(fixture.device(), start, "CameraPosition"), 0);
    assert_eq!(uniform_pushes(fixture.device(), start, "WorldMatrix"), 3);

    scene
        .node_by_name_mut("camera")
        .and_then(SceneNode::as_camera_mut)
        .expect("scene has a camera")
        .set_position(Vec3::new(0.5, 0.0, 3.0));
    let start = fixture.device().commands().len();
    fixture.render(&scene);
    assert_eq!(uniform_pushes(fixture.device(), start, "ViewProjMatrix"), 3);
}

#[test]
fn test_shared_program_materials_do_not_bleed_state() {
    let mut fixture = Fixture::new();
    let mut plain = fixture.renderer.create_material("plain", &fixture.pbr).unwrap();
    plain.set_uniform_value("Color", GREEN).unwrap();
    let plain = Rc::new(plain);
    let plain_model = fixture.quad_model(&plain);

    let mut scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    scene.add_node(SceneNode::model("plain", plain_model, Transform::from_translation(Vec3::new(0.0, 0.0, -3.0))));
    fixture.render(&scene);

    let states = draw_states(fixture.device(), 0);
    let flag_stencil = fixture.flag_material.stencil_state().unwrap();
    let mario_stencil = fixture.mario_material.stencil_state().unwrap();

    assert_eq!(states[0].program, Some(fixture.pbr.id()));
    assert_eq!(states[1].program, Some(fixture.pbr.id()));
    assert!(states[0].stencil_enabled && states[1].stencil_enabled);
    assert_eq!(states[0].stencil, flag_stencil);
    assert_eq!(states[1].stencil, mario_stencil);
    assert!(!states[2].stencil_enabled);
    assert_eq!(states[2].stencil, StencilState::default());
    assert_eq!(states[3].program, Some(fixture.dither.id()));
    assert_eq!(states[3].stencil, fixture.overlay_material.stencil_state().unwrap());
}

#[test]
fn test_dither_amount_reaches_shader_unchanged() {
    let mut fixture = Fixture::new();
    fixture.renderer.set_dither_settings(DitherSettings {
        threshold: 3.0,
        scale: 1.0,
        amount: 0.8,
    });
    fixture.renderer.set_camera_object_distance(0.5);

    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    fixture.render(&scene);

    let dither = fixture.dither.id();
    let device = fixture.device();
    assert_eq!(device.uniform_value(dither, "MarioDitherAmount"), Some(UniformValue::Float(0.8)));
    assert_eq!(device.uniform_value(dither, "CameraObjectDistance"), Some(UniformValue::Float(0.5)));
    assert_eq!(device.uniform_value(dither, "DitherThreshold"), Some(UniformValue::Float(3.0)));
    assert_eq!(device.uniform_value(dither, "DitherScale"), Some(UniformValue::Float(1.0)));
}

#[test]
fn test_render_without_camera_draws_nothing() {
    let mut fixture = Fixture::new();
    let material = Rc::clone(&fixture.flag_material);
    let flag = fixture.quad_model(&material);
    let mut scene = Scene::new();
    scene.add_node(SceneNode::model("flag", flag, Transform::identity()));

    let stats = fixture.render(&scene);
    assert_eq!(stats, crate::render::FrameStats::default());
    assert_eq!(fixture.device().draw_count(), 0);
    assert_eq!(fixture.renderer.frame_count(), 0);
}

#[test]
fn test_unfilled_bucket_renders_nothing() {
    let mut fixture = Fixture::new();
    let material = Rc::clone(&fixture.flag_material);
    let flag = fixture.quad_model(&material);
    let mut scene = Scene::new();
    scene.add_node(SceneNode::camera("camera", camera()));
    scene.add_node(SceneNode::model("flag", flag, Transform::identity()));

    let stats = fixture.render(&scene);
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.drawcalls, 1);
    assert!(fixture.renderer.buckets().get(1).is_empty());
    assert!(fixture.renderer.validate_scene().is_ok());
}

#[test]
fn test_pass_with_unregistered_program_is_rejected() {
    let mut renderer = Renderer::new(Box::new(SoftwareDevice::new(4, 4)), RendererConfig::default());
    let vertex = ShaderSource::inline(ShaderStage::Vertex, "vs", TRANSFORM_VS);
    let fragment = ShaderSource::inline(ShaderStage::Fragment, "fs", "uniform vec3 Color;\nvoid main() {}");
    let program = ShaderProgram::build(renderer.device_mut(), "orphan", &vertex, &fragment).unwrap();
    let material = Rc::new(Material::new("orphan", program, &name_set(TRANSFORM_UNIFORMS)));

    let result = renderer.add_render_pass(Box::new(DitherOverlayPass::new(1, material, OverlayFilter::All)));
    assert!(matches!(result, Err(RenderError::UnregisteredProgram(_))));
    assert!(renderer.pass_names().is_empty());
}

#[test]
fn test_skybox_fills_only_uncovered_pixels() {
    let mut fixture = Fixture::new();
    let cubemap = fixture
        .renderer
        .device_mut()
        .create_texture(&TextureDesc {
            kind: TextureKind::Cubemap,
            width: 1,
            height: 1,
            pixels: vec![[255, 255, 0, 255]; 6],
        })
        .unwrap();
    let skybox = SkyboxPass::new(fixture.renderer.device_mut(), cubemap).unwrap();
    fixture.renderer.add_render_pass(Box::new(skybox)).unwrap();
    assert_eq!(fixture.renderer.pass_names(), vec!["forward", "dither-overlay", "skybox"]);

    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    let stats = fixture.render(&scene);

    assert_eq!(stats.passes, 3);
    assert_eq!(stats.drawcalls, 4);
    let device = fixture.device();
    assert_eq!(device.color_at(0, 0), [1.0, 1.0, 0.0, 1.0]);
    assert_eq!(device.color_at(15, 15), [1.0, 1.0, 0.0, 1.0]);
    assert_eq!(device.color_at(9, 7), [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(device.color_at(6, 7), [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_stencil_switch_disables_stencil_for_every_draw() {
    let mut fixture = Fixture::with_config(RendererConfig::default().with_stencil_test(false));
    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    fixture.render(&scene);

    let states = draw_states(fixture.device(), 0);
    assert_eq!(states.len(), 3);
    assert!(states.iter().all(|state| !state.stencil_enabled));
    let (width, height) = fixture.device().framebuffer_size();
    assert!((0..height).all(|y| (0..width).all(|x| fixture.device().stencil_at(x, y) == 0)));
}
