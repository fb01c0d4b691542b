//! Scene management
//!
//! A flat scene of named camera, light and model nodes. Each frame a
//! [`RendererSceneVisitor`] walks the scene and rebuilds the renderer's
//! camera, light list and drawcall buckets; a [`GuiSceneVisitor`] can walk
//! the same scene to list it in the debug UI.

mod model;
mod node;
mod scene_graph;
mod visitor;

pub use model::{Mesh, Model, Submesh};
pub use node::{SceneCamera, SceneLight, SceneModel, SceneNode, SceneNodeKind};
pub use scene_graph::{NodeKey, Scene};
pub use visitor::{GuiSceneVisitor, RendererSceneVisitor, SceneVisitor};

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::config::RendererConfig;
    use crate::foundation::math::{Transform, Vec3};
    use crate::render::device::SoftwareDevice;
    use crate::render::registry::{UpdateLights, UpdateUniforms};
    use crate::render::shader::{ShaderProgram, ShaderSource, ShaderStage};
    use crate::render::{Camera, Light, RenderError, Renderer};

    fn renderer_with_material() -> (Renderer, Rc<crate::render::Material>) {
        let mut renderer = Renderer::new(Box::new(SoftwareDevice::new(8, 8)), RendererConfig::default());
        let vs = ShaderSource::inline(ShaderStage::Vertex, "vs", "uniform mat4 WorldMatrix;\nvoid main() {}");
        let fs = ShaderSource::inline(ShaderStage::Fragment, "fs", "void main() {}");
        let program = ShaderProgram::build(renderer.device_mut(), "plain", &vs, &fs).unwrap();
        renderer.register_shader_program(Rc::clone(&program), UpdateUniforms::transform(), UpdateLights::none());
        let material = Rc::new(renderer.create_material("plain", &program).unwrap());
        (renderer, material)
    }

    #[test]
    fn test_renderer_visitor_collects_frame_state() {
        let (mut renderer, material) = renderer_with_material();
        let model = Rc::new(Model::from_mesh(renderer.device_mut(), &Mesh::cube(1.0), material).unwrap());

        let mut scene = Scene::new();
        scene.add_node(SceneNode::camera("camera", Camera::default()));
        scene.add_node(SceneNode::camera("second camera", Camera::perspective(Vec3::new(5.0, 0.0, 0.0), 45.0, 1.0, 0.1, 10.0)));
        scene.add_node(SceneNode::light("sun", Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0)));
        scene.add_node(SceneNode::model("ground", Rc::clone(&model), Transform::identity()));
        scene.add_node(SceneNode::model("mario", model, Transform::identity()).with_buckets(vec![0, 1]));

        scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer)).unwrap();

        assert_eq!(renderer.current_camera(), Some(&Camera::default().snapshot()));
        assert_eq!(renderer.lights().len(), 1);
        assert_eq!(renderer.buckets().get(0).len(), 2);
        assert_eq!(renderer.buckets().get(1).len(), 1);
        assert_eq!(renderer.buckets().get(1)[0].world_matrix_index, 1);
    }

    #[test]
    fn test_new_frame_discards_previous_state() {
        let (mut renderer, material) = renderer_with_material();
        let model = Rc::new(Model::from_mesh(renderer.device_mut(), &Mesh::quad(1.0, 1.0), material).unwrap());
        let mut scene = Scene::new();
        let key = scene.add_node(SceneNode::model("quad", model, Transform::identity()));

        scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer)).unwrap();
        assert_eq!(renderer.buckets().len(), 1);

        scene.remove_node(key);
        scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer)).unwrap();
        assert!(renderer.buckets().is_empty());
        assert!(renderer.current_camera().is_none());
    }

    #[test]
    fn test_unregistered_model_material_is_rejected() {
        let (mut renderer, _) = renderer_with_material();
        let vs = ShaderSource::inline(ShaderStage::Vertex, "vs", "void main() {}");
        let fs = ShaderSource::inline(ShaderStage::Fragment, "fs", "uniform vec3 Color;\nvoid main() {}");
        let program = ShaderProgram::build(renderer.device_mut(), "stray", &vs, &fs).unwrap();
        let material = Rc::new(crate::render::Material::new("stray", program, &Default::default()));
        let model = Rc::new(Model::from_mesh(renderer.device_mut(), &Mesh::quad(1.0, 1.0), material).unwrap());

        let mut scene = Scene::new();
        scene.add_node(SceneNode::model("stray", model, Transform::identity()));
        let result = scene.accept_visitor(&mut RendererSceneVisitor::new(&mut renderer));
        assert!(matches!(result, Err(RenderError::UnregisteredProgram(_))));
    }

    #[test]
    fn test_point_light_follows_node_transform() {
        let mut node = SceneNode::light("lamp", Light::point(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 1.0, 4.0));
        node.transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        let SceneNodeKind::Light(light) = &node.kind else {
            panic!("expected a light node");
        };
        assert_eq!(light.world_light(&node.transform).position, Vec3::new(1.0, 2.0, 3.0));
    }
}
