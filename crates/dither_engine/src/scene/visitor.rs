//! # Scene Visitors
//!
//! Double dispatch over node kinds. [`RendererSceneVisitor`] rebuilds the
//! renderer's per-frame state (camera, lights, drawcall buckets);
//! [`GuiSceneVisitor`] reflects nodes into the debug UI.

use crate::render::renderer::Renderer;
use crate::render::RenderResult;
use crate::scene::node::{SceneCamera, SceneLight, SceneModel, SceneNode};
use crate::ui::DebugUi;

/// Callbacks per node kind; unimplemented kinds are skipped
pub trait SceneVisitor {
    /// Visit a camera node
    fn visit_camera(&mut self, _node: &SceneNode, _camera: &SceneCamera) -> RenderResult<()> {
        Ok(())
    }

    /// Visit a light node
    fn visit_light(&mut self, _node: &SceneNode, _light: &SceneLight) -> RenderResult<()> {
        Ok(())
    }

    /// Visit a model node
    fn visit_model(&mut self, _node: &SceneNode, _model: &SceneModel) -> RenderResult<()> {
        Ok(())
    }
}

/// Feeds a scene into the renderer for one frame
///
/// Creating the visitor starts a new renderer frame. The first camera
/// visited becomes the frame camera.
pub struct RendererSceneVisitor<'a> {
    renderer: &'a mut Renderer,
}

impl<'a> RendererSceneVisitor<'a> {
    /// Start a frame on `renderer`
    pub fn new(renderer: &'a mut Renderer) -> Self {
        renderer.begin_frame();
        Self { renderer }
    }
}

impl SceneVisitor for RendererSceneVisitor<'_> {
    fn visit_camera(&mut self, node: &SceneNode, camera: &SceneCamera) -> RenderResult<()> {
        if self.renderer.current_camera().is_none() {
            log::trace!("Frame camera: '{}'", node.name);
            self.renderer.set_current_camera(&camera.camera);
        }
        Ok(())
    }

    fn visit_light(&mut self, node: &SceneNode, light: &SceneLight) -> RenderResult<()> {
        self.renderer.add_light(light.world_light(&node.transform));
        Ok(())
    }

    fn visit_model(&mut self, node: &SceneNode, model: &SceneModel) -> RenderResult<()> {
        self.renderer
            .add_model(&model.model, node.transform.to_matrix(), &model.buckets)
    }
}

/// Lists scene nodes in the debug UI
pub struct GuiSceneVisitor<'a, U: DebugUi + ?Sized> {
    ui: &'a mut U,
}

impl<'a, U: DebugUi + ?Sized> GuiSceneVisitor<'a, U> {
    /// Draw into `ui`; the caller opens the window
    pub fn new(ui: &'a mut U) -> Self {
        Self { ui }
    }
}

impl<U: DebugUi + ?Sized> SceneVisitor for GuiSceneVisitor<'_, U> {
    fn visit_camera(&mut self, node: &SceneNode, camera: &SceneCamera) -> RenderResult<()> {
        let p = camera.camera.position;
        self.ui
            .label(&format!("Camera '{}' at ({:.2}, {:.2}, {:.2})", node.name, p.x, p.y, p.z));
        Ok(())
    }

    fn visit_light(&mut self, node: &SceneNode, light: &SceneLight) -> RenderResult<()> {
        let d = light.light.direction;
        self.ui.label(&format!(
            "Light '{}' {:?} intensity {:.2} direction ({:.2}, {:.2}, {:.2})",
            node.name, light.light.light_type, light.light.intensity, d.x, d.y, d.z
        ));
        Ok(())
    }

    fn visit_model(&mut self, node: &SceneNode, model: &SceneModel) -> RenderResult<()> {
        let t = node.transform.translation;
        self.ui.label(&format!(
            "Model '{}' at ({:.2}, {:.2}, {:.2}) buckets {:?}",
            node.name, t.x, t.y, t.z, model.buckets
        ));
        Ok(())
    }
}
