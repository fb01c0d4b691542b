//! Scene nodes

use std::rc::Rc;

use crate::foundation::math::Transform;
use crate::render::camera::Camera;
use crate::render::drawcall::BucketId;
use crate::render::lighting::{Light, LightType};
use crate::render::RenderResult;
use crate::scene::model::Model;
use crate::scene::visitor::SceneVisitor;

/// Camera node payload
///
/// The camera carries its own position and target; the node transform is
/// not applied to it.
#[derive(Debug, Clone)]
pub struct SceneCamera {
    /// The camera
    pub camera: Camera,
}

/// Light node payload
#[derive(Debug, Clone)]
pub struct SceneLight {
    /// The light, positioned by the node transform when it is a point light
    pub light: Light,
}

impl SceneLight {
    /// Light with the node transform applied
    pub fn world_light(&self, transform: &Transform) -> Light {
        let mut light = self.light.clone();
        if light.light_type == LightType::Point {
            light.position = transform.translation;
        }
        light
    }
}

/// Model node payload
#[derive(Debug, Clone)]
pub struct SceneModel {
    /// Shared model
    pub model: Rc<Model>,
    /// Buckets the model's drawcalls are collected into
    pub buckets: Vec<BucketId>,
}

/// Node payload variants
#[derive(Debug, Clone)]
pub enum SceneNodeKind {
    /// A camera
    Camera(SceneCamera),
    /// A light
    Light(SceneLight),
    /// A renderable model
    Model(SceneModel),
}

/// Named node with a transform
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Unique name
    pub name: String,
    /// Local-to-world transform
    pub transform: Transform,
    /// Payload
    pub kind: SceneNodeKind,
}

impl SceneNode {
    /// Camera node
    pub fn camera(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_translation(camera.position),
            kind: SceneNodeKind::Camera(SceneCamera { camera }),
        }
    }

    /// Light node
    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_translation(light.position),
            kind: SceneNodeKind::Light(SceneLight { light }),
        }
    }

    /// Model node collected into bucket 0
    pub fn model(name: impl Into<String>, model: Rc<Model>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            kind: SceneNodeKind::Model(SceneModel { model, buckets: vec![0] }),
        }
    }

    /// Replace the buckets of a model node; no effect on other nodes
    #[must_use]
    pub fn with_buckets(mut self, buckets: Vec<BucketId>) -> Self {
        if let SceneNodeKind::Model(model) = &mut self.kind {
            model.buckets = buckets;
        }
        self
    }

    /// Camera payload, if this is a camera node
    pub fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            SceneNodeKind::Camera(camera) => Some(&mut camera.camera),
            _ => None,
        }
    }

    /// Light payload, if this is a light node
    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            SceneNodeKind::Light(light) => Some(&mut light.light),
            _ => None,
        }
    }

    /// Dispatch to the visitor method of this node's kind
    pub fn accept(&self, visitor: &mut dyn SceneVisitor) -> RenderResult<()> {
        match &self.kind {
            SceneNodeKind::Camera(camera) => visitor.visit_camera(self, camera),
            SceneNodeKind::Light(light) => visitor.visit_light(self, light),
            SceneNodeKind::Model(model) => visitor.visit_model(self, model),
        }
    }
}
