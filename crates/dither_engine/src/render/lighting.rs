//! Lights and the render states of multi-pass lighting
//!
//! Programs lit one light at a time re-issue each draw once per light. The
//! first iteration draws normally; later iterations accumulate on top of it
//! with additive blending and a depth test that accepts the surface already
//! written.

use crate::foundation::math::{Vec3, Vec4};
use crate::render::device::{BlendMode, DepthState, GraphicsDevice, TestFunction};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// World position (point lights)
    pub position: Vec3,
    /// Normalized direction the light travels (directional lights)
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Distance attenuation `(range start, range end, unused, unused)`
    pub attenuation: Vec4,
}

impl Light {
    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: direction.normalize(),
            color,
            intensity,
            attenuation: Vec4::zeros(),
        }
    }

    /// Create a point light fading out over `range`
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            color,
            intensity,
            attenuation: Vec4::new(0.0, range, 0.0, 0.0),
        }
    }

    /// Color scaled by intensity
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// Position with `w = 1` for point lights and `w = 0` for directional lights
    pub fn homogeneous_position(&self) -> Vec4 {
        match self.light_type {
            LightType::Directional => Vec4::new(self.direction.x, self.direction.y, self.direction.z, 0.0),
            LightType::Point => Vec4::new(self.position.x, self.position.y, self.position.z, 1.0),
        }
    }
}

/// Depth state used by additional light iterations
pub fn accumulation_depth_state(base: DepthState) -> DepthState {
    let function = match base.function {
        Some(TestFunction::Less) => Some(TestFunction::LessEqual),
        other => other,
    };
    DepthState { function, write: false }
}

/// Set blend and depth state for a lighting iteration
///
/// The first iteration restores the material's own state; later ones blend
/// additively on top of it.
pub fn set_lighting_render_states(device: &mut dyn GraphicsDevice, base: DepthState, base_blend: BlendMode, first: bool) {
    if first {
        device.set_depth_state(base);
        device.set_blend_mode(base_blend);
    } else {
        device.set_depth_state(accumulation_depth_state(base));
        device.set_blend_mode(BlendMode::Additive);
    }
}
