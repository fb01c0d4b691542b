//! Uniform values

use std::collections::HashSet;

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::device::TextureId;

/// Set of uniform names, used for the reserved-name filter
pub type NameSet = HashSet<String>;

/// Build a [`NameSet`] from string literals
pub fn name_set<'a>(names: impl IntoIterator<Item = &'a str>) -> NameSet {
    names.into_iter().map(str::to_owned).collect()
}

/// A typed value written to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar float
    Float(f32),
    /// Scalar integer
    Int(i32),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Texture bound to a sampler
    Texture(TextureId),
}

impl UniformValue {
    /// Short name of the value kind for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Texture(_) => "sampler",
        }
    }

    /// Scalar float content, if any
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

impl From<TextureId> for UniformValue {
    fn from(v: TextureId) -> Self {
        Self::Texture(v)
    }
}
