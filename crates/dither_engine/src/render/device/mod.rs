//! # Graphics Device Abstraction
//!
//! The lower layer the rendering core drives. A [`GraphicsDevice`] is a
//! fixed-function state machine in the OpenGL mould: programs are compiled
//! once, uniforms are written per program, and depth, stencil and blend state
//! stay bound until the next call changes them.
//!
//! Binding calls are infallible at this layer; only resource creation and
//! program compilation report errors.

use std::any::Any;

use bitflags::bitflags;

use crate::foundation::math::Vec3;
use crate::render::drawcall::Drawcall;
use crate::render::shader::{ShaderSource, UniformValue};
use crate::render::RenderResult;

pub mod software;

pub use software::{DeviceCommand, FixedFunctionState, SoftwareDevice};

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// Handle to a texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Location of an active uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Comparison used by the depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestFunction {
    /// Never passes
    Never,
    /// Passes if incoming < stored
    Less,
    /// Passes if incoming == stored
    Equal,
    /// Passes if incoming <= stored
    LessEqual,
    /// Passes if incoming > stored
    Greater,
    /// Passes if incoming != stored
    NotEqual,
    /// Passes if incoming >= stored
    GreaterEqual,
    /// Always passes
    Always,
}

impl TestFunction {
    /// Evaluate the comparison with the incoming value on the left
    pub fn passes<T: PartialOrd>(self, incoming: T, stored: T) -> bool {
        match self {
            Self::Never => false,
            Self::Less => incoming < stored,
            Self::Equal => incoming == stored,
            Self::LessEqual => incoming <= stored,
            Self::Greater => incoming > stored,
            Self::NotEqual => incoming != stored,
            Self::GreaterEqual => incoming >= stored,
            Self::Always => true,
        }
    }
}

/// Action taken on the stored stencil value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    /// Keep the current value
    Keep,
    /// Set to zero
    Zero,
    /// Set to the reference value
    Replace,
    /// Increment, clamping at the maximum
    Increment,
    /// Increment, wrapping to zero
    IncrementWrap,
    /// Decrement, clamping at zero
    Decrement,
    /// Decrement, wrapping to the maximum
    DecrementWrap,
    /// Bitwise invert
    Invert,
}

impl StencilOperation {
    /// Compute the new stencil value before the write mask is applied
    pub fn apply(self, current: u8, reference: u8) -> u8 {
        match self {
            Self::Keep => current,
            Self::Zero => 0,
            Self::Replace => reference,
            Self::Increment => current.saturating_add(1),
            Self::IncrementWrap => current.wrapping_add(1),
            Self::Decrement => current.saturating_sub(1),
            Self::DecrementWrap => current.wrapping_sub(1),
            Self::Invert => !current,
        }
    }
}

/// Depth test and depth write state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    /// Test function, `None` disables the depth test (and depth writes)
    pub function: Option<TestFunction>,
    /// Whether passing fragments write their depth
    pub write: bool,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            function: Some(TestFunction::Less),
            write: true,
        }
    }
}

/// Stencil test function, masks and operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Comparison between the masked reference and the masked stored value
    pub function: TestFunction,
    /// Reference value
    pub reference: u8,
    /// Mask applied to both sides of the comparison
    pub read_mask: u8,
    /// Bits of the stored value that operations may change
    pub write_mask: u8,
    /// Operation when the stencil test fails
    pub stencil_fail: StencilOperation,
    /// Operation when the stencil test passes and the depth test fails
    pub depth_fail: StencilOperation,
    /// Operation when both tests pass
    pub depth_pass: StencilOperation,
}

impl StencilState {
    /// Evaluate the stencil test against a stored value
    pub fn test(&self, stored: u8) -> bool {
        self.function.passes(self.reference & self.read_mask, stored & self.read_mask)
    }

    /// Apply an operation to a stored value honoring the write mask
    pub fn write(&self, operation: StencilOperation, stored: u8) -> u8 {
        let updated = operation.apply(stored, self.reference);
        (stored & !self.write_mask) | (updated & self.write_mask)
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            function: TestFunction::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            depth_pass: StencilOperation::Keep,
        }
    }
}

/// Color blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Fragments overwrite the framebuffer
    #[default]
    Disabled,
    /// `dst = src + dst`, used to accumulate additional lights
    Additive,
    /// `dst = src * a + dst * (1 - a)`
    Alpha,
}

/// Primitive assembly mode of a drawcall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Points
    Points,
}

bitflags! {
    /// Buffers selected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Color buffer
        const COLOR = 0b001;
        /// Depth buffer
        const DEPTH = 0b010;
        /// Stencil buffer
        const STENCIL = 0b100;
    }
}

/// Values written by a clear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    /// RGBA color
    pub color: [f32; 4],
    /// Depth value
    pub depth: f32,
    /// Stencil value
    pub stencil: u8,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// GLSL-level type of an active uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `float`
    Float,
    /// `int`, `uint` or `bool`
    Int,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
    /// `sampler2D`
    Sampler2D,
    /// `samplerCube`
    SamplerCube,
}

impl UniformType {
    /// Parse a GLSL type keyword
    pub fn from_glsl(keyword: &str) -> Option<Self> {
        match keyword {
            "float" => Some(Self::Float),
            "int" | "uint" | "bool" => Some(Self::Int),
            "vec2" => Some(Self::Vec2),
            "vec3" => Some(Self::Vec3),
            "vec4" => Some(Self::Vec4),
            "mat4" => Some(Self::Mat4),
            "sampler2D" => Some(Self::Sampler2D),
            "samplerCube" => Some(Self::SamplerCube),
            _ => None,
        }
    }

    /// Whether a value of this shape can be written to the uniform
    pub fn accepts(self, value: &UniformValue) -> bool {
        matches!(
            (self, value),
            (Self::Float, UniformValue::Float(_))
                | (Self::Int, UniformValue::Int(_))
                | (Self::Vec2, UniformValue::Vec2(_))
                | (Self::Vec3, UniformValue::Vec3(_))
                | (Self::Vec4, UniformValue::Vec4(_))
                | (Self::Mat4, UniformValue::Mat4(_))
                | (Self::Sampler2D | Self::SamplerCube, UniformValue::Texture(_))
        )
    }
}

/// An active uniform reported by program linking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    /// Uniform name, array elements are reported as `Name[i]`
    pub name: String,
    /// Declared type
    pub ty: UniformType,
    /// Location used for writes
    pub location: UniformLocation,
}

/// Result of compiling and linking a program
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    /// Program handle
    pub id: ProgramId,
    /// Active uniforms in declaration order
    pub uniforms: Vec<UniformInfo>,
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Single 2D image
    Texture2D,
    /// Six square faces
    Cubemap,
}

/// Texture creation parameters
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Dimensionality
    pub kind: TextureKind,
    /// Width of one face in texels
    pub width: u32,
    /// Height of one face in texels
    pub height: u32,
    /// RGBA8 texels, all faces concatenated for cubemaps
    pub pixels: Vec<[u8; 4]>,
}

impl TextureDesc {
    /// Number of texels the description must carry
    pub fn expected_texels(&self) -> usize {
        let faces = match self.kind {
            TextureKind::Texture2D => 1,
            TextureKind::Cubemap => 6,
        };
        (self.width as usize) * (self.height as usize) * faces
    }
}

/// Backend-neutral GPU interface consumed by the rendering core
///
/// All state-setting calls are synchronous; the core treats the driver as an
/// opaque synchronous call.
pub trait GraphicsDevice {
    /// Compile both stages and link them into a program
    fn build_program(&mut self, name: &str, vertex: &ShaderSource, fragment: &ShaderSource) -> RenderResult<ProgramInfo>;

    /// Make a program current
    fn use_program(&mut self, program: ProgramId);

    /// Write a uniform of a program
    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue);

    /// Bind depth test and depth write state
    fn set_depth_state(&mut self, state: DepthState);

    /// Enable or disable the stencil test globally
    fn set_stencil_test_enabled(&mut self, enabled: bool);

    /// Bind stencil function, masks and operations
    fn set_stencil_state(&mut self, state: StencilState);

    /// Bind the blend mode
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Upload positions and indices into a new vertex array
    fn create_vertex_array(&mut self, positions: &[Vec3], indices: &[u32]) -> RenderResult<VertexArrayId>;

    /// Bind a vertex array for subsequent draws
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Upload a texture
    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId>;

    /// Issue a draw with the currently bound state
    fn draw(&mut self, drawcall: &Drawcall);

    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags, values: &ClearValues);

    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    /// Read the color buffer back as tightly packed RGBA8 rows, top row first
    fn read_color_rgba8(&self) -> Vec<u8>;

    /// Downcast to the concrete device for inspection
    fn as_any(&self) -> &dyn Any;
}
