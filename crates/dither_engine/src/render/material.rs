//! # Materials
//!
//! A [`Material`] couples a shared [`ShaderProgram`] with the uniform values
//! it owns and the fixed-function state it draws with.
//!
//! ## Uniform Ownership
//!
//! The registry's per-drawcall callbacks push the camera, world matrix and
//! light uniforms. A material may only hold values for the remaining
//! uniforms: its allowed set is the program's active uniforms minus the
//! reserved names given at construction. Writing anything else is rejected
//! with [`RenderError::BindingViolation`].
//!
//! ## State Application
//!
//! [`Material::apply`] binds the program, pushes the stored uniform values,
//! and sets depth, stencil and blend state. The complete state is applied on
//! every call, so nothing left behind by the previous material survives.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::render::device::{BlendMode, DepthState, GraphicsDevice, StencilOperation, StencilState, TestFunction};
use crate::render::shader::{NameSet, ShaderProgram, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Shader program, owned uniform values and fixed-function state
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    program: Rc<ShaderProgram>,
    allowed: BTreeSet<String>,
    values: BTreeMap<String, UniformValue>,
    depth: DepthState,
    stencil: Option<StencilState>,
    blend: BlendMode,
}

impl Material {
    /// Create a material whose allowed uniforms exclude `reserved`
    pub fn new(name: impl Into<String>, program: Rc<ShaderProgram>, reserved: &NameSet) -> Self {
        let name = name.into();
        let allowed: BTreeSet<String> = program
            .uniform_names()
            .filter(|uniform| !reserved.contains(*uniform) && !reserved.contains(array_base(uniform)))
            .map(str::to_owned)
            .collect();
        log::debug!(
            "Material '{}' on program '{}' may bind {} uniforms",
            name,
            program.name(),
            allowed.len()
        );
        Self {
            name,
            program,
            allowed,
            values: BTreeMap::new(),
            depth: DepthState::default(),
            stencil: None,
            blend: BlendMode::Disabled,
        }
    }

    /// Copy this material under a new name, sharing the program
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared program
    pub fn program(&self) -> &Rc<ShaderProgram> {
        &self.program
    }

    /// Whether the material may store a value for `name`
    pub fn is_uniform_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    /// Uniform names the material may store values for
    pub fn allowed_uniforms(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Store a uniform value pushed on every [`Self::apply`]
    pub fn set_uniform_value(&mut self, name: &str, value: impl Into<UniformValue>) -> RenderResult<()> {
        let value = value.into();
        if !self.is_uniform_allowed(name) {
            return Err(RenderError::BindingViolation {
                material: self.name.clone(),
                uniform: name.to_string(),
            });
        }
        if let Some(info) = self.program.find_uniform(name) {
            if !info.ty.accepts(&value) {
                return Err(RenderError::UniformTypeMismatch {
                    uniform: name.to_string(),
                    expected: format!("{:?}", info.ty),
                    actual: value.kind().to_string(),
                });
            }
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Stored value of a uniform
    pub fn uniform_value(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    /// Depth state
    pub fn depth_state(&self) -> DepthState {
        self.depth
    }

    /// Set the depth test function, `None` disables the test
    pub fn set_depth_test_function(&mut self, function: Option<TestFunction>) {
        self.depth.function = function;
    }

    /// Enable or disable depth writes
    pub fn set_depth_write(&mut self, write: bool) {
        self.depth.write = write;
    }

    /// Stencil state, `None` when the stencil test is disabled
    pub fn stencil_state(&self) -> Option<StencilState> {
        self.stencil
    }

    /// Enable the stencil test with a function, reference and read mask
    pub fn set_stencil_test_function(&mut self, function: TestFunction, reference: u8, mask: u8) {
        let stencil = self.stencil.get_or_insert_with(StencilState::default);
        stencil.function = function;
        stencil.reference = reference;
        stencil.read_mask = mask;
    }

    /// Set which stencil bits the operations may change
    pub fn set_stencil_write_mask(&mut self, mask: u8) {
        self.stencil.get_or_insert_with(StencilState::default).write_mask = mask;
    }

    /// Set the operations for stencil fail, depth fail and depth pass
    pub fn set_stencil_operations(
        &mut self,
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        depth_pass: StencilOperation,
    ) {
        let stencil = self.stencil.get_or_insert_with(StencilState::default);
        stencil.stencil_fail = stencil_fail;
        stencil.depth_fail = depth_fail;
        stencil.depth_pass = depth_pass;
    }

    /// Disable the stencil test
    pub fn disable_stencil_test(&mut self) {
        self.stencil = None;
    }

    /// Blend mode
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Set the blend mode
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Bind the program, push stored uniforms and set all fixed-function state
    pub fn apply(&self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.program.use_program(device);
        for (name, value) in &self.values {
            self.program.set_uniform(device, name, *value)?;
        }
        device.set_depth_state(self.depth);
        match self.stencil {
            Some(stencil) => {
                device.set_stencil_test_enabled(true);
                device.set_stencil_state(stencil);
            }
            None => {
                device.set_stencil_test_enabled(false);
                device.set_stencil_state(StencilState::default());
            }
        }
        device.set_blend_mode(self.blend);
        Ok(())
    }
}

/// `LightColor[3]` -> `LightColor`
fn array_base(name: &str) -> &str {
    name.split_once('[').map_or(name, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::{DeviceCommand, SoftwareDevice};
    use crate::render::shader::uniform::name_set;
    use crate::render::shader::{ShaderSource, ShaderStage};

    fn program(device: &mut SoftwareDevice) -> Rc<ShaderProgram> {
        let vs = ShaderSource::inline(
            ShaderStage::Vertex,
            "vs",
            "uniform mat4 WorldMatrix;\nuniform mat4 ViewProjMatrix;\nvoid main() {}",
        );
        let fs = ShaderSource::inline(
            ShaderStage::Fragment,
            "fs",
            "uniform vec3 Color;\nuniform float Roughness;\nuniform vec3 LightColor[2];\nvoid main() {}",
        );
        ShaderProgram::build(device, "pbr", &vs, &fs).unwrap()
    }

    fn reserved() -> NameSet {
        name_set(["WorldMatrix", "ViewProjMatrix", "LightColor"])
    }

    #[test]
    fn test_reserved_uniforms_are_rejected() {
        let mut device = SoftwareDevice::new(4, 4);
        let mut material = Material::new("pbr", program(&mut device), &reserved());

        let result = material.set_uniform_value("WorldMatrix", crate::foundation::math::Mat4::identity());
        assert!(matches!(result, Err(RenderError::BindingViolation { .. })));
        let result = material.set_uniform_value("LightColor[1]", crate::foundation::math::Vec3::zeros());
        assert!(matches!(result, Err(RenderError::BindingViolation { .. })));
        let result = material.set_uniform_value("Missing", 1.0f32);
        assert!(matches!(result, Err(RenderError::BindingViolation { .. })));
        assert!(material.uniform_value("WorldMatrix").is_none());
    }

    #[test]
    fn test_allowed_uniform_round_trips() {
        let mut device = SoftwareDevice::new(4, 4);
        let mut material = Material::new("pbr", program(&mut device), &reserved());

        material.set_uniform_value("Roughness", 0.35f32).unwrap();
        assert_eq!(material.uniform_value("Roughness"), Some(&UniformValue::Float(0.35)));
        let names: Vec<&str> = material.allowed_uniforms().collect();
        assert_eq!(names, vec!["Color", "Roughness"]);
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let mut device = SoftwareDevice::new(4, 4);
        let mut material = Material::new("pbr", program(&mut device), &reserved());
        let result = material.set_uniform_value("Roughness", 2i32);
        assert!(matches!(result, Err(RenderError::UniformTypeMismatch { .. })));
    }

    #[test]
    fn test_apply_sets_complete_state() {
        let mut device = SoftwareDevice::new(4, 4);
        let mut material = Material::new("overlay", program(&mut device), &reserved());
        material.set_depth_test_function(Some(TestFunction::NotEqual));
        material.set_stencil_test_function(TestFunction::Equal, 1, 0xFF);
        material.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Keep);
        material.set_uniform_value("Roughness", 0.5f32).unwrap();

        material.apply(&mut device).unwrap();

        let state = device.state();
        assert_eq!(state.program, Some(material.program().id()));
        assert_eq!(state.depth.function, Some(TestFunction::NotEqual));
        assert!(state.stencil_enabled);
        assert_eq!(state.stencil.function, TestFunction::Equal);
        assert_eq!(state.stencil.reference, 1);
        assert_eq!(
            device.uniform_value(material.program().id(), "Roughness"),
            Some(UniformValue::Float(0.5))
        );
        assert!(device.commands().contains(&DeviceCommand::SetBlendMode(BlendMode::Disabled)));
    }

    #[test]
    fn test_duplicate_shares_program() {
        let mut device = SoftwareDevice::new(4, 4);
        let mut base = Material::new("base", program(&mut device), &reserved());
        base.set_stencil_test_function(TestFunction::Always, 1, 0xFF);

        let mut copy = base.duplicate("copy");
        copy.set_stencil_operations(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Zero);

        assert!(Rc::ptr_eq(base.program(), copy.program()));
        assert_eq!(base.stencil_state().map(|s| s.depth_pass), Some(StencilOperation::Keep));
        assert_eq!(copy.stencil_state().map(|s| s.depth_pass), Some(StencilOperation::Zero));
        assert_eq!(copy.name(), "copy");
    }
}
