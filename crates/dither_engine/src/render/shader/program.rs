//! Compiled shader programs

use std::collections::HashMap;
use std::rc::Rc;

use crate::render::device::{GraphicsDevice, ProgramId, UniformInfo, UniformLocation};
use crate::render::shader::{ShaderSource, UniformValue};
use crate::render::{RenderError, RenderResult};

/// A linked program and its active uniforms
///
/// Programs are shared between materials and registry entries through `Rc`;
/// identity is the device handle.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    name: String,
    uniforms: HashMap<String, UniformInfo>,
}

impl ShaderProgram {
    /// Compile and link a program on the device
    pub fn build(
        device: &mut dyn GraphicsDevice,
        name: &str,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> RenderResult<Rc<Self>> {
        let info = device.build_program(name, vertex, fragment)?;
        log::info!(
            "Built shader program '{}' ({:?}) with {} active uniforms",
            name,
            info.id,
            info.uniforms.len()
        );
        let uniforms = info
            .uniforms
            .into_iter()
            .map(|uniform| (uniform.name.clone(), uniform))
            .collect();
        Ok(Rc::new(Self {
            id: info.id,
            name: name.to_string(),
            uniforms,
        }))
    }

    /// Device handle
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active uniform names
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Whether the program declares the uniform
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Look up an active uniform
    pub fn find_uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.get(name)
    }

    /// Location of an active uniform
    pub fn uniform_location(&self, name: &str) -> RenderResult<UniformLocation> {
        self.find_uniform(name)
            .map(|info| info.location)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.name.clone(),
                uniform: name.to_string(),
            })
    }

    /// Make this program current
    pub fn use_program(&self, device: &mut dyn GraphicsDevice) {
        device.use_program(self.id);
    }

    /// Type-check and write a uniform
    pub fn set_uniform(&self, device: &mut dyn GraphicsDevice, name: &str, value: impl Into<UniformValue>) -> RenderResult<()> {
        let value = value.into();
        let info = self.find_uniform(name).ok_or_else(|| RenderError::UnknownUniform {
            program: self.name.clone(),
            uniform: name.to_string(),
        })?;
        if !info.ty.accepts(&value) {
            return Err(RenderError::UniformTypeMismatch {
                uniform: name.to_string(),
                expected: format!("{:?}", info.ty),
                actual: value.kind().to_string(),
            });
        }
        device.set_uniform(self.id, info.location, &value);
        Ok(())
    }

    /// Write a uniform only if the program declares it
    ///
    /// Returns whether a write happened.
    pub fn set_uniform_if_present(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> RenderResult<bool> {
        if self.has_uniform(name) {
            self.set_uniform(device, name, value)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl PartialEq for ShaderProgram {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShaderProgram {}
