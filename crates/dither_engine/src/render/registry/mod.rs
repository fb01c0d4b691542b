//! # Shader Program Registry
//!
//! Maps each shader program to the two callbacks the passes invoke for every
//! drawcall drawn with it:
//!
//! - an [`UpdateUniforms`] pushing the world matrix and, when the camera
//!   changed, the camera uniforms
//! - an [`UpdateLights`] pushing light uniforms and driving the per-light
//!   draw loop
//!
//! The names both callbacks write are reserved: materials built through the
//! registry can never store values for them.
//!
//! ## Registration
//! One entry per program. Registering a program again replaces its
//! callbacks, so exactly one update-uniforms callback runs per drawcall.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::render::device::{GraphicsDevice, ProgramId};
use crate::render::lighting::Light;
use crate::render::material::Material;
use crate::render::shader::{NameSet, ShaderProgram};
use crate::render::{RenderError, RenderResult};

pub mod lights;
pub mod uniforms;

pub use lights::UpdateLights;
pub use uniforms::{DitherUniforms, DrawUniformContext, FrameTunables, UpdateUniforms};

/// Callbacks registered for one program
#[derive(Debug)]
pub struct RegistryEntry {
    /// The registered program
    pub program: Rc<ShaderProgram>,
    /// Per-drawcall uniform update
    pub update_uniforms: UpdateUniforms,
    /// Light update
    pub update_lights: UpdateLights,
    /// Whether camera uniforms were ever pushed to this program
    camera_primed: Cell<bool>,
}

impl RegistryEntry {
    /// Names owned by the callbacks
    pub fn reserved_names(&self) -> NameSet {
        self.update_uniforms
            .names()
            .union(self.update_lights.names())
            .cloned()
            .collect()
    }
}

/// Registry of shader programs and their update callbacks
#[derive(Debug, Default)]
pub struct ShaderProgramRegistry {
    entries: HashMap<ProgramId, RegistryEntry>,
}

impl ShaderProgramRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program, replacing any callbacks registered before
    ///
    /// Returns whether an earlier registration was replaced.
    pub fn register_shader_program(
        &mut self,
        program: Rc<ShaderProgram>,
        update_uniforms: UpdateUniforms,
        update_lights: UpdateLights,
    ) -> bool {
        let id = program.id();
        let name = program.name().to_string();
        let replaced = self
            .entries
            .insert(
                id,
                RegistryEntry {
                    program,
                    update_uniforms,
                    update_lights,
                    camera_primed: Cell::new(false),
                },
            )
            .is_some();
        if replaced {
            log::info!("Replaced callbacks of shader program '{}'", name);
        } else {
            log::info!("Registered shader program '{}'", name);
        }
        replaced
    }

    /// Whether the program has an entry
    pub fn is_registered(&self, program: ProgramId) -> bool {
        self.entries.contains_key(&program)
    }

    /// Entry of a program
    pub fn entry(&self, program: ProgramId) -> Option<&RegistryEntry> {
        self.entries.get(&program)
    }

    /// Number of registered programs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uniform names the program's callbacks own
    pub fn reserved_names(&self, program: ProgramId) -> RenderResult<NameSet> {
        self.registered(program).map(RegistryEntry::reserved_names)
    }

    /// Create a material whose allowed uniforms exclude the reserved names
    pub fn create_material(&self, name: impl Into<String>, program: &Rc<ShaderProgram>) -> RenderResult<Material> {
        let reserved = self.reserved_names(program.id())?;
        Ok(Material::new(name, Rc::clone(program), &reserved))
    }

    /// Run the program's uniform update for one drawcall
    ///
    /// Camera uniforms are also pushed the first time a program is updated,
    /// whatever the flag says, so a program first drawn on a frame where the
    /// camera stood still is not left without them.
    pub fn update_uniforms(
        &self,
        program: ProgramId,
        device: &mut dyn GraphicsDevice,
        ctx: &DrawUniformContext<'_>,
    ) -> RenderResult<()> {
        let entry = self.registered(program)?;
        let camera_changed = ctx.camera_changed || !entry.camera_primed.get();
        let ctx = DrawUniformContext { camera_changed, ..*ctx };
        entry.update_uniforms.call(&entry.program, device, &ctx)?;
        if camera_changed {
            entry.camera_primed.set(true);
        }
        Ok(())
    }

    /// Run the program's light update starting at `index`
    pub fn update_lights(
        &self,
        program: ProgramId,
        device: &mut dyn GraphicsDevice,
        lights: &[Light],
        index: &mut usize,
    ) -> RenderResult<bool> {
        let entry = self.registered(program)?;
        entry.update_lights.call(&entry.program, device, lights, index)
    }

    fn registered(&self, program: ProgramId) -> RenderResult<&RegistryEntry> {
        self.entries
            .get(&program)
            .ok_or_else(|| RenderError::UnregisteredProgram(format!("{:?}", program)))
    }
}
