//! Light update strategies
//!
//! An update-lights callback pushes light uniforms starting at `index` and
//! returns whether another iteration is needed. The caller draws once after
//! every call that pushed something, so the loop always draws at least once.

use crate::foundation::math::{Vec3, Vec4};
use crate::render::device::GraphicsDevice;
use crate::render::lighting::Light;
use crate::render::shader::{name_set, NameSet, ShaderProgram};
use crate::render::RenderResult;

/// Uniforms written by the per-light strategy
pub const PER_LIGHT_UNIFORMS: [&str; 5] = ["LightIndirect", "LightColor", "LightPosition", "LightDirection", "LightAttenuation"];

/// Uniforms written by the all-at-once strategy; arrays are reserved by base name
pub const LIGHT_ARRAY_UNIFORMS: [&str; 5] = ["LightCount", "LightColor", "LightPosition", "LightDirection", "LightAttenuation"];

/// Callback signature of a light update
pub type UpdateLightsFn = dyn Fn(&ShaderProgram, &mut dyn GraphicsDevice, &[Light], &mut usize) -> RenderResult<bool>;

/// A light update callback and the names it owns
pub struct UpdateLights {
    names: NameSet,
    func: Box<UpdateLightsFn>,
}

impl std::fmt::Debug for UpdateLights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateLights").field("names", &self.names).finish_non_exhaustive()
    }
}

impl UpdateLights {
    /// Wrap a custom callback that owns `names`
    pub fn new<F>(names: NameSet, func: F) -> Self
    where
        F: Fn(&ShaderProgram, &mut dyn GraphicsDevice, &[Light], &mut usize) -> RenderResult<bool> + 'static,
    {
        Self {
            names,
            func: Box::new(func),
        }
    }

    /// Unlit programs: never asks for another iteration
    pub fn none() -> Self {
        Self::new(NameSet::new(), |_, _, _, _| Ok(false))
    }

    /// Push every light into array uniforms in one call
    ///
    /// Lights beyond the declared array length are dropped.
    pub fn all_at_once() -> Self {
        Self::new(name_set(LIGHT_ARRAY_UNIFORMS), |program, device, lights, index| {
            let mut pushed = 0i32;
            for (i, light) in lights.iter().enumerate() {
                if !program.has_uniform(&format!("LightColor[{}]", i)) {
                    log::trace!("Program '{}' holds {} of {} lights", program.name(), i, lights.len());
                    break;
                }
                program.set_uniform(device, &format!("LightColor[{}]", i), light.radiance())?;
                program.set_uniform_if_present(device, &format!("LightPosition[{}]", i), light.homogeneous_position())?;
                program.set_uniform_if_present(device, &format!("LightDirection[{}]", i), light.direction)?;
                program.set_uniform_if_present(device, &format!("LightAttenuation[{}]", i), light.attenuation)?;
                pushed += 1;
            }
            program.set_uniform_if_present(device, "LightCount", pushed)?;
            *index = lights.len();
            Ok(false)
        })
    }

    /// Push one light per call for additive multi-pass lighting
    ///
    /// `LightIndirect` is 1 only on the first iteration so ambient light is
    /// added once. With no lights a black light is pushed and the single draw
    /// still happens.
    pub fn per_light() -> Self {
        Self::new(name_set(PER_LIGHT_UNIFORMS), |program, device, lights, index| {
            let first = *index == 0;
            program.set_uniform_if_present(device, "LightIndirect", i32::from(first))?;

            match lights.get(*index) {
                Some(light) => {
                    program.set_uniform_if_present(device, "LightColor", light.radiance())?;
                    program.set_uniform_if_present(device, "LightPosition", light.homogeneous_position())?;
                    program.set_uniform_if_present(device, "LightDirection", light.direction)?;
                    program.set_uniform_if_present(device, "LightAttenuation", light.attenuation)?;
                }
                None => {
                    program.set_uniform_if_present(device, "LightColor", Vec3::zeros())?;
                    program.set_uniform_if_present(device, "LightAttenuation", Vec4::zeros())?;
                }
            }

            *index += 1;
            Ok(*index < lights.len())
        })
    }

    /// Names this callback writes
    pub fn names(&self) -> &NameSet {
        &self.names
    }

    /// Run the callback
    pub fn call(
        &self,
        program: &ShaderProgram,
        device: &mut dyn GraphicsDevice,
        lights: &[Light],
        index: &mut usize,
    ) -> RenderResult<bool> {
        (self.func)(program, device, lights, index)
    }
}
