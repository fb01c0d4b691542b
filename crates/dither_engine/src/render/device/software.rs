//! # Software Device
//!
//! A CPU reference implementation of [`GraphicsDevice`]. It keeps real color,
//! depth and stencil buffers and rasterizes triangles with GL test semantics,
//! which makes stencil masks and depth interactions observable in tests and
//! lets the viewer run without a windowing system.
//!
//! ## Shading Model
//!
//! There is no shader interpreter. Positions are transformed by
//! `ViewProjMatrix * WorldMatrix` when the program declares those uniforms
//! (identity otherwise, so untransformed geometry is taken as clip space).
//! Each fragment is flat colored:
//!
//! 1. the `Color` uniform when the program has one with a value
//! 2. otherwise the mean color of the first bound texture
//! 3. otherwise white
//!
//! ## Inspection
//!
//! Every state change and draw is appended to a command log so tests can
//! assert on the exact sequence the rendering core emitted.

use std::any::Any;
use std::collections::HashMap;

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::device::{
    BlendMode, ClearFlags, ClearValues, DepthState, GraphicsDevice, PrimitiveMode, ProgramId, ProgramInfo,
    StencilState, TextureDesc, TextureId, UniformInfo, UniformLocation, UniformType, VertexArrayId,
};
use crate::render::drawcall::Drawcall;
use crate::render::shader::{ShaderSource, UniformValue};
use crate::render::{RenderError, RenderResult};

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Currently bound fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFunctionState {
    /// Current program
    pub program: Option<ProgramId>,
    /// Current vertex array
    pub vertex_array: Option<VertexArrayId>,
    /// Depth state
    pub depth: DepthState,
    /// Global stencil enable
    pub stencil_enabled: bool,
    /// Stencil state
    pub stencil: StencilState,
    /// Blend mode
    pub blend: BlendMode,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            program: None,
            vertex_array: None,
            depth: DepthState::default(),
            stencil_enabled: false,
            stencil: StencilState::default(),
            blend: BlendMode::Disabled,
        }
    }
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// `use_program`
    UseProgram(ProgramId),
    /// `set_uniform`, with the uniform name resolved
    SetUniform {
        /// Target program
        program: ProgramId,
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// `set_depth_state`
    SetDepthState(DepthState),
    /// `set_stencil_test_enabled`
    SetStencilTestEnabled(bool),
    /// `set_stencil_state`
    SetStencilState(StencilState),
    /// `set_blend_mode`
    SetBlendMode(BlendMode),
    /// `bind_vertex_array`
    BindVertexArray(VertexArrayId),
    /// `draw`, with the state it was issued under
    Draw {
        /// Bound state at the time of the draw
        state: FixedFunctionState,
        /// Element count
        count: u32,
    },
    /// `clear`
    Clear(ClearFlags),
}

#[derive(Debug)]
struct SoftwareProgram {
    name: String,
    uniforms: Vec<UniformInfo>,
    values: HashMap<UniformLocation, UniformValue>,
}

impl SoftwareProgram {
    fn value(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms
            .iter()
            .find(|info| info.name == name)
            .and_then(|info| self.values.get(&info.location))
    }
}

#[derive(Debug)]
struct VertexArrayData {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

#[derive(Debug)]
struct TextureData {
    mean_color: [f32; 4],
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
}

/// CPU rasterizer with GL depth/stencil semantics
#[derive(Debug)]
pub struct SoftwareDevice {
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
    stencil: Vec<u8>,
    programs: Vec<SoftwareProgram>,
    vertex_arrays: Vec<VertexArrayData>,
    textures: Vec<TextureData>,
    state: FixedFunctionState,
    commands: Vec<DeviceCommand>,
    draw_count: usize,
}

impl SoftwareDevice {
    /// Create a device with a framebuffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        let clear = ClearValues::default();
        log::debug!("Created software device {}x{}", width, height);
        Self {
            width,
            height,
            color: vec![clear.color; pixels],
            depth: vec![clear.depth; pixels],
            stencil: vec![clear.stencil; pixels],
            programs: Vec::new(),
            vertex_arrays: Vec::new(),
            textures: Vec::new(),
            state: FixedFunctionState::default(),
            commands: Vec::new(),
            draw_count: 0,
        }
    }

    /// Bound state
    pub fn state(&self) -> &FixedFunctionState {
        &self.state
    }

    /// Recorded calls since creation or the last [`Self::clear_commands`]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Forget recorded calls
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of draws issued since creation
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Last value written to a named uniform of a program
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.program(program).and_then(|p| p.value(name)).copied()
    }

    /// Name a program was built with
    pub fn program_name(&self, program: ProgramId) -> Option<&str> {
        self.program(program).map(|p| p.name.as_str())
    }

    /// Stencil value at a pixel, row 0 at the top
    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        self.stencil[self.index(x, y)]
    }

    /// Depth value at a pixel, row 0 at the top
    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Color at a pixel, row 0 at the top
    pub fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn program(&self, id: ProgramId) -> Option<&SoftwareProgram> {
        self.programs.get(id.0 as usize)
    }

    fn parse_uniforms(name: &str, source: &ShaderSource) -> RenderResult<Vec<(String, UniformType)>> {
        if !source.source.contains("void main") {
            return Err(RenderError::ShaderCompilation {
                name: name.to_string(),
                message: format!("{} ({:?}): missing entry point 'void main'", source.origin, source.stage),
            });
        }

        let mut uniforms = Vec::new();
        for line in source.source.lines() {
            let line = line.split("//").next().unwrap_or_default().trim();
            let Some(declaration) = line.strip_prefix("uniform ") else {
                continue;
            };
            let declaration = declaration.trim_end_matches(';').trim();
            let mut tokens = declaration
                .split_whitespace()
                .filter(|token| !PRECISION_QUALIFIERS.contains(token));
            let (Some(keyword), Some(identifier)) = (tokens.next(), tokens.next()) else {
                return Err(RenderError::ShaderCompilation {
                    name: name.to_string(),
                    message: format!("malformed uniform declaration '{}'", line),
                });
            };
            let ty = UniformType::from_glsl(keyword).ok_or_else(|| RenderError::ShaderCompilation {
                name: name.to_string(),
                message: format!("unsupported uniform type '{}'", keyword),
            })?;

            match identifier.split_once('[') {
                Some((base, rest)) => {
                    let length: usize = rest.trim_end_matches(']').trim().parse().map_err(|_| {
                        RenderError::ShaderCompilation {
                            name: name.to_string(),
                            message: format!("array uniform '{}' needs a literal length", base),
                        }
                    })?;
                    uniforms.extend((0..length).map(|i| (format!("{}[{}]", base, i), ty)));
                }
                None => uniforms.push((identifier.to_string(), ty)),
            }
        }
        Ok(uniforms)
    }

    fn record(&mut self, command: DeviceCommand) {
        self.commands.push(command);
    }

    fn fragment_color(&self) -> [f32; 4] {
        let Some(program) = self.state.program.and_then(|id| self.program(id)) else {
            return [1.0; 4];
        };
        match program.value("Color") {
            Some(UniformValue::Vec3(c)) => return [c.x, c.y, c.z, 1.0],
            Some(UniformValue::Vec4(c)) => return [c.x, c.y, c.z, c.w],
            _ => {}
        }
        let texture = program.uniforms.iter().find_map(|info| match program.values.get(&info.location) {
            Some(UniformValue::Texture(texture)) => self.textures.get(texture.0 as usize),
            _ => None,
        });
        texture.map_or([1.0; 4], |t| t.mean_color)
    }

    fn model_view_projection(&self) -> Mat4 {
        let Some(program) = self.state.program.and_then(|id| self.program(id)) else {
            return Mat4::identity();
        };
        let matrix = |name: &str| match program.value(name) {
            Some(UniformValue::Mat4(m)) => *m,
            _ => Mat4::identity(),
        };
        matrix("ViewProjMatrix") * matrix("WorldMatrix")
    }

    fn assemble_triangles(&self, drawcall: &Drawcall, data: &VertexArrayData) -> Option<Vec<[u32; 3]>> {
        let first = drawcall.first as usize;
        let count = drawcall.count as usize;
        let elements: Vec<u32> = if drawcall.indexed {
            data.indices.get(first..first + count)?.to_vec()
        } else {
            if first + count > data.positions.len() {
                return None;
            }
            (drawcall.first..drawcall.first + drawcall.count).collect()
        };
        if elements.iter().any(|&i| i as usize >= data.positions.len()) {
            return None;
        }

        let triangles = match drawcall.primitive {
            PrimitiveMode::Triangles => elements.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect(),
            PrimitiveMode::TriangleStrip => elements
                .windows(3)
                .enumerate()
                .map(|(i, t)| if i % 2 == 0 { [t[0], t[1], t[2]] } else { [t[1], t[0], t[2]] })
                .collect(),
            PrimitiveMode::Lines | PrimitiveMode::Points => Vec::new(),
        };
        Some(triangles)
    }

    fn to_screen(&self, clip: &Vec4) -> ScreenVertex {
        let ndc = clip.xyz() / clip.w;
        ScreenVertex {
            x: (ndc.x * 0.5 + 0.5) * self.width as f32,
            y: (0.5 - ndc.y * 0.5) * self.height as f32,
            depth: ndc.z * 0.5 + 0.5,
        }
    }

    fn rasterize(&mut self, clip: [Vec4; 3], color: [f32; 4]) {
        let polygon = clip_near(&clip);
        if polygon.len() < 3 {
            return;
        }
        let screen: Vec<ScreenVertex> = polygon.iter().map(|v| self.to_screen(v)).collect();
        for i in 1..screen.len() - 1 {
            self.rasterize_triangle(screen[0], screen[i], screen[i + 1], color);
        }
    }

    fn rasterize_triangle(&mut self, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex, color: [f32; 4]) {
        let area = edge(&a, &b, c.x, c.y);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let (b, c, area) = if area < 0.0 { (c, b, -area) } else { (b, c, area) };

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = (a.x.max(b.x).max(c.x).ceil() as u32).min(self.width);
        let max_y = (a.y.max(b.y).max(c.y).ceil() as u32).min(self.height);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let (sx, sy) = (px as f32 + 0.5, py as f32 + 0.5);
                let w_a = edge(&b, &c, sx, sy);
                let w_b = edge(&c, &a, sx, sy);
                let w_c = edge(&a, &b, sx, sy);
                if !(covers(w_a, &b, &c) && covers(w_b, &c, &a) && covers(w_c, &a, &b)) {
                    continue;
                }
                let depth = (w_a * a.depth + w_b * b.depth + w_c * c.depth) / area;
                self.shade_fragment(self.index(px, py), depth, color);
            }
        }
    }

    fn shade_fragment(&mut self, index: usize, depth: f32, color: [f32; 4]) {
        let stencil = self.state.stencil;
        let stencil_enabled = self.state.stencil_enabled;
        let stored_stencil = self.stencil[index];

        if stencil_enabled && !stencil.test(stored_stencil) {
            self.stencil[index] = stencil.write(stencil.stencil_fail, stored_stencil);
            return;
        }

        if let Some(function) = self.state.depth.function {
            if !function.passes(depth, self.depth[index]) {
                if stencil_enabled {
                    self.stencil[index] = stencil.write(stencil.depth_fail, stored_stencil);
                }
                return;
            }
            if self.state.depth.write {
                self.depth[index] = depth;
            }
        }

        if stencil_enabled {
            self.stencil[index] = stencil.write(stencil.depth_pass, stored_stencil);
        }

        let dst = self.color[index];
        self.color[index] = match self.state.blend {
            BlendMode::Disabled => color,
            BlendMode::Additive => std::array::from_fn(|i| color[i] + dst[i]),
            BlendMode::Alpha => {
                let alpha = color[3];
                std::array::from_fn(|i| color[i] * alpha + dst[i] * (1.0 - alpha))
            }
        };
    }
}

/// Edge function of `p` against the directed edge `from -> to`
fn edge(from: &ScreenVertex, to: &ScreenVertex, px: f32, py: f32) -> f32 {
    (to.x - from.x) * (py - from.y) - (to.y - from.y) * (px - from.x)
}

/// Coverage with a tie rule so a shared edge belongs to exactly one triangle
fn covers(weight: f32, from: &ScreenVertex, to: &ScreenVertex) -> bool {
    if weight != 0.0 {
        return weight > 0.0;
    }
    let dy = to.y - from.y;
    dy < 0.0 || (dy == 0.0 && to.x - from.x > 0.0)
}

/// Clip a triangle against the near plane `z >= -w`
fn clip_near(triangle: &[Vec4; 3]) -> Vec<Vec4> {
    let distance = |v: &Vec4| v.z + v.w;
    let mut output = Vec::with_capacity(4);
    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];
        let (d_current, d_next) = (distance(&current), distance(&next));
        if d_current >= 0.0 {
            output.push(current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            let t = d_current / (d_current - d_next);
            output.push(current + (next - current) * t);
        }
    }
    output.retain(|v| v.w > f32::EPSILON);
    output
}

impl GraphicsDevice for SoftwareDevice {
    fn build_program(&mut self, name: &str, vertex: &ShaderSource, fragment: &ShaderSource) -> RenderResult<ProgramInfo> {
        let mut declared: Vec<(String, UniformType)> = Vec::new();
        for (uniform, ty) in Self::parse_uniforms(name, vertex)?
            .into_iter()
            .chain(Self::parse_uniforms(name, fragment)?)
        {
            match declared.iter().find(|(existing, _)| *existing == uniform) {
                Some((_, existing_ty)) if *existing_ty != ty => {
                    return Err(RenderError::ShaderLink {
                        name: name.to_string(),
                        message: format!("uniform '{}' declared as {:?} and {:?}", uniform, existing_ty, ty),
                    });
                }
                Some(_) => {}
                None => declared.push((uniform, ty)),
            }
        }

        let uniforms: Vec<UniformInfo> = declared
            .into_iter()
            .enumerate()
            .map(|(location, (name, ty))| UniformInfo {
                name,
                ty,
                location: UniformLocation(location as u32),
            })
            .collect();

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(SoftwareProgram {
            name: name.to_string(),
            uniforms: uniforms.clone(),
            values: HashMap::new(),
        });
        log::debug!("Software device linked program '{}' as {:?}", name, id);
        Ok(ProgramInfo { id, uniforms })
    }

    fn use_program(&mut self, program: ProgramId) {
        self.state.program = Some(program);
        self.record(DeviceCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let Some(target) = self.programs.get_mut(program.0 as usize) else {
            log::warn!("Uniform write to unknown program {:?}", program);
            return;
        };
        let Some(name) = target.uniforms.iter().find(|u| u.location == location).map(|u| u.name.clone()) else {
            log::warn!("Uniform write to unknown location {:?} of '{}'", location, target.name);
            return;
        };
        target.values.insert(location, *value);
        self.record(DeviceCommand::SetUniform {
            program,
            name,
            value: *value,
        });
    }

    fn set_depth_state(&mut self, state: DepthState) {
        self.state.depth = state;
        self.record(DeviceCommand::SetDepthState(state));
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.state.stencil_enabled = enabled;
        self.record(DeviceCommand::SetStencilTestEnabled(enabled));
    }

    fn set_stencil_state(&mut self, state: StencilState) {
        self.state.stencil = state;
        self.record(DeviceCommand::SetStencilState(state));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
        self.record(DeviceCommand::SetBlendMode(mode));
    }

    fn create_vertex_array(&mut self, positions: &[Vec3], indices: &[u32]) -> RenderResult<VertexArrayId> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(RenderError::InvalidResource(format!(
                "index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(VertexArrayData {
            positions: positions.to_vec(),
            indices: indices.to_vec(),
        });
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.state.vertex_array = Some(vertex_array);
        self.record(DeviceCommand::BindVertexArray(vertex_array));
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        if desc.pixels.len() != desc.expected_texels() || desc.pixels.is_empty() {
            return Err(RenderError::InvalidResource(format!(
                "{:?} texture {}x{} needs {} texels, got {}",
                desc.kind,
                desc.width,
                desc.height,
                desc.expected_texels(),
                desc.pixels.len()
            )));
        }
        let mut sum = [0.0f64; 4];
        for texel in &desc.pixels {
            for (acc, channel) in sum.iter_mut().zip(texel) {
                *acc += f64::from(*channel) / 255.0;
            }
        }
        let count = desc.pixels.len() as f64;
        let mean_color = sum.map(|channel| (channel / count) as f32);

        let id = TextureId(self.textures.len() as u32);
        self.textures.push(TextureData { mean_color });
        Ok(id)
    }

    fn draw(&mut self, drawcall: &Drawcall) {
        self.draw_count += 1;
        self.record(DeviceCommand::Draw {
            state: self.state,
            count: drawcall.count,
        });

        let Some(vertex_array) = self.state.vertex_array else {
            log::warn!("Draw issued without a bound vertex array");
            return;
        };
        let Some(data) = self.vertex_arrays.get(vertex_array.0 as usize) else {
            log::warn!("Draw issued with unknown vertex array {:?}", vertex_array);
            return;
        };
        let Some(triangles) = self.assemble_triangles(drawcall, data) else {
            log::warn!("Drawcall range {}+{} exceeds vertex array {:?}", drawcall.first, drawcall.count, vertex_array);
            return;
        };
        let clip_positions: Vec<Vec4> = {
            let mvp = self.model_view_projection();
            data.positions.iter().map(|p| mvp * Vec4::new(p.x, p.y, p.z, 1.0)).collect()
        };
        let color = self.fragment_color();

        for [i0, i1, i2] in triangles {
            let triangle = [
                clip_positions[i0 as usize],
                clip_positions[i1 as usize],
                clip_positions[i2 as usize],
            ];
            self.rasterize(triangle, color);
        }
    }

    fn clear(&mut self, flags: ClearFlags, values: &ClearValues) {
        if flags.contains(ClearFlags::COLOR) {
            self.color.fill(values.color);
        }
        if flags.contains(ClearFlags::DEPTH) {
            self.depth.fill(values.depth);
        }
        if flags.contains(ClearFlags::STENCIL) {
            self.stencil.fill(values.stencil);
        }
        self.record(DeviceCommand::Clear(flags));
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_color_rgba8(&self) -> Vec<u8> {
        let texels: Vec<[u8; 4]> = self
            .color
            .iter()
            .map(|c| c.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        bytemuck::cast_slice::<[u8; 4], u8>(&texels).to_vec()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
