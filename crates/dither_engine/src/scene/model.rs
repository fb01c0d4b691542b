//! Models: uploaded geometry with per-submesh materials

use std::rc::Rc;

use crate::foundation::math::Vec3;
use crate::render::device::{GraphicsDevice, PrimitiveMode, VertexArrayId};
use crate::render::drawcall::Drawcall;
use crate::render::material::Material;
use crate::render::{RenderError, RenderResult};

/// CPU-side indexed triangle geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Rectangle in the XY plane centered on the origin, facing +Z
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned cube centered on the origin
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +Z
            1, 0, 3, 1, 3, 2, // -Z
            5, 1, 2, 5, 2, 6, // +X
            0, 4, 7, 0, 7, 3, // -X
            7, 6, 2, 7, 2, 3, // +Y
            0, 1, 5, 0, 5, 4, // -Y
        ];
        Self { positions, indices }
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Upload into a new vertex array
    pub fn upload(&self, device: &mut dyn GraphicsDevice) -> RenderResult<VertexArrayId> {
        device.create_vertex_array(&self.positions, &self.indices)
    }
}

/// A drawcall range and the material slot it is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    /// Range of the model's geometry
    pub drawcall: Drawcall,
    /// Index into the model's materials
    pub material_index: usize,
}

/// Geometry on the device plus the materials of its submeshes
#[derive(Debug, Clone)]
pub struct Model {
    vertex_array: VertexArrayId,
    submeshes: Vec<Submesh>,
    materials: Vec<Rc<Material>>,
}

impl Model {
    /// Assemble a model from uploaded parts
    pub fn new(vertex_array: VertexArrayId, submeshes: Vec<Submesh>, materials: Vec<Rc<Material>>) -> RenderResult<Self> {
        if let Some(submesh) = submeshes.iter().find(|s| s.material_index >= materials.len()) {
            return Err(RenderError::InvalidResource(format!(
                "submesh uses material slot {} of {}",
                submesh.material_index,
                materials.len()
            )));
        }
        Ok(Self {
            vertex_array,
            submeshes,
            materials,
        })
    }

    /// Upload a mesh as a single-submesh model
    pub fn from_mesh(device: &mut dyn GraphicsDevice, mesh: &Mesh, material: Rc<Material>) -> RenderResult<Self> {
        let vertex_array = mesh.upload(device)?;
        let submesh = Submesh {
            drawcall: Drawcall::indexed(PrimitiveMode::Triangles, 0, mesh.index_count()),
            material_index: 0,
        };
        Self::new(vertex_array, vec![submesh], vec![material])
    }

    /// Vertex array holding the geometry
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Submeshes in draw order
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Material of a slot
    pub fn material(&self, index: usize) -> RenderResult<&Rc<Material>> {
        self.materials
            .get(index)
            .ok_or_else(|| RenderError::InvalidResource(format!("material slot {} missing", index)))
    }

    /// Replace the material of a slot
    pub fn set_material(&mut self, index: usize, material: Rc<Material>) -> RenderResult<()> {
        let slot = self
            .materials
            .get_mut(index)
            .ok_or_else(|| RenderError::InvalidResource(format!("material slot {} missing", index)))?;
        *slot = material;
        Ok(())
    }

    /// Number of material slots
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
