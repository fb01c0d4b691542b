//! # Drawcalls and Buckets
//!
//! A [`DrawcallInfo`] pairs one drawcall with the material, world transform
//! and vertex array it is drawn with. The scene places each model's
//! drawcalls into one or more buckets; passes then iterate a single bucket.
//! A model in several buckets appears as an independent entry in each.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::render::device::{GraphicsDevice, PrimitiveMode, VertexArrayId};
use crate::render::material::Material;

/// Integer bucket id
pub type BucketId = u32;

/// A range of vertices or indices to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawcall {
    /// Primitive assembly mode
    pub primitive: PrimitiveMode,
    /// First vertex or index
    pub first: u32,
    /// Number of vertices or indices
    pub count: u32,
    /// Whether `first`/`count` address the element buffer
    pub indexed: bool,
}

impl Drawcall {
    /// Drawcall over the element buffer
    pub fn indexed(primitive: PrimitiveMode, first: u32, count: u32) -> Self {
        Self {
            primitive,
            first,
            count,
            indexed: true,
        }
    }

    /// Drawcall over raw vertices
    pub fn arrays(primitive: PrimitiveMode, first: u32, count: u32) -> Self {
        Self {
            primitive,
            first,
            count,
            indexed: false,
        }
    }

    /// Issue the draw with whatever state is bound
    pub fn draw(&self, device: &mut dyn GraphicsDevice) {
        device.draw(self);
    }
}

/// A drawcall with everything needed to render it
#[derive(Debug, Clone)]
pub struct DrawcallInfo {
    /// The draw itself
    pub drawcall: Drawcall,
    /// Material the drawcall was authored with
    pub material: Rc<Material>,
    /// Index into the renderer's world matrix list
    pub world_matrix_index: usize,
    /// Vertex array holding the geometry
    pub vertex_array: VertexArrayId,
}

/// Drawcalls grouped by bucket id
#[derive(Debug, Default)]
pub struct DrawcallBuckets {
    buckets: BTreeMap<BucketId, Vec<DrawcallInfo>>,
}

impl DrawcallBuckets {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a drawcall to a bucket, creating the bucket on first use
    pub fn add(&mut self, bucket: BucketId, info: DrawcallInfo) {
        self.buckets.entry(bucket).or_default().push(info);
    }

    /// Drawcalls of a bucket in insertion order
    ///
    /// A bucket nobody filled is empty.
    pub fn get(&self, bucket: BucketId) -> &[DrawcallInfo] {
        match self.buckets.get(&bucket) {
            Some(drawcalls) => drawcalls,
            None => {
                log::trace!("Bucket {} is empty", bucket);
                &[]
            }
        }
    }

    /// Ids of buckets holding at least one drawcall
    pub fn bucket_ids(&self) -> impl Iterator<Item = BucketId> + '_ {
        self.buckets.iter().filter(|(_, v)| !v.is_empty()).map(|(id, _)| *id)
    }

    /// Iterate every drawcall of every bucket
    pub fn iter(&self) -> impl Iterator<Item = (BucketId, &DrawcallInfo)> {
        self.buckets
            .iter()
            .flat_map(|(id, drawcalls)| drawcalls.iter().map(move |info| (*id, info)))
    }

    /// Total number of entries across buckets
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no bucket holds a drawcall
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty every bucket
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
