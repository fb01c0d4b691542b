//! # Dither Overlay Pass
//!
//! Draws the drawcalls of one bucket a second time with a single overlay
//! material. With the forward pass having written stencil 1 where the marker
//! object (the flag) landed, an overlay material testing `stencil == 1` and
//! `depth != stored` only shows on pixels where the overlaid object sits
//! behind the marker.
//!
//! The [`OverlayFilter`] limits which drawcalls of the bucket are
//! overlaid, so a bucket can hold geometry that should not receive the
//! effect. The filter has no default and is chosen when the pass is built.

use std::rc::Rc;

use crate::render::device::ProgramId;
use crate::render::drawcall::{BucketId, DrawcallInfo};
use crate::render::material::Material;
use crate::render::passes::{FrameContext, RenderPass};
use crate::render::RenderResult;

/// Selects the drawcalls an overlay is drawn over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayFilter {
    /// Every drawcall in the bucket
    All,
    /// Drawcalls whose own material uses this program
    SourceProgram(ProgramId),
    /// Drawcalls whose own material has this name
    SourceMaterial(String),
}

impl OverlayFilter {
    /// Whether the drawcall receives the overlay
    pub fn accepts(&self, info: &DrawcallInfo) -> bool {
        match self {
            Self::All => true,
            Self::SourceProgram(program) => info.material.program().id() == *program,
            Self::SourceMaterial(name) => info.material.name() == name,
        }
    }
}

/// Redraws a bucket with one overlay material
#[derive(Debug, Clone)]
pub struct DitherOverlayPass {
    bucket: BucketId,
    material: Rc<Material>,
    filter: OverlayFilter,
}

impl DitherOverlayPass {
    /// Overlay the drawcalls of `bucket` that `filter` accepts
    pub fn new(bucket: BucketId, material: Rc<Material>, filter: OverlayFilter) -> Self {
        Self {
            bucket,
            material,
            filter,
        }
    }

    /// Drawcall selection
    pub fn filter(&self) -> &OverlayFilter {
        &self.filter
    }

    /// Overlay material
    pub fn material(&self) -> &Rc<Material> {
        &self.material
    }
}

impl RenderPass for DitherOverlayPass {
    fn name(&self) -> &str {
        "dither-overlay"
    }

    fn required_programs(&self) -> Vec<ProgramId> {
        vec![self.material.program().id()]
    }

    fn render(&self, frame: &mut FrameContext<'_>) -> RenderResult<()> {
        let drawcalls = frame.drawcalls(self.bucket);
        let mut skipped = 0;
        for info in drawcalls {
            if !self.filter.accepts(info) {
                skipped += 1;
                continue;
            }
            frame.prepare_drawcall(info, &self.material)?;
            frame.draw_lit(info, &self.material)?;
        }
        log::trace!(
            "Dither overlay: {} of {} drawcalls in bucket {} filtered out",
            skipped,
            drawcalls.len(),
            self.bucket
        );
        Ok(())
    }
}
