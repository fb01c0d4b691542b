//! Forward pass drawing a bucket with each drawcall's own material

use crate::render::drawcall::BucketId;
use crate::render::passes::{FrameContext, RenderPass};
use crate::render::RenderResult;

/// Draws every drawcall of a bucket with its own material
#[derive(Debug, Clone)]
pub struct ForwardPass {
    bucket: BucketId,
}

impl ForwardPass {
    /// Create a pass over `bucket`
    pub fn new(bucket: BucketId) -> Self {
        Self { bucket }
    }

    /// Bucket this pass consumes
    pub fn bucket(&self) -> BucketId {
        self.bucket
    }
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &str {
        "forward"
    }

    fn render(&self, frame: &mut FrameContext<'_>) -> RenderResult<()> {
        let drawcalls = frame.drawcalls(self.bucket);
        log::trace!("Forward pass: {} drawcalls in bucket {}", drawcalls.len(), self.bucket);
        for info in drawcalls {
            frame.prepare_drawcall(info, &info.material)?;
            frame.draw_lit(info, &info.material)?;
        }
        Ok(())
    }
}
