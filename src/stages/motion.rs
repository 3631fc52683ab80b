use std::path::PathBuf;

use crate::{
    error::FramefxResult,
    frame::FrameRgb,
    motion::{combo_pool, compose, parse_combo},
    stage::{Stage, StageCtx},
    variety::VarietyAllocator,
    warp::warp_affine,
};

/// Warps each frame with a composite sinusoidal affine. The component combo
/// is drawn once per video id from the size-1..4 power set and is stable for
/// the video's entire duration.
pub struct MotionStage {
    allocator: VarietyAllocator,
    pool: Vec<String>,
}

impl MotionStage {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            allocator: VarietyAllocator::open(store_path),
            pool: combo_pool(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(store_path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            allocator: VarietyAllocator::open_seeded(store_path, seed),
            pool: combo_pool(),
        }
    }
}

impl Stage for MotionStage {
    fn name(&self) -> &str {
        "motion"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        let key = self.allocator.assign(ctx.video_id, &self.pool)?;
        let components = parse_combo(&key)?;
        let m = compose(&components, ctx.frame_index, ctx.fps, ctx.canvas);
        *frame = warp_affine(frame, m)?;
        Ok(())
    }
}
