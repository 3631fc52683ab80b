use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use crate::{
    composite::overlay_sprite,
    error::FramefxResult,
    frame::FrameRgb,
    sprite::SpriteSequence,
    stage::{Stage, StageCtx},
    variety::VarietyAllocator,
};

/// Placement window for the overlay, in seconds of elapsed playback.
#[derive(Clone, Copy, Debug)]
pub struct OverlayWindow {
    pub start_sec: f64,
    pub duration_sec: f64,
}

impl Default for OverlayWindow {
    fn default() -> Self {
        Self {
            start_sec: 1.0,
            duration_sec: 5.0,
        }
    }
}

/// Overlays one sprite sequence per video, bottom-right with a fixed margin,
/// only inside its time window. The sequence is chosen per video id via the
/// allocator so consecutive videos do not repeat until the set is exhausted.
pub struct SpriteOverlayStage {
    allocator: VarietyAllocator,
    sprites: Arc<BTreeMap<String, SpriteSequence>>,
    pool: Vec<String>,
    window: OverlayWindow,
    margin: i64,
    warned_empty: bool,
}

impl SpriteOverlayStage {
    pub fn new(
        store_path: impl Into<PathBuf>,
        sprites: Arc<BTreeMap<String, SpriteSequence>>,
        window: OverlayWindow,
    ) -> Self {
        Self::with_allocator(VarietyAllocator::open(store_path), sprites, window)
    }

    fn with_allocator(
        allocator: VarietyAllocator,
        sprites: Arc<BTreeMap<String, SpriteSequence>>,
        window: OverlayWindow,
    ) -> Self {
        let pool = sprites.keys().cloned().collect();
        Self {
            allocator,
            sprites,
            pool,
            window,
            margin: 12,
            warned_empty: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(
        store_path: impl Into<PathBuf>,
        seed: u64,
        sprites: Arc<BTreeMap<String, SpriteSequence>>,
        window: OverlayWindow,
    ) -> Self {
        Self::with_allocator(VarietyAllocator::open_seeded(store_path, seed), sprites, window)
    }
}

impl Stage for SpriteOverlayStage {
    fn name(&self) -> &str {
        "sprite_overlay"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        if self.sprites.is_empty() {
            if !self.warned_empty {
                self.warned_empty = true;
                tracing::warn!("no sprite sequences loaded; sprite overlay stage is inactive");
            }
            return Ok(());
        }

        let name = self.allocator.assign(ctx.video_id, &self.pool)?;
        let Some(seq) = self.sprites.get(&name) else {
            // An assignment recorded in an earlier run can outlive the asset.
            tracing::warn!(sprite = %name, "assigned sprite sequence is missing; skipping");
            return Ok(());
        };

        let Some(sprite) =
            seq.frame_at(ctx.elapsed_secs(), self.window.start_sec, self.window.duration_sec)
        else {
            return Ok(());
        };

        let x = i64::from(frame.width) - i64::from(sprite.width) - self.margin;
        let y = i64::from(frame.height) - i64::from(sprite.height) - self.margin;
        overlay_sprite(frame, sprite, x, y);
        Ok(())
    }
}
