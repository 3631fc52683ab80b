use std::path::PathBuf;

use crate::{
    blur::gaussian_blur,
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
    stage::{Stage, StageCtx},
    variety::VarietyAllocator,
};

/// Blur-pulse parameters. The kernel oscillates with the frame index:
/// `k = trunc(|max_k · sin(frame_index · speed)|) · 2 + 1`, so it is always
/// odd and collapses to a no-op where the sine crosses zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurParams {
    pub max_k: u32,
    pub speed: f64,
}

impl BlurParams {
    pub fn key(&self) -> String {
        format!("{}:{}", self.max_k, self.speed)
    }

    pub fn parse(key: &str) -> FramefxResult<Self> {
        let bad = || FramefxError::validation(format!("bad blur key '{key}'"));
        let (max_k, speed) = key.split_once(':').ok_or_else(bad)?;
        Ok(Self {
            max_k: max_k.parse().map_err(|_| bad())?,
            speed: speed.parse().map_err(|_| bad())?,
        })
    }

    fn kernel_at(&self, frame_index: u64) -> u32 {
        let osc = (f64::from(self.max_k) * (frame_index as f64 * self.speed).sin()).abs();
        (osc as u32) * 2 + 1
    }
}

/// Allocator pool: a fixed grid over the original parameter ranges
/// (peak kernel 3..7, speed 0.01..0.1).
pub fn blur_pool() -> Vec<String> {
    let mut out = Vec::new();
    for max_k in 3..=7u32 {
        for speed in [0.01, 0.04, 0.07, 0.1] {
            out.push(BlurParams { max_k, speed }.key());
        }
    }
    out
}

/// Softens the frame with a Gaussian blur whose kernel size pulses over time.
pub struct BlurPulseStage {
    allocator: VarietyAllocator,
    pool: Vec<String>,
}

impl BlurPulseStage {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            allocator: VarietyAllocator::open(store_path),
            pool: blur_pool(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(store_path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            allocator: VarietyAllocator::open_seeded(store_path, seed),
            pool: blur_pool(),
        }
    }
}

impl Stage for BlurPulseStage {
    fn name(&self) -> &str {
        "blur_pulse"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        let key = self.allocator.assign(ctx.video_id, &self.pool)?;
        let kernel = BlurParams::parse(&key)?.kernel_at(ctx.frame_index.0);
        if kernel > 1 {
            *frame = gaussian_blur(frame, kernel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Canvas, Fps, FrameIndex};

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "framefx_{name}_{}_{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    fn ctx(frame: u64, canvas: Canvas) -> StageCtx<'static> {
        StageCtx {
            frame_index: FrameIndex(frame),
            fps: Fps::new(30, 1).unwrap(),
            video_id: "vid-a",
            canvas,
        }
    }

    fn checker(canvas: Canvas) -> FrameRgb {
        let mut f = FrameRgb::zeroed(canvas);
        for y in 0..canvas.height {
            for x in 0..canvas.width {
                if (x + y) % 2 == 0 {
                    f.set_pixel(x, y, [255, 255, 255]);
                }
            }
        }
        f
    }

    #[test]
    fn pool_keys_round_trip() {
        let pool = blur_pool();
        assert_eq!(pool.len(), 20);
        for key in &pool {
            let params = BlurParams::parse(key).unwrap();
            assert_eq!(params.key(), *key);
        }
        assert!(BlurParams::parse("seven:0.1").is_err());
        assert!(BlurParams::parse("5").is_err());
    }

    #[test]
    fn kernel_is_always_odd_and_bounded() {
        let params = BlurParams {
            max_k: 7,
            speed: 0.1,
        };
        for i in 0..500 {
            let k = params.kernel_at(i);
            assert_eq!(k % 2, 1);
            assert!(k <= 15);
        }
        // Zero phase collapses to the identity kernel.
        assert_eq!(params.kernel_at(0), 1);
    }

    #[test]
    fn frame_zero_passes_through_and_peak_frames_soften() {
        let path = temp_store("blur_stage");
        let canvas = Canvas {
            width: 8,
            height: 8,
        };
        let mut stage = BlurPulseStage::new_seeded(&path, 4);

        let base = checker(canvas);
        let mut at_zero = base.clone();
        stage.apply(&mut at_zero, &ctx(0, canvas)).unwrap();
        assert_eq!(at_zero, base);

        // Find a frame where the assigned pulse is at a nontrivial kernel.
        let key = stage.allocator.store().assignments.get("vid-a").unwrap();
        let params = BlurParams::parse(key).unwrap();
        let peak = (0..2000).find(|i| params.kernel_at(*i) > 1).unwrap();
        let mut at_peak = base.clone();
        stage.apply(&mut at_peak, &ctx(peak, canvas)).unwrap();
        assert_ne!(at_peak, base);

        std::fs::remove_file(&path).ok();
    }
}
