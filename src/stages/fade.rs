use std::path::PathBuf;

use crate::{
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
    stage::{Stage, StageCtx},
    variety::VarietyAllocator,
};

/// Brightness-pulse parameters. The gain oscillates between `min_gain` and
/// `max_gain` with phase `frame_index · speed` (frame-indexed, not seconds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeParams {
    pub min_gain: f64,
    pub max_gain: f64,
    pub speed: f64,
}

impl FadeParams {
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.min_gain, self.max_gain, self.speed)
    }

    pub fn parse(key: &str) -> FramefxResult<Self> {
        let parts: Vec<f64> = key
            .split(':')
            .map(|p| p.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| FramefxError::validation(format!("bad fade key '{key}'")))?;
        let [min_gain, max_gain, speed] = parts[..] else {
            return Err(FramefxError::validation(format!("bad fade key '{key}'")));
        };
        Ok(Self {
            min_gain,
            max_gain,
            speed,
        })
    }

    fn gain_at(&self, frame_index: u64) -> f64 {
        let phase = 0.5 + 0.5 * (frame_index as f64 * self.speed).sin();
        self.min_gain + (self.max_gain - self.min_gain) * phase
    }
}

/// Allocator pool: a fixed grid over the original parameter ranges
/// (gain floor 0.6..0.8, ceiling 1.0..1.3, speed 0.01..0.05).
pub fn fade_pool() -> Vec<String> {
    let mut out = Vec::new();
    for min_gain in [0.6, 0.7, 0.8] {
        for max_gain in [1.0, 1.1, 1.2, 1.3] {
            for speed in [0.01, 0.03, 0.05] {
                out.push(
                    FadeParams {
                        min_gain,
                        max_gain,
                        speed,
                    }
                    .key(),
                );
            }
        }
    }
    out
}

/// Pulses the frame's brightness with a per-video sinusoidal gain.
pub struct FadeStage {
    allocator: VarietyAllocator,
    pool: Vec<String>,
}

impl FadeStage {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            allocator: VarietyAllocator::open(store_path),
            pool: fade_pool(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(store_path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            allocator: VarietyAllocator::open_seeded(store_path, seed),
            pool: fade_pool(),
        }
    }
}

impl Stage for FadeStage {
    fn name(&self) -> &str {
        "fade"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        let key = self.allocator.assign(ctx.video_id, &self.pool)?;
        let gain = FadeParams::parse(&key)?.gain_at(ctx.frame_index.0);
        for b in &mut frame.data {
            *b = (f64::from(*b) * gain).round().clamp(0.0, 255.0) as u8;
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

    fn ctx(frame: u64) -> StageCtx<'static> {
        StageCtx {
            frame_index: FrameIndex(frame),
            fps: Fps::new(30, 1).unwrap(),
            video_id: "vid-a",
            canvas: Canvas {
                width: 2,
                height: 2,
            },
        }
    }

    #[test]
    fn pool_keys_round_trip() {
        let pool = fade_pool();
        assert_eq!(pool.len(), 36);
        for key in &pool {
            let params = FadeParams::parse(key).unwrap();
            assert_eq!(params.key(), *key);
            assert!(params.min_gain < params.max_gain);
        }
        assert!(FadeParams::parse("0.6:oops:0.01").is_err());
        assert!(FadeParams::parse("0.6:1.0").is_err());
    }

    #[test]
    fn gain_at_frame_zero_is_the_midpoint() {
        let params = FadeParams {
            min_gain: 0.6,
            max_gain: 1.0,
            speed: 0.03,
        };
        // sin(0) = 0, so the pulse starts halfway between floor and ceiling.
        assert!((params.gain_at(0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn fade_scales_every_channel() {
        let path = temp_store("fade_stage");
        let mut stage = FadeStage::new_seeded(&path, 2);
        let mut frame = FrameRgb::from_raw(1, 1, vec![100, 100, 100]).unwrap();
        stage.apply(&mut frame, &ctx(0)).unwrap();

        let key = stage.allocator.store().assignments.get("vid-a").unwrap();
        let gain = FadeParams::parse(key).unwrap().gain_at(0);
        let want = (100.0 * gain).round() as u8;
        assert_eq!(frame.pixel(0, 0), [want, want, want]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn same_video_same_frame_is_deterministic() {
        let path = temp_store("fade_repeat");
        let mut stage = FadeStage::new_seeded(&path, 2);
        let base = FrameRgb::from_raw(1, 1, vec![37, 120, 255]).unwrap();

        let mut a = base.clone();
        stage.apply(&mut a, &ctx(15)).unwrap();
        let mut b = base.clone();
        stage.apply(&mut b, &ctx(15)).unwrap();
        assert_eq!(a, b);

        std::fs::remove_file(&path).ok();
    }
}
