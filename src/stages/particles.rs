use std::path::PathBuf;

use xxhash_rust::xxh3::xxh3_64;

use crate::{
    composite::blend_layer,
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
    particles::{builtin_presets, ParticleSimulator, PresetConfig},
    stage::{Stage, StageCtx},
    variety::VarietyAllocator,
};

/// Blend opacity for the particle layer.
pub const PARTICLE_BLEND_OPACITY: f32 = 0.6;

/// Simulates a bouncing particle field and additively blends it over the
/// frame. The preset is drawn once per video id; a preset or canvas change
/// tears the field down and reinitializes it (mid-stream preset switching is
/// deliberately unsupported).
pub struct ParticleStage {
    allocator: VarietyAllocator,
    presets: Vec<(String, PresetConfig)>,
    pool: Vec<String>,
    sim: Option<ParticleSimulator>,
    opacity: f32,
}

impl ParticleStage {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self::with_allocator(VarietyAllocator::open(store_path))
    }

    fn with_allocator(allocator: VarietyAllocator) -> Self {
        let presets: Vec<(String, PresetConfig)> = builtin_presets()
            .into_iter()
            .map(|(name, preset)| (name.to_string(), preset))
            .collect();
        let pool = presets.iter().map(|(name, _)| name.clone()).collect();
        Self {
            allocator,
            presets,
            pool,
            sim: None,
            opacity: PARTICLE_BLEND_OPACITY,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(store_path: impl Into<PathBuf>, seed: u64) -> Self {
        Self::with_allocator(VarietyAllocator::open_seeded(store_path, seed))
    }

    fn preset_named(&self, name: &str) -> FramefxResult<PresetConfig> {
        self.presets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, preset)| *preset)
            .ok_or_else(|| {
                FramefxError::validation(format!("assigned particle preset '{name}' is unknown"))
            })
    }
}

impl Stage for ParticleStage {
    fn name(&self) -> &str {
        "particles"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        let name = self.allocator.assign(ctx.video_id, &self.pool)?;
        let preset = self.preset_named(&name)?;

        let needs_init = !self
            .sim
            .as_ref()
            .is_some_and(|sim| sim.matches(ctx.canvas, &preset));
        if needs_init {
            let seed = xxh3_64(ctx.video_id.as_bytes());
            self.sim = Some(ParticleSimulator::init(ctx.canvas, preset, seed));
        }
        let sim = self
            .sim
            .as_mut()
            .ok_or_else(|| FramefxError::render("particle simulator unavailable"))?;

        let mut layer = FrameRgb::zeroed(ctx.canvas);
        sim.render(&mut layer, preset.color);
        sim.step();
        blend_layer(frame, &layer, self.opacity)
    }
}
