//! Built-in stages and their registry wiring.

pub mod blur;
pub mod fade;
pub mod motion;
pub mod particles;
pub mod sprite;

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use crate::{
    sprite::SpriteSequence,
    stage::{Stage, StageRegistry},
};

pub use blur::{blur_pool, BlurParams, BlurPulseStage};
pub use fade::{fade_pool, FadeParams, FadeStage};
pub use motion::MotionStage;
pub use particles::{ParticleStage, PARTICLE_BLEND_OPACITY};
pub use sprite::{OverlayWindow, SpriteOverlayStage};

/// Static configuration for the built-in stages.
///
/// Each stage persists its assignments in its own store file under
/// `store_dir`, one store per pool/effect type.
#[derive(Clone, Debug)]
pub struct BuiltinStageConfig {
    pub store_dir: PathBuf,
    pub sprites: Arc<BTreeMap<String, SpriteSequence>>,
    pub overlay_window: OverlayWindow,
}

/// Register the built-in stages ("blur_pulse", "fade", "motion", "particles",
/// "sprite_overlay") into a fresh registry.
pub fn builtin_registry(cfg: BuiltinStageConfig) -> StageRegistry {
    let mut registry = StageRegistry::new();

    let store_dir = cfg.store_dir.clone();
    registry.register("blur_pulse", move || {
        Ok(Box::new(BlurPulseStage::new(store_dir.join("blur_usage.json"))) as Box<dyn Stage>)
    });

    let store_dir = cfg.store_dir.clone();
    registry.register("fade", move || {
        Ok(Box::new(FadeStage::new(store_dir.join("fade_usage.json"))) as Box<dyn Stage>)
    });

    let store_dir = cfg.store_dir.clone();
    registry.register("motion", move || {
        Ok(Box::new(MotionStage::new(store_dir.join("motion_usage.json"))) as Box<dyn Stage>)
    });

    let store_dir = cfg.store_dir.clone();
    registry.register("particles", move || {
        Ok(
            Box::new(ParticleStage::new(store_dir.join("particle_usage.json")))
                as Box<dyn Stage>,
        )
    });

    let store_dir = cfg.store_dir;
    let sprites = cfg.sprites;
    let window = cfg.overlay_window;
    registry.register("sprite_overlay", move || {
        Ok(Box::new(SpriteOverlayStage::new(
            store_dir.join("sprite_usage.json"),
            Arc::clone(&sprites),
            window,
        )) as Box<dyn Stage>)
    });

    registry
}
