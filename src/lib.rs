//! framefx is a per-frame visual-effects pipeline for batch video generation.
//!
//! A sequence of independent stages transforms one RGB frame buffer into
//! another, driven by frame index and playback rate. Stages that need a
//! stable, non-repeating choice of preset per output video consult a durable
//! variety allocator.
//!
//! # Pipeline overview
//!
//! 1. **Allocate**: [`VarietyAllocator`] assigns each video id a unique pool
//!    item (motion combo, particle preset, sprite) and rotates the pool once
//!    exhausted; assignments persist across process restarts.
//! 2. **Transform**: each frame passes every registered [`Stage`] in fixed
//!    order: composite affine motion ([`compose`] + [`warp_affine`]),
//!    bouncing particle fields ([`ParticleSimulator`]), sprite overlays.
//! 3. **Sink**: finished frames stream in timeline order into a
//!    [`FrameSink`], typically [`FfmpegSink`] muxing an audio track into an
//!    MP4.
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Frame-synchronous**: frame `i+1` is not processed until frame `i` has
//!   passed every stage and been handed to the sink.
//! - **Failure-tolerant stages**: a failing stage is logged and skipped for
//!   that frame; the run never aborts because of one stage.
//! - **No global state**: every run owns its state through a [`RunSession`];
//!   stage implementations come from an explicit [`StageRegistry`].
#![forbid(unsafe_code)]

mod blur;
mod composite;
mod core;
mod encode_ffmpeg;
mod error;
mod frame;
mod motion;
mod particles;
mod session;
mod sink;
mod sprite;
mod stage;
mod variety;
mod warp;

/// Built-in stage implementations and registry wiring.
pub mod stages;

pub use blur::gaussian_blur;
pub use composite::{blend_layer, overlay_sprite};
pub use core::{Affine, Canvas, Fps, FrameIndex, Point, Rgb8, Vec2};
pub use encode_ffmpeg::{
    ensure_parent_dir, is_ffmpeg_on_path, is_ffprobe_on_path, probe_audio_duration, FfmpegSink,
};
pub use error::{FramefxError, FramefxResult};
pub use frame::{FrameRgb, SpriteRgba};
pub use motion::{combo_pool, compose, parse_combo, MotionComponent};
pub use particles::{builtin_presets, Particle, ParticleSimulator, PresetConfig};
pub use session::{BatchStats, RenderJob, RunSession};
pub use sink::{FrameSink, MemorySink, SinkConfig};
pub use sprite::{load_sprite_dir, SpriteSequence};
pub use stage::{EffectPipeline, Stage, StageCtx, StageRegistry};
pub use variety::{AssignmentStore, VarietyAllocator};
pub use warp::warp_affine;
