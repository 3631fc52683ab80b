use std::path::PathBuf;

use crate::{
    core::{Fps, FrameIndex},
    error::FramefxResult,
    frame::FrameRgb,
};

/// Configuration provided to a [`FrameSink`] at the start of a video run.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Optional audio track to mux alongside the frames.
    pub audio: Option<PathBuf>,
}

/// Sink contract for consuming finished frames in timeline order.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order. The sink
/// is treated as opaque: a stuck sink blocks the whole pipeline, so callers
/// must externally bound run time.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> FramefxResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgb) -> FramefxResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> FramefxResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct MemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRgb)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRgb)] {
        &self.frames
    }
}

impl FrameSink for MemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> FramefxResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgb) -> FramefxResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> FramefxResult<()> {
        Ok(())
    }
}
