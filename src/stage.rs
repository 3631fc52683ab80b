use std::collections::BTreeMap;

use crate::{
    core::{Canvas, Fps, FrameIndex},
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
};

/// Per-frame metadata handed to every stage.
#[derive(Clone, Copy, Debug)]
pub struct StageCtx<'a> {
    pub frame_index: FrameIndex,
    pub fps: Fps,
    pub video_id: &'a str,
    pub canvas: Canvas,
}

impl StageCtx<'_> {
    /// Elapsed playback time, in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.fps.frame_to_secs(self.frame_index)
    }
}

/// One unit of per-frame transformation. Stages mutate the frame in place and
/// must preserve its dimensions and channel depth.
pub trait Stage {
    fn name(&self) -> &str;

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()>;
}

/// Ordered, synchronous stage list.
///
/// Stages run strictly in registration order, each consuming the previous
/// stage's output. A failing stage is logged and skipped for that frame; the
/// unmodified incoming frame is passed to the next stage. Processing never
/// aborts the run.
#[derive(Default)]
pub struct EffectPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl EffectPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over `frame` for the given context. Returns the number
    /// of stages that failed (and were skipped).
    pub fn process_frame(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> usize {
        let mut failed = 0usize;
        for stage in &mut self.stages {
            // Stages work on a scratch copy so a mid-stage failure cannot
            // leave a half-applied frame behind.
            let mut scratch = frame.clone();
            match stage.apply(&mut scratch, ctx) {
                Ok(()) => *frame = scratch,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        stage = stage.name(),
                        video_id = ctx.video_id,
                        frame = ctx.frame_index.0,
                        error = %e,
                        "stage failed; frame passed through unchanged"
                    );
                }
            }
        }
        failed
    }
}

type StageFactory = Box<dyn Fn() -> FramefxResult<Box<dyn Stage>>>;

/// Explicit stage registry: name → factory, populated at startup from static
/// configuration. There is no runtime discovery of stage implementations.
#[derive(Default)]
pub struct StageRegistry {
    factories: BTreeMap<String, StageFactory>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> FramefxResult<Box<dyn Stage>> + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a pipeline running the named stages in the given order.
    pub fn build_pipeline(&self, stage_names: &[&str]) -> FramefxResult<EffectPipeline> {
        let mut pipeline = EffectPipeline::new();
        for name in stage_names {
            let factory = self.factories.get(*name).ok_or_else(|| {
                FramefxError::validation(format!("unknown stage '{name}' (not registered)"))
            })?;
            pipeline.push(factory()?);
        }
        Ok(pipeline)
    }
}
