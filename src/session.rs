use crate::{
    core::{Canvas, Fps, FrameIndex},
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
    sink::{FrameSink, SinkConfig},
    stage::{EffectPipeline, StageCtx},
};

/// One video to render: a still base frame repeated for `total_frames`,
/// transformed per frame by the pipeline.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub video_id: String,
    pub base: FrameRgb,
    pub total_frames: u64,
    /// Optional audio track path handed to the sink.
    pub audio: Option<std::path::PathBuf>,
}

impl RenderJob {
    /// Build a job whose length matches its audio track: the track's probed
    /// duration is floored to whole frames at `fps` (at least one frame), and
    /// the track is muxed by the sink.
    pub fn for_audio_track(
        video_id: impl Into<String>,
        base: FrameRgb,
        audio: std::path::PathBuf,
        fps: Fps,
    ) -> FramefxResult<Self> {
        let secs = crate::encode_ffmpeg::probe_audio_duration(&audio)?;
        let total_frames = fps.secs_to_frames_floor(secs).max(1);
        Ok(Self {
            video_id: video_id.into(),
            base,
            total_frames,
            audio: Some(audio),
        })
    }
}

/// Counters for a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub completed: u64,
    pub failed: u64,
}

/// Per-run owner of the pipeline and all stage state.
///
/// One session drives one batch sequentially; concurrent videos need separate
/// sessions, otherwise stage state (notably the particle field) is shared and
/// corrupted across runs. Execution is strictly frame-synchronous: frame
/// `i+1` is not touched until frame `i` has passed every stage and reached
/// the sink.
pub struct RunSession {
    canvas: Canvas,
    fps: Fps,
    pipeline: EffectPipeline,
}

impl RunSession {
    pub fn new(canvas: Canvas, fps: Fps, pipeline: EffectPipeline) -> FramefxResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(FramefxError::validation("canvas must be non-empty"));
        }
        Ok(Self {
            canvas,
            fps,
            pipeline,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Render one video into `sink`.
    ///
    /// Stage failures are tolerated per frame (the frame passes through
    /// unchanged); sink failures and a mismatched base frame are fatal for
    /// this video.
    #[tracing::instrument(skip(self, job, sink), fields(video_id = %job.video_id))]
    pub fn run(&mut self, job: &RenderJob, sink: &mut dyn FrameSink) -> FramefxResult<()> {
        if job.base.canvas() != self.canvas {
            return Err(FramefxError::validation(format!(
                "base frame is {}x{}, session canvas is {}x{}",
                job.base.width, job.base.height, self.canvas.width, self.canvas.height
            )));
        }
        if job.total_frames == 0 {
            return Err(FramefxError::validation("total_frames must be > 0"));
        }

        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            audio: job.audio.clone(),
        })?;

        for f in 0..job.total_frames {
            let ctx = StageCtx {
                frame_index: FrameIndex(f),
                fps: self.fps,
                video_id: &job.video_id,
                canvas: self.canvas,
            };
            let mut frame = job.base.clone();
            let failed = self.pipeline.process_frame(&mut frame, &ctx);
            if failed > 0 {
                tracing::debug!(frame = f, failed, "frame finished with skipped stages");
            }
            sink.push_frame(FrameIndex(f), &frame)?;
        }

        sink.end()
    }

    /// Render a batch of videos sequentially.
    ///
    /// A failed video (unreadable base, sink error) is logged and does not
    /// stop the remaining videos.
    pub fn run_batch<F>(&mut self, jobs: &[RenderJob], mut make_sink: F) -> BatchStats
    where
        F: FnMut(&RenderJob) -> FramefxResult<Box<dyn FrameSink>>,
    {
        let mut stats = BatchStats::default();
        for job in jobs {
            let outcome = make_sink(job).and_then(|mut sink| self.run(job, sink.as_mut()));
            match outcome {
                Ok(()) => stats.completed += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(
                        video_id = %job.video_id,
                        error = %e,
                        "video run failed; continuing with the rest of the batch"
                    );
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn canvas() -> Canvas {
        Canvas {
            width: 8,
            height: 8,
        }
    }

    fn job(id: &str, frames: u64) -> RenderJob {
        RenderJob {
            video_id: id.to_string(),
            base: FrameRgb::zeroed(canvas()),
            total_frames: frames,
            audio: None,
        }
    }

    #[test]
    fn run_pushes_one_output_frame_per_input_frame() {
        let mut session =
            RunSession::new(canvas(), Fps::new(30, 1).unwrap(), EffectPipeline::new()).unwrap();
        let mut sink = MemorySink::new();
        session.run(&job("vid-a", 5), &mut sink).unwrap();
        assert_eq!(sink.frames().len(), 5);
        assert_eq!(sink.frames()[4].0, FrameIndex(4));
    }

    #[test]
    fn run_rejects_mismatched_base_frame() {
        let mut session =
            RunSession::new(canvas(), Fps::new(30, 1).unwrap(), EffectPipeline::new()).unwrap();
        let mut bad = job("vid-a", 5);
        bad.base = FrameRgb::zeroed(Canvas {
            width: 4,
            height: 4,
        });
        let mut sink = MemorySink::new();
        assert!(session.run(&bad, &mut sink).is_err());
    }

    #[test]
    fn batch_continues_past_a_failed_video() {
        let mut session =
            RunSession::new(canvas(), Fps::new(30, 1).unwrap(), EffectPipeline::new()).unwrap();
        let mut bad = job("vid-bad", 2);
        bad.base = FrameRgb::zeroed(Canvas {
            width: 2,
            height: 2,
        });
        let jobs = vec![job("vid-a", 2), bad, job("vid-b", 2)];
        let stats = session.run_batch(&jobs, |_| {
            let sink: Box<dyn crate::sink::FrameSink> = Box::new(MemorySink::new());
            Ok(sink)
        });
        assert_eq!(
            stats,
            BatchStats {
                completed: 2,
                failed: 1
            }
        );
    }
}
