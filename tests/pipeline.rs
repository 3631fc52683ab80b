use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use framefx::stages::{builtin_registry, BuiltinStageConfig, OverlayWindow};
use framefx::{
    AssignmentStore, Canvas, EffectPipeline, Fps, FrameRgb, FramefxResult, MemorySink, RenderJob,
    RunSession, Stage, StageCtx, VarietyAllocator,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "framefx_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn canvas() -> Canvas {
    Canvas {
        width: 64,
        height: 64,
    }
}

fn gradient_base(canvas: Canvas) -> FrameRgb {
    let mut base = FrameRgb::zeroed(canvas);
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            base.set_pixel(x, y, [(x * 3) as u8, (y * 3) as u8, 60]);
        }
    }
    base
}

fn job(id: &str, base: &FrameRgb, frames: u64) -> RenderJob {
    RenderJob {
        video_id: id.to_string(),
        base: base.clone(),
        total_frames: frames,
        audio: None,
    }
}

#[test]
fn builtin_pipeline_renders_a_full_video_run() {
    init_tracing();
    let dir = temp_dir("builtin_run");
    let registry = builtin_registry(BuiltinStageConfig {
        store_dir: dir.clone(),
        sprites: Arc::new(BTreeMap::new()),
        overlay_window: OverlayWindow::default(),
    });
    let pipeline = registry
        .build_pipeline(&["motion", "particles", "fade", "blur_pulse", "sprite_overlay"])
        .unwrap();

    let base = gradient_base(canvas());
    let mut session = RunSession::new(canvas(), Fps::new(30, 1).unwrap(), pipeline).unwrap();
    let mut sink = MemorySink::new();
    session.run(&job("vid-a", &base, 30), &mut sink).unwrap();

    assert_eq!(sink.frames().len(), 30);
    for (_, frame) in sink.frames() {
        assert_eq!(frame.canvas(), canvas());
    }
    // The particle layer is additive over the gradient, so output differs
    // from the bare base on at least some frames.
    assert!(sink.frames().iter().any(|(_, f)| *f != base));

    // Each stage persisted its own store file.
    assert!(dir.join("motion_usage.json").exists());
    assert!(dir.join("particle_usage.json").exists());
    assert!(dir.join("fade_usage.json").exists());
    assert!(dir.join("blur_usage.json").exists());

    std::fs::remove_dir_all(&dir).ok();
}

/// Tints every frame with the channel assigned to the video by the allocator.
struct TintStage {
    allocator: VarietyAllocator,
    pool: Vec<String>,
}

impl TintStage {
    fn new(store_path: PathBuf, pool: &[&str]) -> Self {
        Self {
            allocator: VarietyAllocator::open_seeded(store_path, 21),
            pool: pool.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Stage for TintStage {
    fn name(&self) -> &str {
        "tint"
    }

    fn apply(&mut self, frame: &mut FrameRgb, ctx: &StageCtx) -> FramefxResult<()> {
        let channel = match self.allocator.assign(ctx.video_id, &self.pool)?.as_str() {
            "red" => 0,
            "green" => 1,
            _ => 2,
        };
        for px in frame.data.chunks_exact_mut(3) {
            px[channel] = px[channel].saturating_add(80);
        }
        Ok(())
    }
}

#[test]
fn one_second_runs_over_pool_of_three_repeat_exactly_on_the_fourth_video() {
    init_tracing();
    let dir = temp_dir("four_videos");
    let store_path = dir.join("tint_usage.json");
    let pool = ["red", "green", "blue"];

    let mut pipeline = EffectPipeline::new();
    pipeline.push(Box::new(TintStage::new(store_path.clone(), &pool)));
    let mut session = RunSession::new(canvas(), Fps::new(30, 1).unwrap(), pipeline).unwrap();

    let base = gradient_base(canvas());
    for v in 0..4usize {
        let mut sink = MemorySink::new();
        session
            .run(&job(&format!("vid-{v}"), &base, 30), &mut sink)
            .unwrap();
        assert_eq!(sink.frames().len(), 30);

        let store = AssignmentStore::load_or_default(&store_path);
        if v < 3 {
            // First cycle: all assignments so far are distinct.
            let distinct: BTreeSet<_> = store.assignments.values().collect();
            assert_eq!(distinct.len(), v + 1);
            assert_eq!(store.cycle_count, 0);
        }
    }

    let store = AssignmentStore::load_or_default(&store_path);
    assert_eq!(store.assignments.len(), 4);
    assert_eq!(store.cycle_count, 1);

    // Exactly one repeat among the four assignments, introduced by the 4th
    // video, drawn from the full pool of three.
    let values: Vec<&String> = store.assignments.values().collect();
    let distinct: BTreeSet<_> = values.iter().collect();
    assert_eq!(distinct.len(), 3);
    let fourth = store.assignments.get("vid-3").unwrap();
    assert!(pool.contains(&fourth.as_str()));
    let first_three: BTreeSet<_> = (0..3)
        .map(|v| store.assignments.get(&format!("vid-{v}")).unwrap())
        .collect();
    assert_eq!(first_three.len(), 3);
    assert!(first_three.contains(fourth));

    std::fs::remove_dir_all(&dir).ok();
}

/// Writes a one-second PCM wav (8 kHz mono 16-bit silence) for probing.
fn write_silence_wav(path: &std::path::Path) {
    let sample_rate: u32 = 8000;
    let data_len: u32 = sample_rate * 2; // one second of 16-bit mono
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // pcm
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn job_length_follows_the_audio_track_duration() {
    if !framefx::is_ffprobe_on_path() {
        eprintln!("skipping: ffprobe not on PATH");
        return;
    }
    init_tracing();
    let dir = temp_dir("audio_length");
    let wav = dir.join("track.wav");
    write_silence_wav(&wav);

    let base = gradient_base(canvas());
    let fps = Fps::new(30, 1).unwrap();
    let job = RenderJob::for_audio_track("vid-a", base, wav.clone(), fps).unwrap();
    // One second of audio at 30 fps floors to exactly 30 frames.
    assert_eq!(job.total_frames, 30);
    assert_eq!(job.audio.as_deref(), Some(wav.as_path()));

    // The derived job drives a full run, and the sink sees the track.
    let mut session = RunSession::new(canvas(), fps, EffectPipeline::new()).unwrap();
    let mut sink = MemorySink::new();
    session.run(&job, &mut sink).unwrap();
    assert_eq!(sink.frames().len(), 30);
    assert_eq!(sink.config().unwrap().audio.as_deref(), Some(wav.as_path()));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn per_video_stores_do_not_interfere() {
    let dir = temp_dir("separate_stores");
    let registry = builtin_registry(BuiltinStageConfig {
        store_dir: dir.clone(),
        sprites: Arc::new(BTreeMap::new()),
        overlay_window: OverlayWindow::default(),
    });
    let pipeline = registry.build_pipeline(&["motion", "particles"]).unwrap();

    let base = gradient_base(canvas());
    let mut session = RunSession::new(canvas(), Fps::new(30, 1).unwrap(), pipeline).unwrap();
    let jobs = vec![job("vid-a", &base, 10), job("vid-b", &base, 10)];
    let stats = session.run_batch(&jobs, |_| {
        let sink: Box<dyn framefx::FrameSink> = Box::new(MemorySink::new());
        Ok(sink)
    });
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 0);

    let motion = AssignmentStore::load_or_default(&dir.join("motion_usage.json"));
    let particles = AssignmentStore::load_or_default(&dir.join("particle_usage.json"));
    assert_eq!(motion.assignments.len(), 2);
    assert_eq!(particles.assignments.len(), 2);
    // One pool per effect type: motion combos never leak into particle store.
    for item in particles.assignments.values() {
        assert!(!item.contains('+'));
    }

    std::fs::remove_dir_all(&dir).ok();
}
