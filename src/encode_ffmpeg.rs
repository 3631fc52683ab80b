use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::FrameIndex,
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
    sink::{FrameSink, SinkConfig},
};

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> FramefxResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Duration of an audio file in seconds, via the system `ffprobe` binary.
pub fn probe_audio_duration(source_path: &Path) -> FramefxResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(source_path)
        .output()
        .map_err(|e| FramefxError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(FramefxError::encode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| FramefxError::encode(format!("ffprobe json parse failed: {e}")))?;
    parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| FramefxError::encode("missing or non-positive duration from ffprobe"))
}

/// Frame sink that streams raw `rgb24` frames to the system `ffmpeg` binary,
/// muxing an optional audio track, and produces an H.264 MP4.
///
/// We intentionally shell out to `ffmpeg` rather than linking FFmpeg libs to
/// avoid native dev header/lib requirements.
#[derive(Debug, Default)]
pub struct FfmpegSink {
    out_path: PathBuf,
    overwrite: bool,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_len: usize,
}

impl FfmpegSink {
    pub fn new(out_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite,
            child: None,
            stdin: None,
            frame_len: 0,
        }
    }

    fn validate(&self, cfg: &SinkConfig) -> FramefxResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(FramefxError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            // Default settings target yuv420p output for maximum compatibility.
            return Err(FramefxError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if cfg.fps.den != 1 {
            return Err(FramefxError::validation(
                "mp4 encoding currently requires integer fps (fps.den == 1)",
            ));
        }
        if !self.overwrite && self.out_path.exists() {
            return Err(FramefxError::validation(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> FramefxResult<()> {
        self.validate(&cfg)?;
        ensure_parent_dir(&self.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(FramefxError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.num.to_string(),
            "-i",
            "pipe:0",
        ]);
        if let Some(audio) = &cfg.audio {
            cmd.arg("-i").arg(audio);
        }
        cmd.args(["-c:v", "libx264", "-preset", "ultrafast", "-pix_fmt", "yuv420p"]);
        if cfg.audio.is_some() {
            cmd.args(["-c:a", "aac", "-shortest"]);
        }
        cmd.args(["-movflags", "+faststart"]).arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            FramefxError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FramefxError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        self.frame_len = (cfg.width as usize) * (cfg.height as usize) * 3;
        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRgb) -> FramefxResult<()> {
        if frame.data.len() != self.frame_len {
            return Err(FramefxError::validation(
                "frame size mismatch with encoder configuration",
            ));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FramefxError::encode("ffmpeg sink is not started"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            FramefxError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn end(&mut self) -> FramefxResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Err(FramefxError::encode("ffmpeg sink is not started"));
        };
        let output = child.wait_with_output().map_err(|e| {
            FramefxError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FramefxError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
