use std::{collections::BTreeMap, path::Path};

use image::AnimationDecoder as _;

use crate::{
    error::{FramefxError, FramefxResult},
    frame::SpriteRgba,
};

/// A pre-decoded RGBA frame sequence at a fixed target width, indexed by an
/// elapsed-time window during playback.
#[derive(Clone, Debug)]
pub struct SpriteSequence {
    pub frames: Vec<SpriteRgba>,
}

impl SpriteSequence {
    /// Frame for `elapsed` seconds into a window starting at `start_sec` and
    /// lasting `duration_sec`. `None` outside the window.
    pub fn frame_at(&self, elapsed: f64, start_sec: f64, duration_sec: f64) -> Option<&SpriteRgba> {
        if self.frames.is_empty() || elapsed < start_sec || duration_sec <= 0.0 {
            return None;
        }
        let local = elapsed - start_sec;
        let idx = ((local / duration_sec) * self.frames.len() as f64) as usize;
        self.frames.get(idx)
    }
}

/// Decode every `.gif` in `dir` into a sequence scaled to
/// `video_width · ratio`, keyed by file name.
///
/// A missing directory or an undecodable file is not fatal: the file is
/// skipped with a warning and the remaining sprites still load.
pub fn load_sprite_dir(
    dir: &Path,
    video_width: u32,
    ratio: f64,
) -> FramefxResult<BTreeMap<String, SpriteSequence>> {
    let mut out = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "sprite directory not readable");
            return Ok(out);
        }
    };

    let target_width = ((f64::from(video_width) * ratio) as u32).max(1);
    for entry in entries {
        let entry = entry.map_err(|e| FramefxError::validation(format!("read_dir failed: {e}")))?;
        let path = entry.path();
        let is_gif = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
        if !is_gif {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match load_gif(&path, target_width) {
            Ok(seq) if !seq.frames.is_empty() => {
                out.insert(name, seq);
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "sprite gif has no frames; skipping");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to decode sprite gif; skipping");
            }
        }
    }
    Ok(out)
}

fn load_gif(path: &Path, target_width: u32) -> FramefxResult<SpriteSequence> {
    let file = std::fs::File::open(path)
        .map_err(|e| FramefxError::validation(format!("open '{}': {e}", path.display())))?;
    let decoder = image::codecs::gif::GifDecoder::new(std::io::BufReader::new(file))
        .map_err(|e| FramefxError::validation(format!("gif decode '{}': {e}", path.display())))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| FramefxError::validation(format!("gif frames '{}': {e}", path.display())))?;

    let mut out = Vec::with_capacity(frames.len());
    for frame in frames {
        let buf = frame.into_buffer();
        if buf.width() == 0 || buf.height() == 0 {
            continue;
        }
        let scale = f64::from(target_width) / f64::from(buf.width());
        let target_height = ((f64::from(buf.height()) * scale) as u32).max(1);
        let resized = image::imageops::resize(
            &buf,
            target_width,
            target_height,
            image::imageops::FilterType::Lanczos3,
        );
        let (w, h) = (resized.width(), resized.height());
        out.push(SpriteRgba::from_raw(w, h, resized.into_raw())?);
    }
    Ok(SpriteSequence { frames: out })
}
