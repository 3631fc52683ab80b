use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    core::{Canvas, Rgb8},
    frame::FrameRgb,
};

/// Immutable particle-field preset. Selected once per video; changing it
/// requires tearing the simulator down and reinitializing (no hot swap).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PresetConfig {
    pub count: usize,
    pub max_speed: f64,
    pub max_size: f64,
    pub color: Rgb8,
}

/// The ten built-in presets, keyed by stable names used as the allocator pool.
pub fn builtin_presets() -> Vec<(&'static str, PresetConfig)> {
    fn preset(count: usize, max_speed: f64, max_size: f64, color: Rgb8) -> PresetConfig {
        PresetConfig {
            count,
            max_speed,
            max_size,
            color,
        }
    }

    vec![
        ("blue_wave", preset(100, 1.0, 2.0, Rgb8::new(100, 150, 255))),
        ("red_flare", preset(80, 1.5, 3.0, Rgb8::new(255, 80, 80))),
        ("green_spark", preset(120, 0.8, 2.0, Rgb8::new(80, 255, 100))),
        ("purple_glow", preset(90, 1.2, 3.0, Rgb8::new(180, 80, 255))),
        ("gold_trail", preset(70, 1.0, 4.0, Rgb8::new(255, 215, 0))),
        ("cyan_ripple", preset(110, 0.9, 2.0, Rgb8::new(0, 255, 255))),
        ("pink_drift", preset(85, 1.3, 3.0, Rgb8::new(255, 100, 255))),
        ("orange_burst", preset(95, 1.1, 3.0, Rgb8::new(255, 165, 0))),
        ("white_flash", preset(105, 1.0, 2.0, Rgb8::new(255, 255, 255))),
        ("teal_wave", preset(100, 1.2, 2.0, Rgb8::new(0, 128, 128))),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub speed: f64,
}

/// Fixed-size particle field over one canvas, advanced one step per frame.
///
/// The field is owned by exactly one simulator; a preset change destroys it
/// (see [`ParticleSimulator::matches`]).
#[derive(Clone, Debug)]
pub struct ParticleSimulator {
    canvas: Canvas,
    preset: PresetConfig,
    particles: Vec<Particle>,
}

impl ParticleSimulator {
    /// Deterministically draw `preset.count` particles: positions uniform over
    /// the canvas, radius uniform over `[1, max_size)`, speed uniform over
    /// `[0.5, max_speed)`, heading uniform over `[0, 2π)`.
    pub fn init(canvas: Canvas, preset: PresetConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let particles = (0..preset.count)
            .map(|_| {
                let x = rng.gen_range(0.0..w);
                let y = rng.gen_range(0.0..h);
                let radius = if preset.max_size > 1.0 {
                    rng.gen_range(1.0..preset.max_size)
                } else {
                    1.0
                };
                let speed = if preset.max_speed > 0.5 {
                    rng.gen_range(0.5..preset.max_speed)
                } else {
                    0.5
                };
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                Particle {
                    x,
                    y,
                    vx: angle.cos() * speed,
                    vy: angle.sin() * speed,
                    radius,
                    speed,
                }
            })
            .collect();
        Self {
            canvas,
            preset,
            particles,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn preset(&self) -> &PresetConfig {
        &self.preset
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether this simulator can keep serving the given canvas/preset pair,
    /// compared by value. A mismatch means the caller must reinitialize.
    pub fn matches(&self, canvas: Canvas, preset: &PresetConfig) -> bool {
        self.canvas == canvas && self.preset == *preset
    }

    /// Advance one unit of simulated time.
    ///
    /// Soft bounce: a coordinate leaving `[0, extent)` only flips that axis's
    /// velocity sign. Position is never clamped, so a particle can sit outside
    /// the canvas for a step before its corrected heading brings it back.
    pub fn step(&mut self) {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            if p.x < 0.0 || p.x >= w {
                p.vx = -p.vx;
            }
            if p.y < 0.0 || p.y >= h {
                p.vy = -p.vy;
            }
        }
    }

    /// Draw a filled disc per particle onto `layer` in stable array order,
    /// skipping particles whose rounded position is outside the canvas.
    pub fn render(&self, layer: &mut FrameRgb, color: Rgb8) {
        let w = i64::from(self.canvas.width);
        let h = i64::from(self.canvas.height);
        for p in &self.particles {
            let x = p.x.round() as i64;
            let y = p.y.round() as i64;
            if x < 0 || x >= w || y < 0 || y >= h {
                continue;
            }
            let radius = (p.radius.round() as i64).max(1);
            layer.draw_disc(x, y, radius, color);
        }
    }
}
