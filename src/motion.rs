use std::f64::consts::TAU;

use crate::{
    core::{Affine, Canvas, Fps, FrameIndex, Vec2},
    error::{FramefxError, FramefxResult},
};

/// One sinusoidal motion component. Every component is a pure closed-form
/// function of elapsed time `t = frame_index / fps`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MotionComponent {
    Zoom,
    PulseZoom,
    Pan,
    Float,
    DiagonalPan,
    DiagonalFloat,
    Rotate,
    Spiral,
}

impl MotionComponent {
    /// Fixed composition order. Matrices are not commutative; [`compose`]
    /// left-multiplies in exactly this sequence.
    pub const ORDER: [MotionComponent; 8] = [
        MotionComponent::Zoom,
        MotionComponent::PulseZoom,
        MotionComponent::Pan,
        MotionComponent::Float,
        MotionComponent::DiagonalPan,
        MotionComponent::DiagonalFloat,
        MotionComponent::Rotate,
        MotionComponent::Spiral,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MotionComponent::Zoom => "zoom",
            MotionComponent::PulseZoom => "pulse_zoom",
            MotionComponent::Pan => "pan",
            MotionComponent::Float => "float",
            MotionComponent::DiagonalPan => "diag_pan",
            MotionComponent::DiagonalFloat => "diag_float",
            MotionComponent::Rotate => "rotate",
            MotionComponent::Spiral => "spiral",
        }
    }

    pub fn parse(name: &str) -> FramefxResult<Self> {
        MotionComponent::ORDER
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| {
                FramefxError::validation(format!("unknown motion component '{name}'"))
            })
    }

    /// The component's 3x3 matrix at elapsed time `t` seconds.
    fn matrix(self, t: f64, canvas: Canvas) -> Affine {
        let center = canvas.center().to_vec2();
        match self {
            MotionComponent::Zoom => {
                let s = 1.0 + 0.01 * (TAU * 0.1 * t).sin();
                about_center(center, Affine::scale(s))
            }
            MotionComponent::PulseZoom => {
                let s = 1.0 + 0.02 * (TAU * 0.25 * t).sin().abs();
                about_center(center, Affine::scale(s))
            }
            MotionComponent::Pan => {
                let dx = (12.0 * (TAU * 0.06 * t).sin()).trunc();
                Affine::translate(Vec2::new(dx, 0.0))
            }
            MotionComponent::Float => {
                let dy = (10.0 * (TAU * 0.06 * t).sin()).trunc();
                Affine::translate(Vec2::new(0.0, dy))
            }
            MotionComponent::DiagonalPan => {
                let d = (12.0 * (TAU * 0.05 * t).sin()).trunc();
                Affine::translate(Vec2::new(d, d))
            }
            MotionComponent::DiagonalFloat => {
                let d = (10.0 * (TAU * 0.07 * t).sin()).trunc();
                Affine::translate(Vec2::new(-d, d))
            }
            MotionComponent::Rotate => {
                let angle = (2.0 * (TAU * 0.04 * t).sin()).to_radians();
                about_center(center, Affine::rotate(angle))
            }
            MotionComponent::Spiral => {
                let angle = (3.0 * (TAU * 0.03 * t).sin()).to_radians();
                let s = 1.0 + 0.005 * t;
                about_center(center, Affine::rotate(angle) * Affine::scale(s))
            }
        }
    }
}

fn about_center(center: Vec2, inner: Affine) -> Affine {
    Affine::translate(center) * inner * Affine::translate(-center)
}

/// Build the frame's composite affine by left-multiplying the matrices of
/// every enabled component in [`MotionComponent::ORDER`].
///
/// Pure: identical inputs yield a bit-identical matrix. An empty set yields
/// the identity.
pub fn compose(
    enabled: &[MotionComponent],
    frame: FrameIndex,
    fps: Fps,
    canvas: Canvas,
) -> Affine {
    let t = fps.frame_to_secs(frame);
    let mut total = Affine::IDENTITY;
    for component in MotionComponent::ORDER {
        if enabled.contains(&component) {
            total = component.matrix(t, canvas) * total;
        }
    }
    total
}

/// All component subsets of size 1 through 4, each encoded as a stable
/// `+`-joined key in canonical order. This is the allocator pool for motion
/// variety (162 combos for 8 components).
pub fn combo_pool() -> Vec<String> {
    let n = MotionComponent::ORDER.len() as u32;
    let mut out = Vec::new();
    for mask in 1u32..(1 << n) {
        let picked = mask.count_ones();
        if picked == 0 || picked > 4 {
            continue;
        }
        let names: Vec<&str> = MotionComponent::ORDER
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, c)| c.name())
            .collect();
        out.push(names.join("+"));
    }
    out
}

/// Parse a combo key produced by [`combo_pool`] back into its components.
pub fn parse_combo(key: &str) -> FramefxResult<Vec<MotionComponent>> {
    key.split('+').map(MotionComponent::parse).collect()
}
