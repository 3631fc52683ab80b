use crate::{
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
};

/// Separable Gaussian blur with an odd square kernel.
///
/// Sigma is derived from the kernel size as `0.3·((k-1)/2 - 1) + 0.8`, the
/// same default used when only a kernel size is given. A kernel of 1 is a
/// no-op. Samples past an edge mirror around the edge pixel without
/// duplicating it.
pub fn gaussian_blur(src: &FrameRgb, kernel: u32) -> FramefxResult<FrameRgb> {
    if kernel.is_multiple_of(2) {
        return Err(FramefxError::render("blur kernel size must be odd"));
    }
    if kernel == 1 {
        return Ok(src.clone());
    }

    let weights = gaussian_weights(kernel);
    let radius = (kernel / 2) as i64;
    let w = i64::from(src.width);
    let h = i64::from(src.height);

    // Horizontal pass into an f64 intermediate, then vertical pass.
    let row_len = (src.width as usize) * 3;
    let mut mid = vec![0f64; row_len * src.height as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f64; 3];
            for (i, wt) in weights.iter().enumerate() {
                let sx = reflect_101(x + i as i64 - radius, w);
                let px = src.pixel(sx, y as u32);
                for c in 0..3 {
                    acc[c] += f64::from(px[c]) * wt;
                }
            }
            let o = (y as usize) * row_len + (x as usize) * 3;
            mid[o..o + 3].copy_from_slice(&acc);
        }
    }

    let mut dst = FrameRgb::zeroed(src.canvas());
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f64; 3];
            for (i, wt) in weights.iter().enumerate() {
                let sy = reflect_101(y + i as i64 - radius, h);
                let o = (sy as usize) * row_len + (x as usize) * 3;
                for c in 0..3 {
                    acc[c] += mid[o + c] * wt;
                }
            }
            let px = [
                acc[0].round().clamp(0.0, 255.0) as u8,
                acc[1].round().clamp(0.0, 255.0) as u8,
                acc[2].round().clamp(0.0, 255.0) as u8,
            ];
            dst.set_pixel(x as u32, y as u32, px);
        }
    }
    Ok(dst)
}

fn gaussian_weights(kernel: u32) -> Vec<f64> {
    let sigma = 0.3 * ((f64::from(kernel) - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (kernel / 2) as i64;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for wt in &mut weights {
        *wt /= sum;
    }
    weights
}

/// Mirror an out-of-range index around the edge pixel (… cb|abc…xyz|yx …).
fn reflect_101(i: i64, n: i64) -> u32 {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as u32
}
