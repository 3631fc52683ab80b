use crate::{
    core::{Affine, Point},
    error::{FramefxError, FramefxResult},
    frame::FrameRgb,
};

/// Apply the top two rows of `m` as an affine warp over the whole frame.
///
/// Each destination pixel is sampled from the source at the inverse-mapped
/// position with bilinear filtering. Samples outside the source use
/// reflective border extension, so no transparent or black edges appear.
pub fn warp_affine(src: &FrameRgb, m: Affine) -> FramefxResult<FrameRgb> {
    if m.determinant().abs() < 1e-12 {
        return Err(FramefxError::render("warp transform is not invertible"));
    }
    if m == Affine::IDENTITY {
        return Ok(src.clone());
    }

    let inv = m.inverse();
    let mut dst = FrameRgb::zeroed(src.canvas());
    let w = i64::from(src.width);
    let h = i64::from(src.height);

    for y in 0..src.height {
        for x in 0..src.width {
            let p = inv * Point::new(f64::from(x), f64::from(y));
            let px = sample_bilinear_reflect(src, p.x, p.y, w, h);
            dst.set_pixel(x, y, px);
        }
    }
    Ok(dst)
}

fn sample_bilinear_reflect(src: &FrameRgb, sx: f64, sy: f64, w: i64, h: i64) -> [u8; 3] {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let xa = reflect_index(x0, w);
    let xb = reflect_index(x0 + 1, w);
    let ya = reflect_index(y0, h);
    let yb = reflect_index(y0 + 1, h);

    let p00 = src.pixel(xa, ya);
    let p10 = src.pixel(xb, ya);
    let p01 = src.pixel(xa, yb);
    let p11 = src.pixel(xb, yb);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bot = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Reflect an out-of-range index back into `[0, n)`, duplicating the edge
/// sample (… cba|abc…xyz|zyx …).
fn reflect_index(i: i64, n: i64) -> u32 {
    debug_assert!(n > 0);
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as u32
}
