use crate::{
    error::{FramefxError, FramefxResult},
    frame::{FrameRgb, SpriteRgba},
};

/// Fixed-weight additive blend: `base + layer·opacity` per channel, clamped.
///
/// This is not a true alpha composite; it is the glow-style blend applied
/// once per frame for particle layers.
pub fn blend_layer(base: &mut FrameRgb, layer: &FrameRgb, opacity: f32) -> FramefxResult<()> {
    if base.width != layer.width || base.height != layer.height {
        return Err(FramefxError::render(
            "blend_layer expects equal-size frames",
        ));
    }
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }
    for (d, s) in base.data.iter_mut().zip(layer.data.iter()) {
        let v = f32::from(*d) + f32::from(*s) * opacity;
        *d = v.round().clamp(0.0, 255.0) as u8;
    }
    Ok(())
}

/// Per-pixel straight-alpha blend of an RGBA sprite onto `base` at `(x, y)`.
///
/// If the sprite's bounding box would extend past any edge of `base` the call
/// is a silent no-op; callers wanting partial overlays must pre-clip.
pub fn overlay_sprite(base: &mut FrameRgb, sprite: &SpriteRgba, x: i64, y: i64) {
    let bw = i64::from(base.width);
    let bh = i64::from(base.height);
    let sw = i64::from(sprite.width);
    let sh = i64::from(sprite.height);
    if x < 0 || y < 0 || x + sw > bw || y + sh > bh {
        return;
    }

    for sy in 0..sprite.height {
        for sx in 0..sprite.width {
            let [sr, sg, sb, sa] = sprite.pixel(sx, sy);
            if sa == 0 {
                continue;
            }
            let bx = (x as u32) + sx;
            let by = (y as u32) + sy;
            let dst = base.pixel(bx, by);
            let a = f32::from(sa) / 255.0;
            let blend = |s: u8, d: u8| -> u8 {
                (a * f32::from(s) + (1.0 - a) * f32::from(d)).round() as u8
            };
            base.set_pixel(bx, by, [blend(sr, dst[0]), blend(sg, dst[1]), blend(sb, dst[2])]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Canvas;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas {
            width: w,
            height: h,
        }
    }

    #[test]
    fn blend_adds_weighted_layer_and_clamps() {
        let mut base = FrameRgb::from_raw(1, 1, vec![100, 200, 250]).unwrap();
        let layer = FrameRgb::from_raw(1, 1, vec![100, 100, 100]).unwrap();
        blend_layer(&mut base, &layer, 0.6).unwrap();
        assert_eq!(base.pixel(0, 0), [160, 255, 255]);
    }

    #[test]
    fn blend_zero_opacity_is_noop() {
        let mut base = FrameRgb::from_raw(1, 1, vec![10, 20, 30]).unwrap();
        let layer = FrameRgb::from_raw(1, 1, vec![200, 200, 200]).unwrap();
        blend_layer(&mut base, &layer, 0.0).unwrap();
        assert_eq!(base.pixel(0, 0), [10, 20, 30]);
    }

    #[test]
    fn blend_rejects_size_mismatch() {
        let mut base = FrameRgb::zeroed(canvas(2, 2));
        let layer = FrameRgb::zeroed(canvas(3, 2));
        assert!(blend_layer(&mut base, &layer, 0.5).is_err());
    }

    #[test]
    fn overlay_blends_with_sprite_alpha() {
        let mut base = FrameRgb::zeroed(canvas(4, 4));
        // Opaque white pixel and a fully transparent one.
        let sprite =
            SpriteRgba::from_raw(2, 1, vec![255, 255, 255, 255, 255, 255, 255, 0]).unwrap();
        overlay_sprite(&mut base, &sprite, 1, 2);
        assert_eq!(base.pixel(1, 2), [255, 255, 255]);
        assert_eq!(base.pixel(2, 2), [0, 0, 0]);
    }

    #[test]
    fn overlay_half_alpha_mixes_evenly() {
        let mut base = FrameRgb::from_raw(1, 1, vec![0, 100, 200]).unwrap();
        let sprite = SpriteRgba::from_raw(1, 1, vec![200, 100, 0, 128]).unwrap();
        overlay_sprite(&mut base, &sprite, 0, 0);
        let [r, g, b] = base.pixel(0, 0);
        assert!((i32::from(r) - 100).abs() <= 1);
        assert!((i32::from(g) - 100).abs() <= 1);
        assert!((i32::from(b) - 100).abs() <= 1);
    }

    #[test]
    fn overlay_out_of_bounds_leaves_base_byte_identical() {
        let mut base = FrameRgb::zeroed(canvas(4, 4));
        base.set_pixel(3, 3, [9, 9, 9]);
        let before = base.clone();
        let sprite = SpriteRgba::from_raw(3, 3, vec![255u8; 36]).unwrap();

        overlay_sprite(&mut base, &sprite, 2, 2); // spills right/bottom
        overlay_sprite(&mut base, &sprite, -1, 0); // spills left
        overlay_sprite(&mut base, &sprite, 0, -2); // spills top
        assert_eq!(base, before);
    }
}
