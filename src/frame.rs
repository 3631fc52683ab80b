use crate::{
    core::{Canvas, Rgb8},
    error::{FramefxError, FramefxResult},
};

/// Fixed-size 3-channel 8-bit frame buffer, row-major, tightly packed RGB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgb {
    /// All-black frame of the given canvas size.
    pub fn zeroed(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; (canvas.width as usize) * (canvas.height as usize) * 3],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> FramefxResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return Err(FramefxError::validation(
                "FrameRgb data length must be width*height*3",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 3
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 3]) {
        let o = self.offset(x, y);
        self.data[o..o + 3].copy_from_slice(&px);
    }

    /// Draw a filled disc, clipped to the frame bounds.
    pub fn draw_disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb8) {
        if radius <= 0 {
            return;
        }
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let r2 = radius * radius;
        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(h - 1);
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(w - 1);
        for y in y0..=y1 {
            let dy = y - cy;
            for x in x0..=x1 {
                let dx = x - cx;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(x as u32, y as u32, [color.r, color.g, color.b]);
                }
            }
        }
    }
}

/// 4-channel straight-alpha RGBA sprite frame (overlay layer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl SpriteRgba {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> FramefxResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(FramefxError::validation(
                "SpriteRgba data length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ]
    }
}
