//! Face region type — a cropped single-channel intensity image.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A cropped grayscale face region handed over by an external detector.
#[derive(Debug, Clone)]
pub struct FaceRegion {
    /// Grayscale pixel data (width * height bytes, row-major).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Build a region from raw grayscale pixels, validating the buffer length.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, RegionError> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(RegionError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// True when the region holds no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() != (self.width as usize) * (self.height as usize)
    }

    /// Resize to the given dimensions with bilinear interpolation.
    ///
    /// Degenerate inputs produce an all-black output of the requested size
    /// rather than panicking.
    pub fn resize(&self, new_width: u32, new_height: u32) -> FaceRegion {
        let (sw, sh) = (self.width as usize, self.height as usize);
        let (nw, nh) = (new_width as usize, new_height as usize);

        if self.is_degenerate() || nw == 0 || nh == 0 {
            return FaceRegion {
                data: vec![0u8; nw * nh],
                width: new_width,
                height: new_height,
            };
        }
        if sw == nw && sh == nh {
            return self.clone();
        }

        let scale_x = sw as f32 / nw as f32;
        let scale_y = sh as f32 / nh as f32;
        let mut data = vec![0u8; nw * nh];

        for oy in 0..nh {
            // Center-aligned source coordinate for this output row.
            let sy = ((oy as f32 + 0.5) * scale_y - 0.5).max(0.0);
            let y0 = (sy.floor() as usize).min(sh - 1);
            let y1 = (y0 + 1).min(sh - 1);
            let fy = sy - y0 as f32;

            for ox in 0..nw {
                let sx = ((ox as f32 + 0.5) * scale_x - 0.5).max(0.0);
                let x0 = (sx.floor() as usize).min(sw - 1);
                let x1 = (x0 + 1).min(sw - 1);
                let fx = sx - x0 as f32;

                let p00 = self.data[y0 * sw + x0] as f32;
                let p10 = self.data[y0 * sw + x1] as f32;
                let p01 = self.data[y1 * sw + x0] as f32;
                let p11 = self.data[y1 * sw + x1] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                data[oy * nw + ox] = val.round().clamp(0.0, 255.0) as u8;
            }
        }

        FaceRegion {
            data,
            width: new_width,
            height: new_height,
        }
    }
}
