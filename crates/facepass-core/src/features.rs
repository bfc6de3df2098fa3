//! Classical feature extraction — LBP, intensity, gradient, block texture.
//!
//! Produces a fixed-length descriptor from a cropped grayscale face region:
//! four sub-blocks (local binary pattern histogram, raw intensity histogram,
//! Sobel gradient-magnitude histogram, block standard-deviation texture
//! vector) concatenated and L2-normalized. No learned models involved.

use crate::region::FaceRegion;
use crate::types::Descriptor;

// --- Named constants (no magic numbers) ---
/// Working size callers should resize face regions to before extraction.
pub const WORKING_SIZE: u32 = 100;
const HIST_BINS: usize = 256;
const TEXTURE_BLOCK_SIZE: usize = 10;
const TEXTURE_BLOCKS: usize = 64;
/// Total descriptor length: three 256-bin histograms plus the texture vector.
pub const DESCRIPTOR_LEN: usize = HIST_BINS * 3 + TEXTURE_BLOCKS;
const NORM_EPSILON: f32 = 1e-7;

/// 8-neighborhood offsets (dy, dx) in fixed clockwise order starting top-left.
/// Bit k of the LBP code corresponds to NEIGHBORS[k].
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Extract the 832-length normalized descriptor from a face region.
///
/// The region is assumed to be resized to [`WORKING_SIZE`]² by the caller;
/// other sizes still produce a valid fixed-length descriptor (the texture
/// stride adapts). Degenerate input returns [`Descriptor::empty`] — this
/// function never panics and never errors.
pub fn extract(region: &FaceRegion) -> Descriptor {
    if region.is_degenerate() {
        tracing::warn!(
            width = region.width,
            height = region.height,
            len = region.data.len(),
            "degenerate face region, returning empty descriptor"
        );
        return Descriptor::empty();
    }

    let w = region.width as usize;
    let h = region.height as usize;
    let pixels = &region.data;

    let mut values = Vec::with_capacity(DESCRIPTOR_LEN);
    values.extend_from_slice(&lbp_histogram(pixels, w, h));
    values.extend_from_slice(&intensity_histogram(pixels));
    values.extend_from_slice(&gradient_histogram(pixels, w, h));
    values.extend_from_slice(&block_texture(pixels, w, h));

    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    for v in &mut values {
        *v /= norm + NORM_EPSILON;
    }

    Descriptor { values }
}

/// Descriptor length of the current extractor, probed on a blank calibration
/// region of the working size. The store's dimension repair compares stored
/// descriptors against this.
pub fn calibration_descriptor_len() -> usize {
    let blank = FaceRegion {
        data: vec![0u8; (WORKING_SIZE * WORKING_SIZE) as usize],
        width: WORKING_SIZE,
        height: WORKING_SIZE,
    };
    extract(&blank).len()
}

/// 256-bin histogram of local binary pattern codes over interior pixels.
///
/// Each interior pixel is compared against its 8 neighbors; bit k is set when
/// neighbor k's intensity is >= the center intensity.
fn lbp_histogram(pixels: &[u8], w: usize, h: usize) -> [f32; HIST_BINS] {
    let mut hist = [0.0f32; HIST_BINS];
    if w < 3 || h < 3 {
        return hist;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = pixels[y * w + x];
            let mut code = 0usize;
            for (k, &(dy, dx)) in NEIGHBORS.iter().enumerate() {
                let ny = (y as i32 + dy) as usize;
                let nx = (x as i32 + dx) as usize;
                if pixels[ny * w + nx] >= center {
                    code |= 1 << k;
                }
            }
            hist[code] += 1.0;
        }
    }
    hist
}

/// 256-bin histogram of raw pixel intensities.
fn intensity_histogram(pixels: &[u8]) -> [f32; HIST_BINS] {
    let mut hist = [0.0f32; HIST_BINS];
    for &p in pixels {
        hist[p as usize] += 1.0;
    }
    hist
}

/// 256-bin histogram of Sobel gradient magnitudes, clipped to 0–255.
///
/// Uses the standard 3×3 Sobel kernels with reflect-101 border handling.
fn gradient_histogram(pixels: &[u8], w: usize, h: usize) -> [f32; HIST_BINS] {
    let mut hist = [0.0f32; HIST_BINS];

    // Reflect-101 index: -1 maps to 1, len maps to len - 2.
    let reflect = |i: i64, len: usize| -> usize {
        if len <= 1 {
            return 0;
        }
        let last = (len - 1) as i64;
        let mut i = i;
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
        i as usize
    };

    for y in 0..h {
        for x in 0..w {
            let sample = |dy: i64, dx: i64| -> f32 {
                let sy = reflect(y as i64 + dy, h);
                let sx = reflect(x as i64 + dx, w);
                pixels[sy * w + sx] as f32
            };

            let gx = (sample(-1, 1) + 2.0 * sample(0, 1) + sample(1, 1))
                - (sample(-1, -1) + 2.0 * sample(0, -1) + sample(1, -1));
            let gy = (sample(1, -1) + 2.0 * sample(1, 0) + sample(1, 1))
                - (sample(-1, -1) + 2.0 * sample(-1, 0) + sample(-1, 1));

            let magnitude = (gx * gx + gy * gy).sqrt().min(255.0) as usize;
            hist[magnitude] += 1.0;
        }
    }
    hist
}

/// Fixed-length block-texture vector: population standard deviation of pixel
/// intensities in 10×10 blocks sampled with an adaptive stride.
///
/// The stride is chosen so roughly 64 blocks cover the region regardless of
/// its size; the output is padded with zeros or truncated to exactly
/// [`TEXTURE_BLOCKS`] entries.
fn block_texture(pixels: &[u8], w: usize, h: usize) -> [f32; TEXTURE_BLOCKS] {
    let mut out = [0.0f32; TEXTURE_BLOCKS];
    let bs = TEXTURE_BLOCK_SIZE;
    if w <= bs || h <= bs {
        return out;
    }

    let step_y = ((h - bs) / 8).max(1);
    let step_x = ((w - bs) / 8).max(1);

    let mut count = 0;
    'rows: for by in (0..h - bs).step_by(step_y) {
        for bx in (0..w - bs).step_by(step_x) {
            if count >= TEXTURE_BLOCKS {
                break 'rows;
            }
            out[count] = block_std(pixels, w, bx, by, bs);
            count += 1;
        }
    }
    out
}

/// Population standard deviation of one block.
fn block_std(pixels: &[u8], w: usize, bx: usize, by: usize, bs: usize) -> f32 {
    let n = (bs * bs) as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;

    for y in by..by + bs {
        for x in bx..bx + bs {
            let p = pixels[y * w + x] as f64;
            sum += p;
            sum_sq += p * p;
        }
    }

    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    variance.sqrt() as f32
}
