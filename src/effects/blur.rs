use rayon::prelude::*;

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer},
    foundation::error::{LayerError, LayerResult},
};

/// Separable Gaussian blur of a premultiplied RGBA buffer with clamped edges.
pub(crate) fn gaussian_blur(src: &PixelBuffer, radius: u32, sigma: f32) -> LayerResult<PixelBuffer> {
    src.expect_rgba8_premul("blur")?;
    if radius == 0 {
        return Ok(src.clone());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = PixelBuffer::new(src.size(), ColorMode::Rgba8Premul)?;
    let mut out = PixelBuffer::new(src.size(), ColorMode::Rgba8Premul)?;

    horizontal_pass(src, &mut tmp, &kernel);
    vertical_pass(&tmp, &mut out, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LayerResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LayerError::configuration("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(LayerError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Force the weights to sum to exactly 1.0 in Q16 so flat regions stay flat.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &PixelBuffer, dst: &mut PixelBuffer, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(src.width());
    let row_bytes = src.row_bytes();
    let src_data = src.data();
    dst.data_mut()
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = &src_data[y * row_bytes..(y + 1) * row_bytes];
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i64 - radius).clamp(0, w - 1) as usize;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(row[sx * 4 + c]);
                    }
                }
                let o = x as usize * 4;
                for c in 0..4 {
                    out_row[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &PixelBuffer, dst: &mut PixelBuffer, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let h = i64::from(src.height());
    let row_bytes = src.row_bytes();
    let src_data = src.data();
    dst.data_mut()
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, out_row)| {
            for (o, out) in out_row.iter_mut().enumerate() {
                let mut acc = 0u64;
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y as i64 + ki as i64 - radius).clamp(0, h - 1) as usize;
                    acc += u64::from(kw) * u64::from(src_data[sy * row_bytes + o]);
                }
                *out = q16_to_u8(acc);
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
