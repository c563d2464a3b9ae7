use rayon::prelude::*;

use crate::{
    buffer::pixel::PixelBuffer,
    effects::effect::OutputOption,
    foundation::{
        core::{Affine, Point},
        error::LayerResult,
    },
};

/// Draw `src` into the whole of `dst`, fitted per `option`.
///
/// Equal sizes copy bytes exactly, whatever the option. Both buffers must be premultiplied RGBA.
pub(crate) fn draw_fitted(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    option: OutputOption,
) -> LayerResult<()> {
    src.expect_rgba8_premul("draw_fitted source")?;
    dst.expect_rgba8_premul("draw_fitted target")?;
    if src.size() == dst.size() {
        dst.data_mut().copy_from_slice(src.data());
        return Ok(());
    }

    let rect = option.fit_rect(src.size(), dst.size());
    let xf = Affine::translate((rect.x0, rect.y0))
        * Affine::scale_non_uniform(
            rect.width() / f64::from(src.width()),
            rect.height() / f64::from(src.height()),
        );
    sample_affine(src, dst, xf);
    Ok(())
}

/// Resample `src` into `dst` where `xf` maps source space to destination space.
///
/// Destination pixels whose centers map outside the source become transparent.
pub(crate) fn sample_affine(src: &PixelBuffer, dst: &mut PixelBuffer, xf: Affine) {
    let inv = xf.inverse();
    let row_bytes = dst.row_bytes();
    dst.data_mut()
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                out.copy_from_slice(&bilinear(src, p.x, p.y));
            }
        });
}

fn bilinear(src: &PixelBuffer, sx: f64, sy: f64) -> [u8; 4] {
    let (w, h) = (f64::from(src.width()), f64::from(src.height()));
    if !(0.0..w).contains(&sx) || !(0.0..h).contains(&sy) {
        return [0; 4];
    }

    let fx = (sx - 0.5).clamp(0.0, w - 1.0);
    let fy = (sy - 0.5).clamp(0.0, h - 1.0);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let tx = fx - f64::from(x0);
    let ty = fy - f64::from(y0);

    let p00 = texel(src, x0, y0);
    let p10 = texel(src, x1, y0);
    let p01 = texel(src, x0, y1);
    let p11 = texel(src, x1, y1);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(p00[i]) * (1.0 - tx) + f64::from(p10[i]) * tx;
        let bottom = f64::from(p01[i]) * (1.0 - tx) + f64::from(p11[i]) * tx;
        out[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn texel(src: &PixelBuffer, x: u32, y: u32) -> [u8; 4] {
    let idx = (y as usize * src.width() as usize + x as usize) * 4;
    let d = src.data();
    [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
}

#[cfg(test)]
#[path = "../../tests/unit/effects/sample.rs"]
mod tests;
