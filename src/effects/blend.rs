use rayon::prelude::*;

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::{
        error::LayerResult,
        math::{mul_div255_u8, u8_to_unit, unit_to_u8},
    },
};

pub(crate) type PremulRgba8 = [u8; 4];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// How a layer's pixels combine with the accumulated image beneath it.
pub enum BlendMode {
    /// Standard "source over destination" (premultiplied alpha).
    #[default]
    Normal,
    /// Channel product; darkens.
    Multiply,
    /// Inverted product of inverses; lightens.
    Screen,
    /// Multiply or screen depending on the backdrop channel.
    Overlay,
}

/// Source-over with an extra opacity factor, exact in 8-bit arithmetic.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Blend one premultiplied pixel onto another.
///
/// Separable modes follow the usual premultiplied formulation:
/// `co = cs * (1 - ab) + cb * (1 - as) + as * ab * B(Cb, Cs)`.
pub(crate) fn blend_pixel(
    dst: PremulRgba8,
    src: PremulRgba8,
    mode: BlendMode,
    opacity: f32,
) -> PremulRgba8 {
    if mode == BlendMode::Normal {
        return over(dst, src, opacity);
    }
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let sa = u8_to_unit(src[3]) * opacity;
    let ba = u8_to_unit(dst[3]);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = u8_to_unit(src[i]) * opacity;
        let bc = u8_to_unit(dst[i]);
        let cs = if sa > 0.0 { (sc / sa).min(1.0) } else { 0.0 };
        let cb = if ba > 0.0 { (bc / ba).min(1.0) } else { 0.0 };
        let mixed = match mode {
            BlendMode::Normal => cs,
            BlendMode::Multiply => cb * cs,
            BlendMode::Screen => cb + cs - cb * cs,
            BlendMode::Overlay => {
                if cb <= 0.5 {
                    2.0 * cs * cb
                } else {
                    1.0 - 2.0 * (1.0 - cs) * (1.0 - cb)
                }
            }
        };
        out[i] = unit_to_u8(sc * (1.0 - ba) + bc * (1.0 - sa) + sa * ba * mixed);
    }
    out[3] = unit_to_u8(sa + ba - sa * ba);
    out
}

/// Blend `src` onto `dst` with `src`'s top-left corner at `origin` in `dst` space.
///
/// Only the overlapping region is touched. Both buffers must be premultiplied RGBA.
pub(crate) fn blend_into(
    dst: &mut PixelBuffer,
    src: &PixelBuffer,
    origin: (i64, i64),
    mode: BlendMode,
    opacity: f32,
) -> LayerResult<()> {
    dst.expect_rgba8_premul("blend target")?;
    src.expect_rgba8_premul("blend source")?;

    let (ox, oy) = origin;
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    let x_start = ox.max(0);
    let x_end = (ox + sw).min(dw);
    let y_start = oy.max(0);
    let y_end = (oy + sh).min(dh);
    if x_start >= x_end || y_start >= y_end {
        return Ok(());
    }

    let dst_row_bytes = dst.row_bytes();
    let src_row_bytes = src.row_bytes();
    let src_data = src.data();

    dst.data_mut()
        .par_chunks_exact_mut(dst_row_bytes)
        .enumerate()
        .skip(y_start as usize)
        .take((y_end - y_start) as usize)
        .for_each(|(y, row)| {
            let sy = (y as i64 - oy) as usize;
            let src_row = &src_data[sy * src_row_bytes..(sy + 1) * src_row_bytes];
            for x in x_start..x_end {
                let di = x as usize * 4;
                let si = (x - ox) as usize * 4;
                let d = [row[di], row[di + 1], row[di + 2], row[di + 3]];
                let s = [
                    src_row[si],
                    src_row[si + 1],
                    src_row[si + 2],
                    src_row[si + 3],
                ];
                row[di..di + 4].copy_from_slice(&blend_pixel(d, s, mode, opacity));
            }
        });

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blend.rs"]
mod tests;
