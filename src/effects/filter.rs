use std::{fmt, sync::Arc};

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer, luma},
    effects::{blur::gaussian_blur, sample::sample_affine},
    foundation::{
        core::{Affine, Size},
        error::{LayerError, LayerResult},
        math::mul_div255_u8,
    },
};

/// Shared handle to a [`Filter`].
pub type FilterHandle = Arc<dyn Filter>;

/// A pixel operation applied to a whole premultiplied RGBA image.
///
/// Filters are chained by [`FilterEffect`](crate::FilterEffect): each one reads the previous
/// output and may change its size.
pub trait Filter: Send + Sync + fmt::Debug {
    /// Short stable name, used in logs and stack descriptions.
    fn name(&self) -> &'static str;

    /// Size of the image [`Filter::apply`] produces for an input of `input` size.
    fn output_size(&self, input: Size) -> Size {
        input
    }

    /// Produce a new image from `src`.
    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer>;
}

/// Clockwise rotation by an arbitrary angle in degrees.
///
/// Multiples of 90° are exact pixel remaps. Other angles resample bilinearly into the bounding
/// box of the rotated image; corners outside the source become transparent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationFilter {
    angle_deg: f64,
}

impl RotationFilter {
    /// Rotation by `angle_deg` degrees clockwise.
    pub fn new(angle_deg: f64) -> LayerResult<Self> {
        if !angle_deg.is_finite() {
            return Err(LayerError::configuration("rotation angle must be finite"));
        }
        Ok(Self { angle_deg })
    }

    /// Angle in degrees, as given.
    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    fn quarter_turns(&self) -> Option<u32> {
        let turns = self.angle_deg.rem_euclid(360.0) / 90.0;
        let rounded = turns.round();
        ((turns - rounded).abs() < 1e-9).then_some(rounded as u32 % 4)
    }

    fn rotated_bounds(&self, input: Size) -> (f64, f64) {
        let theta = self.angle_deg.to_radians();
        let (w, h) = (f64::from(input.width), f64::from(input.height));
        let (s, c) = (theta.sin().abs(), theta.cos().abs());
        (w * c + h * s, w * s + h * c)
    }
}

impl Filter for RotationFilter {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn output_size(&self, input: Size) -> Size {
        match self.quarter_turns() {
            Some(1 | 3) => Size {
                width: input.height,
                height: input.width,
            },
            Some(_) => input,
            None => {
                let (bw, bh) = self.rotated_bounds(input);
                Size {
                    width: ((bw - 1e-6).ceil() as u32).max(1),
                    height: ((bh - 1e-6).ceil() as u32).max(1),
                }
            }
        }
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        src.expect_rgba8_premul("rotation")?;
        let out_size = self.output_size(src.size());
        let Some(turns) = self.quarter_turns() else {
            let mut out = PixelBuffer::new(out_size, ColorMode::Rgba8Premul)?;
            let (w, h) = (f64::from(src.width()), f64::from(src.height()));
            let (ow, oh) = (f64::from(out_size.width), f64::from(out_size.height));
            let xf = Affine::translate((ow / 2.0, oh / 2.0))
                * Affine::rotate(self.angle_deg.to_radians())
                * Affine::translate((-w / 2.0, -h / 2.0));
            sample_affine(src, &mut out, xf);
            return Ok(out);
        };

        if turns == 0 {
            return Ok(src.clone());
        }

        let (w, h) = (src.width() as usize, src.height() as usize);
        let ow = out_size.width as usize;
        let mut out = PixelBuffer::new(out_size, ColorMode::Rgba8Premul)?;
        let data = src.data();
        for (i, px) in out.data_mut().chunks_exact_mut(4).enumerate() {
            let (x, y) = (i % ow, i / ow);
            let (sx, sy) = match turns {
                1 => (y, h - 1 - x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (w - 1 - y, x),
            };
            let si = (sy * w + sx) * 4;
            px.copy_from_slice(&data[si..si + 4]);
        }
        Ok(out)
    }
}

/// Replace colour with Rec.601 luma, keeping alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrayscaleFilter;

impl Filter for GrayscaleFilter {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        map_pixels(src, "grayscale", |px| {
            let y = luma(px);
            [y, y, y, px[3]]
        })
    }
}

/// Invert colour channels, keeping alpha (`c' = a - c` in premultiplied space).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NegativeFilter;

impl Filter for NegativeFilter {
    fn name(&self) -> &'static str {
        "negative"
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        map_pixels(src, "negative", |px| {
            let a = px[3];
            [
                a.saturating_sub(px[0]),
                a.saturating_sub(px[1]),
                a.saturating_sub(px[2]),
                a,
            ]
        })
    }
}

/// Multiply every channel by a constant in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpacityFilter {
    value: f32,
}

impl OpacityFilter {
    /// Scale opacity by `value`, which must be finite and within `[0, 1]`.
    pub fn new(value: f32) -> LayerResult<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(LayerError::configuration(
                "opacity filter value must be finite and within [0, 1]",
            ));
        }
        Ok(Self { value })
    }
}

impl Filter for OpacityFilter {
    fn name(&self) -> &'static str {
        "opacity"
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        let op = (self.value * 255.0).round() as u16;
        map_pixels(src, "opacity", |px| {
            px.map(|c| mul_div255_u8(u16::from(c), op))
        })
    }
}

/// Gaussian blur with a pixel radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurFilter {
    radius_px: u32,
    sigma: f32,
}

impl BlurFilter {
    /// Largest accepted radius.
    pub const MAX_RADIUS_PX: u32 = 256;

    /// Blur with an explicit sigma.
    pub fn new(radius_px: u32, sigma: f32) -> LayerResult<Self> {
        if radius_px > Self::MAX_RADIUS_PX {
            return Err(LayerError::configuration(format!(
                "blur radius must be <= {}",
                Self::MAX_RADIUS_PX
            )));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(LayerError::configuration("blur sigma must be finite and > 0"));
        }
        Ok(Self { radius_px, sigma })
    }

    /// Blur with `sigma = radius / 2`.
    pub fn with_radius(radius_px: u32) -> LayerResult<Self> {
        Self::new(radius_px, (radius_px as f32 / 2.0).max(0.5))
    }
}

impl Filter for BlurFilter {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        gaussian_blur(src, self.radius_px, self.sigma)
    }
}

fn map_pixels(
    src: &PixelBuffer,
    what: &str,
    f: impl Fn([u8; 4]) -> [u8; 4],
) -> LayerResult<PixelBuffer> {
    src.expect_rgba8_premul(what)?;
    let mut out = src.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let mapped = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&mapped);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
