use std::sync::Arc;

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer},
    effects::{
        effect::{Effect, EffectHandle, OutputOption},
        sample::draw_fitted,
    },
    foundation::{
        core::{Rgba8Premul, Size},
        error::LayerResult,
    },
};

/// A decoded image is itself an image provider.
impl Effect for PixelBuffer {
    fn natural_size(&self) -> Option<Size> {
        Some(self.size())
    }

    fn render(&self, target: &mut PixelBuffer, option: OutputOption) -> LayerResult<()> {
        target.expect_rgba8_premul("image render target")?;
        if self.mode() == ColorMode::Rgba8Premul {
            return draw_fitted(self, target, option);
        }
        draw_fitted(&self.to_mode(ColorMode::Rgba8Premul)?, target, option)
    }
}

/// Wrap a buffer as a shareable [`EffectHandle`].
pub fn image_source(buffer: PixelBuffer) -> EffectHandle {
    Arc::new(buffer)
}

/// A constant colour that fills any target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidColor {
    color: Rgba8Premul,
}

impl SolidColor {
    /// Fill with a premultiplied colour.
    pub fn new(color: Rgba8Premul) -> Self {
        Self { color }
    }

    /// Opaque gray of the given level.
    pub fn gray(level: u8) -> Self {
        Self::new(Rgba8Premul::gray(level))
    }

    /// The fill colour.
    pub fn color(&self) -> Rgba8Premul {
        self.color
    }
}

impl Effect for SolidColor {
    fn natural_size(&self) -> Option<Size> {
        None
    }

    fn render(&self, target: &mut PixelBuffer, _option: OutputOption) -> LayerResult<()> {
        target.expect_rgba8_premul("solid colour target")?;
        target.fill(self.color);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/source.rs"]
mod tests;
