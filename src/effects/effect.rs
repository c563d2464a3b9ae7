use std::{fmt, sync::Arc};

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::core::{Rect, Size},
    foundation::error::LayerResult,
};

/// Shared handle to an [`Effect`].
pub type EffectHandle = Arc<dyn Effect>;

/// Anything that can produce pixel content into a caller-supplied buffer.
///
/// This is the seam to the pixel engine: the compositor never looks inside an effect, it only
/// asks it to fill a buffer. Implementations must overwrite the whole target, including any
/// area the content does not cover (which becomes transparent).
pub trait Effect: Send + Sync + fmt::Debug {
    /// Intrinsic pixel size of the content, or `None` when it adapts to any target.
    fn natural_size(&self) -> Option<Size>;

    /// Render into `target`, which must be [`ColorMode::Rgba8Premul`](crate::ColorMode).
    ///
    /// `option` decides how content of a different aspect ratio is fitted.
    fn render(&self, target: &mut PixelBuffer, option: OutputOption) -> LayerResult<()>;

    /// The upstream provider this effect reads from, if any.
    fn source(&self) -> Option<&EffectHandle> {
        None
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// How content is fitted into a target whose aspect ratio differs.
pub enum OutputOption {
    /// Scale each axis independently to fill the target.
    #[default]
    Stretch,
    /// Scale uniformly to fit entirely inside the target, centered; uncovered area is transparent.
    PreserveAspectRatio,
    /// Scale uniformly to cover the whole target, centered; overflow is cropped.
    PreserveAspectRatioCrop,
}

impl OutputOption {
    /// Rectangle in target space that the full source content maps onto.
    pub fn fit_rect(self, src: Size, dst: Size) -> Rect {
        let (sw, sh) = (f64::from(src.width), f64::from(src.height));
        let (dw, dh) = (f64::from(dst.width), f64::from(dst.height));
        let scale = match self {
            Self::Stretch => return dst.to_rect(),
            Self::PreserveAspectRatio => (dw / sw).min(dh / sh),
            Self::PreserveAspectRatioCrop => (dw / sw).max(dh / sh),
        };
        let (w, h) = (sw * scale, sh * scale);
        let x0 = (dw - w) / 2.0;
        let y0 = (dh - h) / 2.0;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }
}

/// Number of effects in the provider chain starting at `effect` (itself included).
pub fn chain_depth(effect: &dyn Effect) -> usize {
    let mut depth = 1;
    let mut cur = effect.source();
    while let Some(up) = cur {
        depth += 1;
        cur = up.source();
    }
    depth
}

#[cfg(test)]
#[path = "../../tests/unit/effects/effect.rs"]
mod tests;
