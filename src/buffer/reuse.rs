//! Render an effect into a caller-supplied buffer, reusing it whenever geometry and format allow.
//!
//! Presentation surfaces are owned by whichever context drives presentation. Callers must
//! already be on that context; nothing here marshals between threads.

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer},
    effects::effect::{Effect, OutputOption},
    foundation::{core::Size, error::LayerResult},
};

/// Outcome of [`render_reusing`].
#[derive(Debug)]
pub(crate) struct Rendered {
    pub(crate) buffer: PixelBuffer,
    pub(crate) reused: bool,
}

/// Extension for rendering any [`Effect`] into a reusable buffer.
pub trait RenderToBuffer {
    /// Render into `reusable` if it matches `size` (and `format`, when given), otherwise into a
    /// freshly allocated buffer.
    ///
    /// Returns the buffer that was actually written, which is `reusable` itself when it could
    /// be reused. New buffers use `format`, or [`ColorMode::Rgba8Premul`] when none is given.
    fn get_rendered_buffer(
        &self,
        reusable: Option<PixelBuffer>,
        size: Size,
        format: Option<ColorMode>,
        option: OutputOption,
    ) -> LayerResult<PixelBuffer>;
}

impl<E: Effect + ?Sized> RenderToBuffer for E {
    fn get_rendered_buffer(
        &self,
        reusable: Option<PixelBuffer>,
        size: Size,
        format: Option<ColorMode>,
        option: OutputOption,
    ) -> LayerResult<PixelBuffer> {
        render_reusing(self, reusable, size, format, option).map(|r| r.buffer)
    }
}

/// `true` when `candidate` can be overwritten in place for the requested geometry/format.
pub fn is_reusable(candidate: &PixelBuffer, size: Size, format: Option<ColorMode>) -> bool {
    candidate.size() == size && format.is_none_or(|f| candidate.mode() == f)
}

pub(crate) fn render_reusing<E: Effect + ?Sized>(
    effect: &E,
    reusable: Option<PixelBuffer>,
    size: Size,
    format: Option<ColorMode>,
    option: OutputOption,
) -> LayerResult<Rendered> {
    let (mut buffer, reused) = match reusable {
        Some(candidate) if is_reusable(&candidate, size, format) => (candidate, true),
        other => {
            if let Some(candidate) = &other {
                tracing::debug!(
                    have_size = %candidate.size(),
                    have_mode = ?candidate.mode(),
                    want_size = %size,
                    want_mode = ?format,
                    "buffer not reusable, allocating"
                );
            }
            (
                PixelBuffer::new(size, format.unwrap_or(ColorMode::Rgba8Premul))?,
                false,
            )
        }
    };

    if buffer.mode() == ColorMode::Rgba8Premul {
        effect.render(&mut buffer, option)?;
    } else {
        let mut scratch = PixelBuffer::new(size, ColorMode::Rgba8Premul)?;
        effect.render(&mut scratch, option)?;
        scratch.convert_into(&mut buffer)?;
    }

    Ok(Rendered { buffer, reused })
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/reuse.rs"]
mod tests;
