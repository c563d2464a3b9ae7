use std::sync::Arc;

use crate::{
    buffer::pixel::PixelBuffer,
    effects::effect::EffectHandle,
    foundation::core::Size,
};

/// Composition-time facts handed to a layer's resolver.
///
/// Built by the compositor once per layer evaluation and never mutated. `background` is a
/// read-only snapshot of everything composited below the layer.
#[derive(Clone, Debug)]
pub struct LayerContext {
    destination_size: Size,
    background: Arc<PixelBuffer>,
}

impl LayerContext {
    /// Context for a layer composited at `destination_size` over `background`.
    pub fn new(destination_size: Size, background: Arc<PixelBuffer>) -> Self {
        Self {
            destination_size,
            background,
        }
    }

    /// Size of the final image.
    pub fn destination_size(&self) -> Size {
        self.destination_size
    }

    /// The accumulated image so far.
    pub fn background(&self) -> &Arc<PixelBuffer> {
        &self.background
    }

    /// The accumulated image as an image provider.
    pub fn background_effect(&self) -> EffectHandle {
        self.background.clone()
    }
}
