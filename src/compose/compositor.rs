//! Bottom-up layer composition.
//!
//! For every layer in stack order the compositor:
//! 1. snapshots the accumulator into a [`LayerContext`],
//! 2. calls the layer's resolver and awaits the [`Deferred`](crate::Deferred) effect
//!    (the only suspension point),
//! 3. renders the effect through the buffer-reuse path into a buffer of the layer's size,
//! 4. blends that buffer onto the accumulator per the layer's style.
//!
//! Layers are never evaluated concurrently, and the first failure aborts the composition.

use std::sync::Arc;

use crate::{
    buffer::{
        pixel::{ColorMode, PixelBuffer},
        reuse::render_reusing,
    },
    compose::stack::LayerStack,
    effects::{
        blend::{BlendMode, blend_into},
        effect::{Effect, OutputOption},
    },
    foundation::{
        core::{Rgba8Premul, Size},
        error::{LayerError, LayerResult},
    },
    layer::{context::LayerContext, layer::Layer},
};

/// Compositor configuration.
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Straight-alpha colour the accumulator starts from. Transparent when unset.
    pub clear_rgba: Option<[u8; 4]>,
    /// Keep the last layer buffer and render the next layer into it when geometry allows.
    pub reuse_scratch: bool,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            clear_rgba: None,
            reuse_scratch: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Where a layer is in its trip through the compositor.
pub enum LayerPhase {
    /// Not started.
    Pending,
    /// Resolver called, effect not yet available.
    Resolving,
    /// Effect available.
    Resolved,
    /// Effect rendered into the layer buffer.
    Rendered,
    /// Layer buffer blended onto the accumulator.
    Blended,
    /// Resolution, rendering or blending failed.
    Failed,
}

impl LayerPhase {
    /// Move to `next`, rejecting transitions the compositor never makes.
    pub fn advance(self, next: LayerPhase) -> LayerResult<LayerPhase> {
        use LayerPhase::*;
        let allowed = match (self, next) {
            (Pending, Resolving)
            | (Resolving, Resolved)
            | (Resolved, Rendered)
            | (Rendered, Blended) => true,
            (_, Failed) => self.can_fail(),
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(LayerError::render(format!(
                "invalid layer phase transition {self:?} -> {next:?}"
            )))
        }
    }

    /// `true` while work that can fail is in flight.
    pub fn can_fail(self) -> bool {
        matches!(self, Self::Resolving | Self::Resolved | Self::Rendered)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Blended | Self::Failed)
    }
}

/// Counters collected by [`Compositor::compose_with_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositionStats {
    pub layers_total: u64,
    pub layers_blended: u64,
    /// Layers whose effect was not known when their resolver returned.
    pub suspended_resolutions: u64,
    pub buffers_reused: u64,
    pub buffers_allocated: u64,
}

/// Composes layer stacks, keeping a scratch buffer between layers and between calls.
#[derive(Debug, Default)]
pub struct Compositor {
    opts: CompositorOpts,
    scratch: Option<PixelBuffer>,
}

impl Compositor {
    pub fn new(opts: CompositorOpts) -> Self {
        Self {
            opts,
            scratch: None,
        }
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Compose `stack` into a premultiplied RGBA image of `size`.
    pub async fn compose(&mut self, stack: &LayerStack, size: Size) -> LayerResult<PixelBuffer> {
        self.compose_with_stats(stack, size)
            .await
            .map(|(image, _)| image)
    }

    #[tracing::instrument(skip(self, stack), fields(layers = stack.len()))]
    pub async fn compose_with_stats(
        &mut self,
        stack: &LayerStack,
        size: Size,
    ) -> LayerResult<(PixelBuffer, CompositionStats)> {
        size.validate()?;
        for (index, layer) in stack.layers().iter().enumerate() {
            let target = layer.target_size(size);
            if !target.fits_within(size) {
                return Err(LayerError::configuration(format!(
                    "layer {index} declares size {target}, larger than destination {size}"
                )));
            }
        }

        let mut acc = Arc::new(self.initial_accumulator(stack, size)?);
        let mut stats = CompositionStats {
            layers_total: stack.len() as u64,
            ..CompositionStats::default()
        };

        for (index, layer) in stack.layers().iter().enumerate() {
            self.compose_layer(index, layer, &mut acc, size, &mut stats)
                .await?;
        }

        let image = Arc::try_unwrap(acc).unwrap_or_else(|shared| (*shared).clone());
        tracing::debug!(?stats, "composition finished");
        Ok((image, stats))
    }

    async fn compose_layer(
        &mut self,
        index: usize,
        layer: &Layer,
        acc: &mut Arc<PixelBuffer>,
        size: Size,
        stats: &mut CompositionStats,
    ) -> LayerResult<()> {
        let mut phase = LayerPhase::Pending.advance(LayerPhase::Resolving)?;

        let resolved = {
            let ctx = LayerContext::new(size, Arc::clone(acc));
            let deferred = layer.resolve(&ctx);
            if !deferred.is_resolved() {
                stats.suspended_resolutions += 1;
                tracing::debug!(layer = index, "awaiting layer effect");
            }
            deferred.resolve().await
        };
        let effect = match resolved {
            Ok(effect) => effect,
            Err(err) => return Err(fail(index, phase, err)),
        };
        phase = phase.advance(LayerPhase::Resolved)?;

        let target = layer.target_size(size);
        let style = *layer.style();
        let scratch = self.scratch.take();
        let rendered = render_reusing(
            effect.as_ref(),
            scratch,
            target,
            Some(ColorMode::Rgba8Premul),
            style.output,
        );
        // The effect may hold the accumulator snapshot; release it before writing.
        drop(effect);
        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(err) => return Err(fail(index, phase, err)),
        };
        if rendered.reused {
            stats.buffers_reused += 1;
        } else {
            stats.buffers_allocated += 1;
        }
        phase = phase.advance(LayerPhase::Rendered)?;

        let origin = style.origin(target, size);
        if let Err(err) = blend_into(
            Arc::make_mut(acc),
            &rendered.buffer,
            origin,
            style.blend,
            style.opacity,
        ) {
            return Err(fail(index, phase, err));
        }
        phase = phase.advance(LayerPhase::Blended)?;
        stats.layers_blended += 1;
        tracing::debug!(
            layer = index,
            ?phase,
            blend = ?style.blend,
            reused = rendered.reused,
            "layer composited"
        );

        if self.opts.reuse_scratch {
            self.scratch = Some(rendered.buffer);
        }
        Ok(())
    }

    fn initial_accumulator(&self, stack: &LayerStack, size: Size) -> LayerResult<PixelBuffer> {
        let mut acc = PixelBuffer::new(size, ColorMode::Rgba8Premul)?;
        if let Some([r, g, b, a]) = self.opts.clear_rgba {
            acc.fill(Rgba8Premul::from_straight_rgba(r, g, b, a));
        }
        let Some(background) = stack.background() else {
            return Ok(acc);
        };
        if self.opts.clear_rgba.is_none() {
            background.render(&mut acc, OutputOption::Stretch)?;
            return Ok(acc);
        }
        let mut layer = PixelBuffer::new(size, ColorMode::Rgba8Premul)?;
        background.render(&mut layer, OutputOption::Stretch)?;
        blend_into(&mut acc, &layer, (0, 0), BlendMode::Normal, 1.0)?;
        Ok(acc)
    }
}

fn fail(index: usize, phase: LayerPhase, err: LayerError) -> LayerError {
    debug_assert!(phase.can_fail());
    tracing::debug!(layer = index, ?phase, error = %err, "layer failed, aborting composition");
    err
}

/// Compose `stack` at `size` with default options.
pub async fn compose_layers(stack: &LayerStack, size: Size) -> LayerResult<PixelBuffer> {
    Compositor::default().compose(stack, size).await
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
