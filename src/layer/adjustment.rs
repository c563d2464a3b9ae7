use std::future::Future;

use crate::{
    deferred::Deferred,
    effects::{effect::EffectHandle, filter::FilterHandle},
    foundation::error::LayerResult,
    layer::{
        context::LayerContext,
        layer::Layer,
        source::{EffectSource, FilterSource, normalize_filters},
        style::LayerStyle,
    },
};

/// Construction paths for layers that adjust the image composited so far.
///
/// An adjustment layer either passes an effect through unchanged or runs filters, in declared
/// order, over the accumulated image. It never declares a size: its buffer always matches the
/// destination.
pub struct AdjustmentLayer;

impl AdjustmentLayer {
    /// Layer from any effect source.
    pub fn from_source(style: LayerStyle, source: EffectSource) -> LayerResult<Layer> {
        Layer::new(style, source, None)
    }

    /// Layer from any filter source.
    pub fn from_filter_source(style: LayerStyle, source: FilterSource) -> LayerResult<Layer> {
        Layer::from_resolver(style, normalize_filters(source), None)
    }

    pub fn from_effect(style: LayerStyle, effect: EffectHandle) -> LayerResult<Layer> {
        Self::from_source(style, EffectSource::Ready(effect))
    }

    pub fn from_pending_effect(
        style: LayerStyle,
        effect: Deferred<EffectHandle>,
    ) -> LayerResult<Layer> {
        Self::from_source(style, EffectSource::Pending(effect))
    }

    pub fn from_effect_resolver<F>(style: LayerStyle, f: F) -> LayerResult<Layer>
    where
        F: Fn(&LayerContext) -> LayerResult<EffectHandle> + Send + Sync + 'static,
    {
        Self::from_source(style, EffectSource::resolve(f))
    }

    pub fn from_async_effect_resolver<F, Fut>(style: LayerStyle, f: F) -> LayerResult<Layer>
    where
        F: Fn(&LayerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LayerResult<EffectHandle>> + Send + 'static,
    {
        Self::from_source(style, EffectSource::resolve_async(f))
    }

    pub fn from_filter(style: LayerStyle, filter: FilterHandle) -> LayerResult<Layer> {
        Self::from_filter_source(style, FilterSource::one(filter))
    }

    /// An empty list composites the background back onto itself.
    pub fn from_filters(
        style: LayerStyle,
        filters: impl IntoIterator<Item = FilterHandle>,
    ) -> LayerResult<Layer> {
        Self::from_filter_source(style, FilterSource::many(filters))
    }

    pub fn from_pending_filters(
        style: LayerStyle,
        filters: Deferred<Vec<FilterHandle>>,
    ) -> LayerResult<Layer> {
        Self::from_filter_source(style, FilterSource::Pending(filters))
    }

    pub fn from_filter_resolver<F>(style: LayerStyle, f: F) -> LayerResult<Layer>
    where
        F: Fn(&LayerContext) -> LayerResult<Vec<FilterHandle>> + Send + Sync + 'static,
    {
        Self::from_filter_source(style, FilterSource::resolve(f))
    }

    pub fn from_async_filter_resolver<F, Fut>(style: LayerStyle, f: F) -> LayerResult<Layer>
    where
        F: Fn(&LayerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LayerResult<Vec<FilterHandle>>> + Send + 'static,
    {
        Self::from_filter_source(style, FilterSource::resolve_async(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/adjustment.rs"]
mod tests;
