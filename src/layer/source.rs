//! The four ways a layer can supply its effect, and their normalization into a [`Resolver`].
//!
//! Every [`EffectSource`] and [`FilterSource`] variant carries exactly the payload it needs.
//! Normalizing one produces a function from [`LayerContext`] to [`Deferred<EffectHandle>`],
//! which is the only thing the compositor ever calls.

use std::{fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};

use crate::{
    deferred::Deferred,
    effects::{
        composite::FilterEffect,
        effect::EffectHandle,
        filter::FilterHandle,
    },
    foundation::error::LayerResult,
    layer::context::LayerContext,
};

/// Given the composition-time context, produce the layer's eventual effect.
pub type Resolver = Arc<dyn Fn(&LayerContext) -> Deferred<EffectHandle> + Send + Sync>;

/// Context-driven synchronous resolver.
pub type ResolveFn<T> = Arc<dyn Fn(&LayerContext) -> LayerResult<T> + Send + Sync>;

/// Context-driven asynchronous resolver.
pub type ResolveAsyncFn<T> =
    Arc<dyn Fn(&LayerContext) -> BoxFuture<'static, LayerResult<T>> + Send + Sync>;

/// Supply of a layer's effect.
#[derive(Clone)]
pub enum EffectSource {
    /// Already-built effect; the context is ignored.
    Ready(EffectHandle),
    /// Computation started ahead of composition. Shared across passes.
    Pending(Deferred<EffectHandle>),
    /// Called with the context at resolution time.
    Resolve(ResolveFn<EffectHandle>),
    /// Called with the context at resolution time; the returned future is awaited.
    ResolveAsync(ResolveAsyncFn<EffectHandle>),
}

impl EffectSource {
    /// Start `fut` now (lazily) and share its outcome across every composition.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = LayerResult<EffectHandle>> + Send + 'static,
    {
        Self::Pending(Deferred::pending(fut))
    }

    /// Resolve synchronously from the context.
    pub fn resolve<F>(f: F) -> Self
    where
        F: Fn(&LayerContext) -> LayerResult<EffectHandle> + Send + Sync + 'static,
    {
        Self::Resolve(Arc::new(f))
    }

    /// Resolve asynchronously from the context.
    pub fn resolve_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&LayerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LayerResult<EffectHandle>> + Send + 'static,
    {
        Self::ResolveAsync(Arc::new(move |ctx: &LayerContext| f(ctx).boxed()))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Pending(_) => "pending",
            Self::Resolve(_) => "resolve",
            Self::ResolveAsync(_) => "resolve_async",
        }
    }
}

impl From<EffectHandle> for EffectSource {
    fn from(effect: EffectHandle) -> Self {
        Self::Ready(effect)
    }
}

impl fmt::Debug for EffectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectSource").field(&self.kind()).finish()
    }
}

/// Supply of the filters an adjustment layer runs over the accumulated image.
#[derive(Clone)]
pub enum FilterSource {
    /// Known filters; the context is ignored.
    Ready(Vec<FilterHandle>),
    /// Filters computed ahead of composition. Shared across passes.
    Pending(Deferred<Vec<FilterHandle>>),
    /// Called with the context at resolution time.
    Resolve(ResolveFn<Vec<FilterHandle>>),
    /// Called with the context at resolution time; the returned future is awaited.
    ResolveAsync(ResolveAsyncFn<Vec<FilterHandle>>),
}

impl FilterSource {
    /// A single known filter.
    pub fn one(filter: FilterHandle) -> Self {
        Self::Ready(vec![filter])
    }

    /// Known filters in application order.
    pub fn many(filters: impl IntoIterator<Item = FilterHandle>) -> Self {
        Self::Ready(filters.into_iter().collect())
    }

    /// Filters produced by `fut`, evaluated once and shared.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = LayerResult<Vec<FilterHandle>>> + Send + 'static,
    {
        Self::Pending(Deferred::pending(fut))
    }

    /// Pick filters synchronously from the context.
    pub fn resolve<F>(f: F) -> Self
    where
        F: Fn(&LayerContext) -> LayerResult<Vec<FilterHandle>> + Send + Sync + 'static,
    {
        Self::Resolve(Arc::new(f))
    }

    /// Pick filters asynchronously from the context.
    pub fn resolve_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&LayerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LayerResult<Vec<FilterHandle>>> + Send + 'static,
    {
        Self::ResolveAsync(Arc::new(move |ctx: &LayerContext| f(ctx).boxed()))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Pending(_) => "pending",
            Self::Resolve(_) => "resolve",
            Self::ResolveAsync(_) => "resolve_async",
        }
    }
}

impl From<FilterHandle> for FilterSource {
    fn from(filter: FilterHandle) -> Self {
        Self::one(filter)
    }
}

impl fmt::Debug for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterSource").field(&self.kind()).finish()
    }
}

pub(crate) fn normalize_effect(source: EffectSource) -> Resolver {
    match source {
        EffectSource::Ready(effect) => {
            let ready = Deferred::ready(effect);
            Arc::new(move |_: &LayerContext| ready.clone())
        }
        EffectSource::Pending(deferred) => Arc::new(move |_: &LayerContext| deferred.clone()),
        EffectSource::Resolve(f) => Arc::new(move |ctx: &LayerContext| match f(ctx) {
            Ok(effect) => Deferred::ready(effect),
            Err(err) => Deferred::failed(err),
        }),
        EffectSource::ResolveAsync(f) => {
            Arc::new(move |ctx: &LayerContext| Deferred::pending(f(ctx)))
        }
    }
}

/// Filters run over the context's background; the result is the layer's effect.
pub(crate) fn normalize_filters(source: FilterSource) -> Resolver {
    match source {
        FilterSource::Ready(filters) => Arc::new(move |ctx: &LayerContext| {
            Deferred::ready(over_background(ctx.background_effect(), filters.clone()))
        }),
        FilterSource::Pending(deferred) => Arc::new(move |ctx: &LayerContext| {
            let background = ctx.background_effect();
            deferred
                .clone()
                .map(move |filters| over_background(background, filters))
        }),
        FilterSource::Resolve(f) => Arc::new(move |ctx: &LayerContext| match f(ctx) {
            Ok(filters) => Deferred::ready(over_background(ctx.background_effect(), filters)),
            Err(err) => Deferred::failed(err),
        }),
        FilterSource::ResolveAsync(f) => Arc::new(move |ctx: &LayerContext| {
            let background = ctx.background_effect();
            Deferred::pending(f(ctx)).map(move |filters| over_background(background, filters))
        }),
    }
}

fn over_background(background: EffectHandle, filters: Vec<FilterHandle>) -> EffectHandle {
    Arc::new(FilterEffect::new(background, filters))
}

#[cfg(test)]
#[path = "../../tests/unit/layer/source.rs"]
mod tests;
