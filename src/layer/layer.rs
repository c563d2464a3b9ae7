use std::fmt;

use crate::{
    deferred::Deferred,
    effects::effect::EffectHandle,
    foundation::{core::Size, error::LayerResult},
    layer::{
        context::LayerContext,
        source::{EffectSource, Resolver, normalize_effect},
        style::LayerStyle,
    },
};

/// One entry of a layer stack: a style, a resolver and an optional declared size.
///
/// A layer carries no per-composition state, so the same layer can be composited any number
/// of times. Clones share the resolver.
#[derive(Clone)]
pub struct Layer {
    style: LayerStyle,
    resolver: Resolver,
    declared_size: Option<Size>,
}

impl Layer {
    /// Build a layer from any effect source.
    ///
    /// `declared_size = None` sizes the layer to the destination at composition time.
    pub fn new(
        style: LayerStyle,
        source: EffectSource,
        declared_size: Option<Size>,
    ) -> LayerResult<Self> {
        Self::from_resolver(style, normalize_effect(source), declared_size)
    }

    /// Build a layer around a custom resolver.
    pub fn from_resolver(
        style: LayerStyle,
        resolver: Resolver,
        declared_size: Option<Size>,
    ) -> LayerResult<Self> {
        style.validate()?;
        if let Some(size) = declared_size {
            size.validate()?;
        }
        Ok(Self {
            style,
            resolver,
            declared_size,
        })
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    pub fn declared_size(&self) -> Option<Size> {
        self.declared_size
    }

    /// The layer's resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Invoke the resolver for `ctx`.
    pub fn resolve(&self, ctx: &LayerContext) -> Deferred<EffectHandle> {
        (self.resolver)(ctx)
    }

    /// Size of the buffer this layer renders into when composited at `destination`.
    pub fn target_size(&self, destination: Size) -> Size {
        self.declared_size.unwrap_or(destination)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("style", &self.style)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/layer.rs"]
mod tests;
