//! layerstack assembles an image from an ordered stack of layers.
//!
//! Each layer supplies an effect, possibly asynchronously and possibly depending on facts only
//! known once composition starts (the destination size and the image composited so far). The
//! compositor resolves, renders and blends the layers one at a time.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: `Layer + LayerContext -> Deferred<EffectHandle>`
//! 2. **Render**: `EffectHandle -> PixelBuffer` through the buffer-reuse path
//! 3. **Blend**: `PixelBuffer -> accumulator` per the layer's [`LayerStyle`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single evaluation**: every pending computation runs at most once, however many
//!   compositions or clones observe it.
//! - **Strict order**: a layer is never rendered before every layer below it is blended.
//! - **Premultiplied RGBA8** end-to-end inside the compositor.
#![forbid(unsafe_code)]

mod buffer;
mod compose;
mod deferred;
mod effects;
mod foundation;
mod layer;

pub use buffer::pixel::{ColorMode, PixelBuffer};
pub use buffer::reuse::{RenderToBuffer, is_reusable};
pub use compose::compositor::{
    CompositionStats, Compositor, CompositorOpts, LayerPhase, compose_layers,
};
pub use compose::desc::{FilterDesc, LayerDesc, SourceDesc, StackDesc};
pub use compose::stack::LayerStack;
pub use deferred::Deferred;
pub use effects::blend::BlendMode;
pub use effects::composite::{FilterEffect, rotate};
pub use effects::effect::{Effect, EffectHandle, OutputOption, chain_depth};
pub use effects::filter::{
    BlurFilter, Filter, FilterHandle, GrayscaleFilter, NegativeFilter, OpacityFilter,
    RotationFilter,
};
pub use effects::source::{SolidColor, image_source};
pub use foundation::core::{Affine, Point, Rect, Rgba8Premul, Size, Vec2};
pub use foundation::error::{LayerError, LayerResult};
pub use layer::adjustment::AdjustmentLayer;
pub use layer::context::LayerContext;
pub use layer::layer::Layer;
pub use layer::source::{EffectSource, FilterSource, ResolveAsyncFn, ResolveFn, Resolver};
pub use layer::style::{AlignX, AlignY, LayerStyle};
