use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::executor::block_on;

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer},
    effects::{
        effect::Effect,
        filter::{GrayscaleFilter, NegativeFilter},
        source::SolidColor,
    },
    foundation::{
        core::{Rgba8Premul, Size},
        error::LayerError,
    },
};

fn ctx() -> LayerContext {
    let size = Size::new(2, 2).unwrap();
    let bg = PixelBuffer::filled(size, Rgba8Premul::from_straight_rgba(10, 20, 30, 255)).unwrap();
    LayerContext::new(size, Arc::new(bg))
}

fn solid() -> EffectHandle {
    Arc::new(SolidColor::gray(100))
}

#[test]
fn ready_effect_ignores_context() {
    let effect = solid();
    let resolver = normalize_effect(EffectSource::from(effect.clone()));
    let d = resolver(&ctx());
    assert!(d.is_resolved());
    let got = block_on(d.resolve()).unwrap();
    assert!(Arc::ptr_eq(&got, &effect));
}

#[test]
fn pending_effect_is_shared_across_invocations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let resolver = normalize_effect(EffectSource::pending(async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(solid())
    }));

    let a = block_on(resolver(&ctx()).resolve()).unwrap();
    let b = block_on(resolver(&ctx()).resolve()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn sync_resolver_sees_context_and_maps_errors_to_failed() {
    let resolver = normalize_effect(EffectSource::resolve(|ctx| {
        assert_eq!(ctx.destination_size(), Size::new(2, 2).unwrap());
        Ok(ctx.background_effect())
    }));
    let d = resolver(&ctx());
    assert!(d.is_resolved());
    assert_eq!(
        block_on(d.resolve()).unwrap().natural_size(),
        Some(Size::new(2, 2).unwrap())
    );

    let failing = normalize_effect(EffectSource::resolve(|_| {
        Err(LayerError::resolution("no effect"))
    }));
    let err = block_on(failing(&ctx()).resolve()).unwrap_err();
    assert!(err.root().is_resolution());
}

#[test]
fn async_resolver_is_called_per_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let resolver = normalize_effect(EffectSource::resolve_async(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(solid()) }
    }));
    let d = resolver(&ctx());
    assert!(!d.is_resolved());
    block_on(d.resolve()).unwrap();
    block_on(resolver(&ctx()).resolve()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn filters_wrap_the_context_background() {
    let resolver = normalize_filters(FilterSource::many([
        Arc::new(GrayscaleFilter) as FilterHandle,
        Arc::new(NegativeFilter) as FilterHandle,
    ]));
    let effect = block_on(resolver(&ctx()).resolve()).unwrap();
    let upstream = effect.source().expect("composite has a source");
    assert_eq!(upstream.natural_size(), Some(Size::new(2, 2).unwrap()));

    let mut out = PixelBuffer::new(Size::new(2, 2).unwrap(), ColorMode::Rgba8Premul).unwrap();
    effect.render(&mut out, Default::default()).unwrap();
    // luma(10, 20, 30) = 18, inverted
    assert_eq!(out.pixel(0, 0).unwrap().to_array(), [237, 237, 237, 255]);
}

#[test]
fn empty_filters_render_the_background_unchanged() {
    let c = ctx();
    let resolver = normalize_filters(FilterSource::many([]));
    let effect = block_on(resolver(&c).resolve()).unwrap();
    let mut out = PixelBuffer::new(Size::new(2, 2).unwrap(), ColorMode::Rgba8Premul).unwrap();
    effect.render(&mut out, Default::default()).unwrap();
    assert_eq!(&out, c.background().as_ref());
}

#[test]
fn pending_filter_failure_builds_no_composite() {
    let resolver = normalize_filters(FilterSource::pending(async {
        Err(LayerError::resolution("filters unavailable"))
    }));
    let err = block_on(resolver(&ctx()).resolve()).unwrap_err();
    assert!(err.root().is_resolution());
}

#[test]
fn async_filter_resolver_wraps_on_completion() {
    let resolver = normalize_filters(FilterSource::resolve_async(|_| async {
        Ok(vec![Arc::new(NegativeFilter) as FilterHandle])
    }));
    let effect = block_on(resolver(&ctx()).resolve()).unwrap();
    assert!(effect.source().is_some());
}

#[test]
fn sources_debug_print_their_shape() {
    assert_eq!(format!("{:?}", EffectSource::from(solid())), r#"EffectSource("ready")"#);
    assert_eq!(format!("{:?}", FilterSource::many([])), r#"FilterSource("ready")"#);
}
