use super::*;
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use futures::executor::block_on;

use crate::{
    effects::{
        effect::EffectHandle,
        source::SolidColor,
    },
    layer::{
        adjustment::AdjustmentLayer,
        style::{AlignX, AlignY, LayerStyle},
    },
};

fn size(w: u32, h: u32) -> Size {
    Size::new(w, h).unwrap()
}

fn solid(r: u8, g: u8, b: u8) -> EffectHandle {
    Arc::new(SolidColor::new(Rgba8Premul { r, g, b, a: 255 }))
}

fn solid_layer(style: LayerStyle, r: u8, g: u8, b: u8) -> Layer {
    AdjustmentLayer::from_effect(style, solid(r, g, b)).unwrap()
}

#[derive(Debug)]
struct Broken;

impl Effect for Broken {
    fn natural_size(&self) -> Option<Size> {
        None
    }

    fn render(&self, _target: &mut PixelBuffer, _option: OutputOption) -> LayerResult<()> {
        Err(LayerError::render("broken effect"))
    }
}

#[test]
fn phases_follow_the_documented_order() {
    let mut phase = LayerPhase::Pending;
    for next in [
        LayerPhase::Resolving,
        LayerPhase::Resolved,
        LayerPhase::Rendered,
        LayerPhase::Blended,
    ] {
        phase = phase.advance(next).unwrap();
    }
    assert!(phase.is_terminal());

    assert!(LayerPhase::Pending.advance(LayerPhase::Rendered).is_err());
    assert!(LayerPhase::Blended.advance(LayerPhase::Resolving).is_err());
    assert!(LayerPhase::Resolved.advance(LayerPhase::Resolving).is_err());
}

#[test]
fn failure_is_reachable_only_while_work_is_in_flight() {
    for from in [LayerPhase::Resolving, LayerPhase::Resolved, LayerPhase::Rendered] {
        assert_eq!(from.advance(LayerPhase::Failed).unwrap(), LayerPhase::Failed);
    }
    for from in [LayerPhase::Pending, LayerPhase::Blended, LayerPhase::Failed] {
        let err = from.advance(LayerPhase::Failed).unwrap_err();
        assert!(err.is_render());
    }
}

#[test]
fn zero_destination_is_a_configuration_error() {
    let stack = LayerStack::new();
    let zero = Size {
        width: 0,
        height: 10,
    };
    let err = block_on(compose_layers(&stack, zero)).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn oversized_declared_layer_is_rejected_before_any_resolution() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let first = AdjustmentLayer::from_effect_resolver(LayerStyle::default(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(solid(1, 2, 3))
    })
    .unwrap();
    let big = Layer::new(LayerStyle::default(), solid(0, 0, 0).into(), Some(size(8, 2))).unwrap();
    let stack = LayerStack::from(vec![first, big]);

    let err = block_on(compose_layers(&stack, size(4, 4))).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_stack_yields_clear_accumulator() {
    let out = block_on(compose_layers(&LayerStack::new(), size(3, 2))).unwrap();
    assert_eq!(out.size(), size(3, 2));
    assert!(out.data().iter().all(|&b| b == 0));

    let mut compositor = Compositor::new(CompositorOpts {
        clear_rgba: Some([255, 0, 0, 128]),
        ..CompositorOpts::default()
    });
    let out = block_on(compositor.compose(&LayerStack::new(), size(3, 2))).unwrap();
    assert_eq!(out.pixel(2, 1), Some(Rgba8Premul { r: 128, g: 0, b: 0, a: 128 }));
}

#[test]
fn background_effect_seeds_the_accumulator() {
    let stack = LayerStack::new().with_background(solid(10, 20, 30));
    let out = block_on(compose_layers(&stack, size(2, 2))).unwrap();
    assert_eq!(out.pixel(1, 1), Some(Rgba8Premul { r: 10, g: 20, b: 30, a: 255 }));

    let mut compositor = Compositor::new(CompositorOpts {
        clear_rgba: Some([0, 0, 0, 255]),
        ..CompositorOpts::default()
    });
    let out = block_on(compositor.compose(&stack, size(2, 2))).unwrap();
    assert_eq!(out.pixel(0, 0), Some(Rgba8Premul { r: 10, g: 20, b: 30, a: 255 }));
}

#[test]
fn declared_layer_is_aligned_inside_destination() {
    let style = LayerStyle::default().with_alignment(AlignX::End, AlignY::Center);
    let layer = Layer::new(style, solid(9, 9, 9).into(), Some(size(2, 2))).unwrap();
    let stack = LayerStack::new().with_layer(layer);
    let out = block_on(compose_layers(&stack, size(4, 4))).unwrap();

    for y in 0..4 {
        for x in 0..4 {
            let inside = x >= 2 && (1..3).contains(&y);
            let expected = if inside {
                Rgba8Premul { r: 9, g: 9, b: 9, a: 255 }
            } else {
                Rgba8Premul::transparent()
            };
            assert_eq!(out.pixel(x, y), Some(expected), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn later_layers_see_the_post_blend_accumulator() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let probe = AdjustmentLayer::from_effect_resolver(LayerStyle::default(), move |ctx| {
        log.lock().unwrap().push(ctx.background().pixel(0, 0));
        Ok(ctx.background_effect())
    })
    .unwrap();

    let stack = LayerStack::new()
        .with_layer(solid_layer(LayerStyle::default(), 50, 60, 70))
        .with_layer(probe.clone())
        .with_layer(solid_layer(LayerStyle::default(), 1, 2, 3))
        .with_layer(probe);
    block_on(compose_layers(&stack, size(2, 2))).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            Some(Rgba8Premul { r: 50, g: 60, b: 70, a: 255 }),
            Some(Rgba8Premul { r: 1, g: 2, b: 3, a: 255 }),
        ]
    );
}

#[test]
fn blend_mode_and_opacity_come_from_the_style() {
    let multiply = LayerStyle::blend(BlendMode::Multiply);
    let stack = LayerStack::new()
        .with_layer(solid_layer(LayerStyle::default(), 200, 100, 50))
        .with_layer(solid_layer(multiply, 128, 128, 128))
        .with_layer(solid_layer(LayerStyle::default().with_opacity(0.0), 255, 255, 255));
    let out = block_on(compose_layers(&stack, size(1, 1))).unwrap();

    let expected = crate::effects::blend::blend_pixel(
        [200, 100, 50, 255],
        [128, 128, 128, 255],
        BlendMode::Multiply,
        1.0,
    );
    assert_eq!(out.pixel(0, 0).unwrap().to_array(), expected);
}

#[test]
fn scratch_buffer_is_reused_across_layers_and_compositions() {
    let stack = LayerStack::new()
        .with_layer(solid_layer(LayerStyle::default(), 1, 1, 1))
        .with_layer(solid_layer(LayerStyle::default(), 2, 2, 2))
        .with_layer(solid_layer(LayerStyle::default(), 3, 3, 3));
    let mut compositor = Compositor::default();

    let (_, first) = block_on(compositor.compose_with_stats(&stack, size(4, 4))).unwrap();
    assert_eq!(first.layers_total, 3);
    assert_eq!(first.layers_blended, 3);
    assert_eq!((first.buffers_allocated, first.buffers_reused), (1, 2));

    let (_, second) = block_on(compositor.compose_with_stats(&stack, size(4, 4))).unwrap();
    assert_eq!((second.buffers_allocated, second.buffers_reused), (0, 3));

    let (_, resized) = block_on(compositor.compose_with_stats(&stack, size(5, 4))).unwrap();
    assert_eq!((resized.buffers_allocated, resized.buffers_reused), (1, 2));
}

#[test]
fn disabling_scratch_reuse_allocates_per_layer() {
    let stack = LayerStack::new()
        .with_layer(solid_layer(LayerStyle::default(), 1, 1, 1))
        .with_layer(solid_layer(LayerStyle::default(), 2, 2, 2));
    let mut compositor = Compositor::new(CompositorOpts {
        reuse_scratch: false,
        ..CompositorOpts::default()
    });
    let (_, stats) = block_on(compositor.compose_with_stats(&stack, size(2, 2))).unwrap();
    assert_eq!((stats.buffers_allocated, stats.buffers_reused), (2, 0));
}

#[test]
fn resolution_failure_aborts_before_later_layers() {
    let later = Arc::new(AtomicUsize::new(0));
    let counter = later.clone();
    let stack = LayerStack::new()
        .with_layer(solid_layer(LayerStyle::default(), 1, 1, 1))
        .with_layer(
            AdjustmentLayer::from_effect_resolver(LayerStyle::default(), |_| {
                Err(LayerError::resolution("effect unavailable"))
            })
            .unwrap(),
        )
        .with_layer(
            AdjustmentLayer::from_effect_resolver(LayerStyle::default(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(solid(0, 0, 0))
            })
            .unwrap(),
        );

    let err = block_on(compose_layers(&stack, size(2, 2))).unwrap_err();
    assert!(err.root().is_resolution());
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[test]
fn render_failure_aborts_composition() {
    let broken: EffectHandle = Arc::new(Broken);
    let stack = LayerStack::new()
        .with_layer(AdjustmentLayer::from_effect(LayerStyle::default(), broken).unwrap());
    let err = block_on(compose_layers(&stack, size(2, 2))).unwrap_err();
    assert!(err.is_render());
}

#[test]
fn pending_resolutions_are_counted() {
    let stack = LayerStack::new()
        .with_layer(
            AdjustmentLayer::from_async_effect_resolver(LayerStyle::default(), |_| async {
                Ok(solid(4, 4, 4))
            })
            .unwrap(),
        )
        .with_layer(solid_layer(LayerStyle::default(), 5, 5, 5));
    let (_, stats) = block_on(Compositor::default().compose_with_stats(&stack, size(2, 2))).unwrap();
    assert_eq!(stats.suspended_resolutions, 1);
}
