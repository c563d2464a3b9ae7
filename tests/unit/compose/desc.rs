use super::*;

use futures::executor::block_on;

use crate::{compose::compositor::Compositor, effects::effect::chain_depth};

const STACK: &str = r#"{
    "size": { "width": 4, "height": 4 },
    "background": { "kind": "solid", "rgba": [200, 100, 50, 255] },
    "layers": [
        { "source": { "kind": "filters", "filters": [ { "kind": "rotation", "angle_deg": 90.0 } ] } },
        {
            "style": { "blend": "Multiply" },
            "source": { "kind": "solid", "rgba": [128, 128, 128, 255] }
        },
        {
            "style": { "opacity": 0.5, "align_x": "End" },
            "size": { "width": 2, "height": 2 },
            "source": { "kind": "rotate", "angle_deg": 180.0, "source": { "kind": "solid", "rgba": [0, 0, 0, 255] } }
        }
    ]
}"#;

#[test]
fn parses_sources_styles_and_sizes() {
    let desc = StackDesc::from_json(STACK).unwrap();
    assert_eq!(desc.size, Some(Size::new(4, 4).unwrap()));
    assert_eq!(desc.layers.len(), 3);
    assert!(matches!(desc.layers[0].source, SourceDesc::Filters { .. }));
    assert_eq!(desc.layers[1].style.blend, crate::BlendMode::Multiply);
    assert_eq!(desc.layers[2].size, Some(Size::new(2, 2).unwrap()));
    assert_eq!(desc.layers[2].style.opacity, 0.5);
}

#[test]
fn builds_a_composable_stack() {
    let desc = StackDesc::from_json(STACK).unwrap();
    let stack = desc.build(Path::new(".")).unwrap();
    assert_eq!(stack.len(), 3);
    assert!(stack.background().is_some());
    assert_eq!(stack.layers()[2].declared_size(), Some(Size::new(2, 2).unwrap()));

    let mut compositor = Compositor::new(desc.compositor_opts());
    let out = block_on(compositor.compose(&stack, Size::new(4, 4).unwrap())).unwrap();
    assert_eq!(out.size(), Size::new(4, 4).unwrap());
    // bottom-left is untouched by the declared top-right layer
    let expected = crate::effects::blend::blend_pixel(
        [200, 100, 50, 255],
        [128, 128, 128, 255],
        crate::BlendMode::Multiply,
        1.0,
    );
    assert_eq!(out.pixel(0, 3).unwrap().to_array(), expected);
}

#[test]
fn rotate_source_builds_a_single_rotation() {
    let src = SourceDesc::Rotate {
        source: Box::new(SourceDesc::Solid {
            rgba: [1, 2, 3, 255],
        }),
        angle_deg: 45.0,
    };
    let effect = src.effect(Path::new(".")).unwrap();
    assert_eq!(chain_depth(effect.as_ref()), 2);
}

#[test]
fn filters_source_is_rejected_outside_a_layer() {
    let src = SourceDesc::Filters { filters: vec![] };
    let err = src.effect(Path::new(".")).unwrap_err();
    assert!(err.is_configuration());

    let layer = LayerDesc {
        style: LayerStyle::default(),
        size: Some(Size::new(2, 2).unwrap()),
        source: src,
    };
    assert!(layer.build(Path::new(".")).unwrap_err().is_configuration());
}

#[test]
fn invalid_filter_parameters_surface_as_configuration_errors() {
    let err = FilterDesc::Opacity { value: 3.0 }.build().unwrap_err();
    assert!(err.is_configuration());
    FilterDesc::Blur {
        radius_px: 2,
        sigma: None,
    }
    .build()
    .unwrap();
}

#[test]
fn missing_image_fails_on_first_composition() {
    let layer = LayerDesc {
        style: LayerStyle::default(),
        size: None,
        source: SourceDesc::Image {
            path: "does-not-exist.png".to_owned(),
        },
    }
    .build(Path::new("/nonexistent-dir"))
    .unwrap();
    let stack = LayerStack::new().with_layer(layer);
    let err = block_on(crate::compose_layers(&stack, Size::new(2, 2).unwrap())).unwrap_err();
    assert!(matches!(err.root(), LayerError::Other(_)));
}

#[test]
fn malformed_json_is_reported() {
    assert!(StackDesc::from_json("{ \"layers\": [ { } ] }").is_err());
}
