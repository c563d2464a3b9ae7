use super::*;
use crate::{
    effects::{
        effect::chain_depth,
        filter::{Filter, GrayscaleFilter, NegativeFilter, OpacityFilter},
        source::{SolidColor, image_source},
    },
    foundation::core::Rgba8Premul,
};

fn size(w: u32, h: u32) -> Size {
    Size::new(w, h).unwrap()
}

fn gradient(w: u32, h: u32) -> PixelBuffer {
    let mut data = Vec::new();
    for i in 0..(w * h) {
        let v = (i * 37 % 256) as u8;
        data.extend_from_slice(&[v, 255 - v, v / 2, 255]);
    }
    PixelBuffer::from_raw(size(w, h), ColorMode::Rgba8Premul, data).unwrap()
}

fn render(effect: &dyn Effect, s: Size) -> PixelBuffer {
    let mut out = PixelBuffer::new(s, ColorMode::Rgba8Premul).unwrap();
    effect.render(&mut out, OutputOption::Stretch).unwrap();
    out
}

#[test]
fn empty_filter_list_is_pixel_identical_pass_through() {
    let img = gradient(5, 4);
    let fx = FilterEffect::new(image_source(img.clone()), []);
    assert_eq!(fx.natural_size(), Some(size(5, 4)));
    assert_eq!(render(&fx, size(5, 4)), img);
}

#[test]
fn filters_apply_in_declared_order() {
    let img = gradient(4, 3);
    let f1: FilterHandle = Arc::new(RotationFilter::new(90.0).unwrap());
    let f2: FilterHandle = Arc::new(NegativeFilter);
    let f3: FilterHandle = Arc::new(OpacityFilter::new(0.5).unwrap());

    let fx = FilterEffect::new(image_source(img.clone()), [f1.clone(), f2.clone(), f3.clone()]);
    assert_eq!(fx.filters().len(), 3);
    assert_eq!(fx.natural_size(), Some(size(3, 4)));

    let expected = f3.apply(&f2.apply(&f1.apply(&img).unwrap()).unwrap()).unwrap();
    assert_eq!(render(&fx, size(3, 4)), expected);
}

/// Snaps each colour channel to 0 or full alpha.
#[derive(Debug)]
struct Threshold;

impl Filter for Threshold {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn apply(&self, src: &PixelBuffer) -> LayerResult<PixelBuffer> {
        let mut out = src.clone();
        for px in out.data_mut().chunks_exact_mut(4) {
            let a = px[3];
            for c in &mut px[..3] {
                *c = if *c > 100 { a } else { 0 };
            }
        }
        Ok(out)
    }
}

#[test]
fn order_matters_for_non_commuting_filters() {
    let img = PixelBuffer::filled(size(2, 2), Rgba8Premul::gray(200)).unwrap();
    let threshold: FilterHandle = Arc::new(Threshold);
    let op: FilterHandle = Arc::new(OpacityFilter::new(0.5).unwrap());

    let a = FilterEffect::new(image_source(img.clone()), [threshold.clone(), op.clone()]);
    let b = FilterEffect::new(image_source(img), [op, threshold]);
    let (ra, rb) = (render(&a, size(2, 2)), render(&b, size(2, 2)));
    assert_eq!(ra.pixel(0, 0), Some(Rgba8Premul { r: 128, g: 128, b: 128, a: 128 }));
    assert_eq!(rb.pixel(0, 0), Some(Rgba8Premul { r: 0, g: 0, b: 0, a: 128 }));
}

#[test]
fn unsized_source_is_filtered_at_target_size() {
    let gray: FilterHandle = Arc::new(GrayscaleFilter);
    let fx = FilterEffect::new(Arc::new(SolidColor::gray(90)), [gray]);
    assert_eq!(fx.natural_size(), None);
    let out = render(&fx, size(3, 3));
    assert!(out.data().chunks_exact(4).all(|px| px == [90, 90, 90, 255]));
}

#[test]
fn rotate_wraps_a_single_filter_and_exposes_source() {
    let p = image_source(gradient(2, 2));
    let r = rotate(Arc::clone(&p), 90.0).unwrap();
    assert!(Arc::ptr_eq(r.source().unwrap(), &p));
    assert_eq!(chain_depth(r.as_ref()), 2);
}

#[test]
fn rotations_are_not_fused() {
    let p = image_source(gradient(3, 2));
    let twice = rotate(rotate(Arc::clone(&p), 180.0).unwrap(), 180.0).unwrap();
    let once = rotate(Arc::clone(&p), 360.0).unwrap();

    assert_eq!(chain_depth(twice.as_ref()), 3);
    assert_eq!(chain_depth(once.as_ref()), 2);
    assert_eq!(render(twice.as_ref(), size(3, 2)), render(once.as_ref(), size(3, 2)));
}

#[test]
fn rotate_rejects_non_finite_angle() {
    let p = image_source(gradient(1, 1));
    assert!(rotate(p, f64::INFINITY).is_err());
}
