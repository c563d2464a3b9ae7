//! Serializable stack descriptions.
//!
//! A [`StackDesc`] names image files, solid colours and filters; [`StackDesc::build`] turns it
//! into a [`LayerStack`]. Image layers are decoded lazily on first composition and the decoded
//! image is shared by every later one.

use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    buffer::pixel::PixelBuffer,
    compose::{compositor::CompositorOpts, stack::LayerStack},
    effects::{
        composite::{FilterEffect, rotate},
        effect::EffectHandle,
        filter::{
            BlurFilter, FilterHandle, GrayscaleFilter, NegativeFilter, OpacityFilter,
            RotationFilter,
        },
        source::{SolidColor, image_source},
    },
    foundation::{
        core::{Rgba8Premul, Size},
        error::{LayerError, LayerResult},
    },
    layer::{adjustment::AdjustmentLayer, layer::Layer, source::EffectSource, style::LayerStyle},
};

/// A whole composition: output size, optional background and the layers bottom-up.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StackDesc {
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub background: Option<SourceDesc>,
    /// Straight-alpha colour the accumulator starts from.
    #[serde(default)]
    pub clear_rgba: Option<[u8; 4]>,
    #[serde(default)]
    pub layers: Vec<LayerDesc>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerDesc {
    #[serde(default)]
    pub style: LayerStyle,
    /// Declared layer size; the destination size when absent.
    #[serde(default)]
    pub size: Option<Size>,
    pub source: SourceDesc,
}

/// Where a layer's pixels come from.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDesc {
    /// Image file, relative to the description's directory.
    Image { path: String },
    /// Straight-alpha constant colour.
    Solid { rgba: [u8; 4] },
    /// Filters over everything composited below. Only valid as a layer's own source.
    Filters { filters: Vec<FilterDesc> },
    /// `filters` applied to another source.
    Filtered {
        source: Box<SourceDesc>,
        filters: Vec<FilterDesc>,
    },
    /// Another source rotated clockwise.
    Rotate {
        source: Box<SourceDesc>,
        angle_deg: f64,
    },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterDesc {
    Rotation { angle_deg: f64 },
    Grayscale,
    Negative,
    Opacity { value: f32 },
    Blur {
        radius_px: u32,
        #[serde(default)]
        sigma: Option<f32>,
    },
}

impl StackDesc {
    pub fn from_json(text: &str) -> LayerResult<Self> {
        let desc = serde_json::from_str(text).context("parse stack description JSON")?;
        Ok(desc)
    }

    pub fn load(path: &Path) -> LayerResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read stack description '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Compositor options carried by the description.
    pub fn compositor_opts(&self) -> CompositorOpts {
        CompositorOpts {
            clear_rgba: self.clear_rgba,
            ..CompositorOpts::default()
        }
    }

    /// Build the layer stack. Relative image paths resolve against `base_dir`.
    pub fn build(&self, base_dir: &Path) -> LayerResult<LayerStack> {
        let mut stack = LayerStack::new();
        if let Some(background) = &self.background {
            stack = stack.with_background(background.effect(base_dir)?);
        }
        for layer in &self.layers {
            stack.push(layer.build(base_dir)?);
        }
        Ok(stack)
    }
}

impl LayerDesc {
    pub fn build(&self, base_dir: &Path) -> LayerResult<Layer> {
        match &self.source {
            SourceDesc::Filters { filters } => {
                if self.size.is_some() {
                    return Err(LayerError::configuration(
                        "filter layers are sized to the destination and cannot declare a size",
                    ));
                }
                AdjustmentLayer::from_filters(self.style, build_filters(filters)?)
            }
            SourceDesc::Image { path } => {
                let path = base_dir.join(path);
                let source = EffectSource::pending(async move {
                    tracing::debug!(path = %path.display(), "decoding layer image");
                    PixelBuffer::open(&path).map(image_source)
                });
                Layer::new(self.style, source, self.size)
            }
            other => Layer::new(self.style, other.effect(base_dir)?.into(), self.size),
        }
    }
}

impl SourceDesc {
    /// Build a standalone effect. Fails for [`SourceDesc::Filters`], which needs a background.
    pub fn effect(&self, base_dir: &Path) -> LayerResult<EffectHandle> {
        match self {
            Self::Image { path } => Ok(image_source(PixelBuffer::open(&base_dir.join(path))?)),
            Self::Solid { rgba: [r, g, b, a] } => Ok(Arc::new(SolidColor::new(
                Rgba8Premul::from_straight_rgba(*r, *g, *b, *a),
            ))),
            Self::Filters { .. } => Err(LayerError::configuration(
                "a filters source only makes sense as a layer's own source",
            )),
            Self::Filtered { source, filters } => Ok(Arc::new(FilterEffect::new(
                source.effect(base_dir)?,
                build_filters(filters)?,
            ))),
            Self::Rotate { source, angle_deg } => rotate(source.effect(base_dir)?, *angle_deg),
        }
    }
}

impl FilterDesc {
    pub fn build(&self) -> LayerResult<FilterHandle> {
        Ok(match self {
            Self::Rotation { angle_deg } => Arc::new(RotationFilter::new(*angle_deg)?),
            Self::Grayscale => Arc::new(GrayscaleFilter),
            Self::Negative => Arc::new(NegativeFilter),
            Self::Opacity { value } => Arc::new(OpacityFilter::new(*value)?),
            Self::Blur {
                radius_px,
                sigma: Some(sigma),
            } => Arc::new(BlurFilter::new(*radius_px, *sigma)?),
            Self::Blur {
                radius_px,
                sigma: None,
            } => Arc::new(BlurFilter::with_radius(*radius_px)?),
        })
    }
}

fn build_filters(filters: &[FilterDesc]) -> LayerResult<Vec<FilterHandle>> {
    filters.iter().map(FilterDesc::build).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/compose/desc.rs"]
mod tests;
