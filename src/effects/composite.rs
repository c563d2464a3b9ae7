use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    buffer::pixel::{ColorMode, PixelBuffer},
    effects::{
        effect::{Effect, EffectHandle, OutputOption},
        filter::{FilterHandle, RotationFilter},
        sample::draw_fitted,
    },
    foundation::{
        core::Size,
        error::LayerResult,
    },
};

/// An effect that renders `source` and runs `filters` over it in declared order.
///
/// With no filters it is a pass-through: rendering it is identical to rendering `source`.
#[derive(Debug, Clone)]
pub struct FilterEffect {
    source: EffectHandle,
    filters: SmallVec<[FilterHandle; 4]>,
}

impl FilterEffect {
    /// Chain `filters` after `source`.
    pub fn new(source: EffectHandle, filters: impl IntoIterator<Item = FilterHandle>) -> Self {
        Self {
            source,
            filters: filters.into_iter().collect(),
        }
    }

    /// Filters in application order.
    pub fn filters(&self) -> &[FilterHandle] {
        &self.filters
    }

    /// The provider being filtered.
    pub fn input(&self) -> &EffectHandle {
        &self.source
    }
}

impl Effect for FilterEffect {
    fn natural_size(&self) -> Option<Size> {
        let base = self.source.natural_size()?;
        Some(self.filters.iter().fold(base, |s, f| f.output_size(s)))
    }

    fn render(&self, target: &mut PixelBuffer, option: OutputOption) -> LayerResult<()> {
        target.expect_rgba8_premul("filter effect target")?;
        if self.filters.is_empty() {
            return self.source.render(target, option);
        }

        let working = self.source.natural_size().unwrap_or(target.size());
        let mut buf = PixelBuffer::new(working, ColorMode::Rgba8Premul)?;
        self.source.render(&mut buf, OutputOption::Stretch)?;
        for filter in &self.filters {
            buf = filter.apply(&buf)?;
            tracing::trace!(filter = filter.name(), size = %buf.size(), "applied filter");
        }
        draw_fitted(&buf, target, option)
    }

    fn source(&self) -> Option<&EffectHandle> {
        Some(&self.source)
    }
}

/// Wrap `provider` in a single rotation filter, `angle_deg` degrees clockwise.
///
/// Rotations are never merged: rotating a rotated provider yields a two-deep chain even when
/// the angles cancel.
pub fn rotate(provider: EffectHandle, angle_deg: f64) -> LayerResult<EffectHandle> {
    let filter: FilterHandle = Arc::new(RotationFilter::new(angle_deg)?);
    Ok(Arc::new(FilterEffect::new(provider, [filter])))
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
