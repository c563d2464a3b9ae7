use crate::{
    effects::{blend::BlendMode, effect::OutputOption},
    foundation::{
        core::Size,
        error::{LayerError, LayerResult},
    },
};

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
/// Horizontal placement of a layer narrower than the destination.
pub enum AlignX {
    /// Align to start (left).
    #[default]
    Start,
    /// Align to center.
    Center,
    /// Align to end (right).
    End,
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
/// Vertical placement of a layer shorter than the destination.
pub enum AlignY {
    /// Align to start (top).
    #[default]
    Start,
    /// Align to center.
    Center,
    /// Align to end (bottom).
    End,
}

/// How a layer's rendered output combines with the accumulated image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerStyle {
    /// Blend function.
    #[serde(default)]
    pub blend: BlendMode,
    /// Layer opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Horizontal alignment inside the destination.
    #[serde(default)]
    pub align_x: AlignX,
    /// Vertical alignment inside the destination.
    #[serde(default)]
    pub align_y: AlignY,
    /// Fit used when rendering the layer's effect into its buffer.
    #[serde(default)]
    pub output: OutputOption,
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            blend: BlendMode::Normal,
            opacity: 1.0,
            align_x: AlignX::Start,
            align_y: AlignY::Start,
            output: OutputOption::Stretch,
        }
    }
}

impl LayerStyle {
    /// Default style with the given blend mode.
    pub fn blend(blend: BlendMode) -> Self {
        Self {
            blend,
            ..Self::default()
        }
    }

    /// Replace the opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Replace the alignment.
    pub fn with_alignment(mut self, align_x: AlignX, align_y: AlignY) -> Self {
        self.align_x = align_x;
        self.align_y = align_y;
        self
    }

    /// Replace the output fit.
    pub fn with_output(mut self, output: OutputOption) -> Self {
        self.output = output;
        self
    }

    /// Reject opacities that are not finite or fall outside `[0, 1]`.
    pub fn validate(&self) -> LayerResult<()> {
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(LayerError::configuration(format!(
                "layer opacity must be finite and within [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Top-left corner of a `layer`-sized buffer placed inside `destination`.
    pub fn origin(&self, layer: Size, destination: Size) -> (i64, i64) {
        let free_x = i64::from(destination.width) - i64::from(layer.width);
        let free_y = i64::from(destination.height) - i64::from(layer.height);
        (self.align_x.offset(free_x), self.align_y.offset(free_y))
    }
}

impl AlignX {
    fn offset(self, free: i64) -> i64 {
        match self {
            Self::Start => 0,
            Self::Center => free / 2,
            Self::End => free,
        }
    }
}

impl AlignY {
    fn offset(self, free: i64) -> i64 {
        match self {
            Self::Start => 0,
            Self::Center => free / 2,
            Self::End => free,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/style.rs"]
mod tests;
