use crate::{effects::effect::EffectHandle, layer::layer::Layer};

/// Ordered layers plus an optional background effect.
///
/// Index 0 is composited first; every later layer sees the result of the ones before it.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    background: Option<EffectHandle>,
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `background` (stretched) into the accumulator before the first layer.
    pub fn with_background(mut self, background: EffectHandle) -> Self {
        self.background = Some(background);
        self
    }

    /// Append a layer on top.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Append a layer on top.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn background(&self) -> Option<&EffectHandle> {
        self.background.as_ref()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl From<Vec<Layer>> for LayerStack {
    fn from(layers: Vec<Layer>) -> Self {
        Self {
            background: None,
            layers,
        }
    }
}

impl FromIterator<Layer> for LayerStack {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}
