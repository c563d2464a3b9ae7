use std::sync::Arc;

/// Convenience result type used across layerstack.
pub type LayerResult<T> = Result<T, LayerError>;

/// Top-level error taxonomy for layer resolution and composition.
#[derive(thiserror::Error, Debug)]
pub enum LayerError {
    /// An upstream computation supplying an effect or filters failed.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Rendering an effect into a buffer failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid construction input (style, sizes, stack description).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A failure observed through a shared deferred value.
    ///
    /// Every consumer of the same deferred computation sees the same underlying error.
    #[error(transparent)]
    Upstream(Arc<LayerError>),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayerError {
    /// Build a [`LayerError::Resolution`] value.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Build a [`LayerError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LayerError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The original error, looking through any number of [`LayerError::Upstream`] wrappers.
    pub fn root(&self) -> &LayerError {
        let mut cur = self;
        while let LayerError::Upstream(inner) = cur {
            cur = inner.as_ref();
        }
        cur
    }

    /// `true` when the root cause is a [`LayerError::Resolution`].
    pub fn is_resolution(&self) -> bool {
        matches!(self.root(), LayerError::Resolution(_))
    }

    /// `true` when the root cause is a [`LayerError::Render`].
    pub fn is_render(&self) -> bool {
        matches!(self.root(), LayerError::Render(_))
    }

    /// `true` when the root cause is a [`LayerError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), LayerError::Configuration(_))
    }
}

impl From<Arc<LayerError>> for LayerError {
    fn from(err: Arc<LayerError>) -> Self {
        Self::Upstream(err)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
