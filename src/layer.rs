pub(crate) mod adjustment;
pub(crate) mod context;
#[allow(clippy::module_inception)]
pub(crate) mod layer;
pub(crate) mod source;
pub(crate) mod style;
