pub(crate) mod blend;
pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod effect;
pub(crate) mod filter;
pub(crate) mod sample;
pub(crate) mod source;
