pub(crate) mod compositor;
pub(crate) mod desc;
pub(crate) mod stack;
