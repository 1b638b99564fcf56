pub(crate) mod bands;
pub(crate) mod compositor;
pub(crate) mod surface;
