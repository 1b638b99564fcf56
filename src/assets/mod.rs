pub(crate) mod decode;
pub(crate) mod handle;
pub(crate) mod pool;
