pub(crate) mod controller;
pub(crate) mod element;
pub(crate) mod painter;
pub(crate) mod params;
