//! Fixed stacking policy shared by the scene-graph canvas and overlay surfaces.
//!
//! Back to front: gradient fill, background, samples (GPU canvas), mist, UI chrome.
//! Overlay children get a z-index inside their layer's band so the two stacking
//! contexts interleave by number, never by scene-graph sort order.

use crate::layer::params::LayerKind;

/// Document z-index of the gradient backdrop.
pub const GRADIENT_Z: i32 = 0;
/// Band base of the background layer.
pub const BACKGROUND_Z: i32 = 10;
/// Band base of the sample layer (the GPU canvas element).
pub const SAMPLES_Z: i32 = 20;
/// Band base of the mist layer.
pub const MIST_Z: i32 = 30;
/// Width of a layer band; children use `base .. base + BAND_WIDTH`.
pub const BAND_WIDTH: i32 = 10;
/// UI chrome and splash panel. Nothing the compositor places may reach it.
pub const CHROME_Z: i32 = 1000;

/// Band base for a layer kind.
pub fn band_base(kind: LayerKind) -> i32 {
    match kind {
        LayerKind::Background => BACKGROUND_Z,
        LayerKind::Samples => SAMPLES_Z,
        LayerKind::Mist => MIST_Z,
    }
}

/// z-index for the `order`-th child of a container whose band starts at `base`.
///
/// Saturates at the top of the band and always stays below [`CHROME_Z`].
pub fn child_z(base: i32, order: usize) -> i32 {
    let within = i32::try_from(order).unwrap_or(i32::MAX).min(BAND_WIDTH - 1);
    base.saturating_add(within).min(CHROME_Z - 1)
}
