//! Mixscape is the animation and compositing core behind layered generative mixes.
//!
//! A mix is a stack of layers (background, mist, samples). Each layer keeps a bounded,
//! continuously refreshed population of visual elements drawn from a shuffled asset
//! pool. The public API is session-oriented:
//!
//! - Describe a mix as [`MixConfig`] JSON, or build [`LayerDescriptor`]s directly
//! - Put it on stage with a [`MixSession`] (or drive a [`Compositor`] yourself)
//! - Tick the frame clock, forward resizes, decodes and drags
//! - Inspect the stack with [`Compositor::stacking`] or composite a [`FrameRGBA`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod clock;
mod foundation;
mod layer;
mod random;
mod render;
mod session;
mod stage;

pub use crate::foundation::core::{
    Affine, AssetId, ElementId, Millis, Point, Rect, Rgba8Premul, Size, Vec2, Viewport,
};
pub use crate::foundation::error::{MixscapeError, MixscapeResult};

pub use crate::assets::decode::{decode_image, load_image_file};
pub use crate::assets::handle::{AssetHandle, AssetImage, DecodedImage, filter_available};
pub use crate::assets::pool::{AssetPool, DisplayedSet, Pick};
pub use crate::clock::timers::{TimerEvent, TimerId, TimerQueue};
pub use crate::layer::controller::{ElementController, LayerLifecycle, LayerSetup, LayerStats};
pub use crate::layer::element::{ElementNode, FadePhase, Motion, VisualElement};
pub use crate::layer::painter::{Painter, Step};
pub use crate::layer::params::{
    LayerKind, LayerParams, LayerParamsOverride, MsSpan, RendererKind, Span,
};
pub use crate::random::sample::{
    LayerRng, SKEW_MAX_ATTEMPTS, layer_rng, shuffle, skewed_random, standard_normal,
};
pub use crate::render::snapshot::{FrameRGBA, MAX_SNAPSHOT_EDGE, render_snapshot};
pub use crate::session::config::{GradientConfig, LayerConfig, MixConfig};
pub use crate::session::mix::{LayerReport, MixSession, SessionReport};
pub use crate::stage::bands::{
    BACKGROUND_Z, BAND_WIDTH, CHROME_Z, GRADIENT_Z, MIST_Z, SAMPLES_Z, band_base, child_z,
};
pub use crate::stage::compositor::{
    Compositor, GradientFill, LayerDescriptor, LayerSlot, StackEntry, StageContext,
};
pub use crate::stage::surface::{
    Attachment, OverlayNode, OverlayStyle, OverlaySurface, SceneSurface, SpriteNode, Surface,
    SurfaceKind, new_surface,
};
