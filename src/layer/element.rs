use crate::{
    clock::timers::TimerId,
    foundation::core::{AssetId, ElementId, Millis, Point, Rect, Size, Vec2},
};

/// Opacity phase of an ambient element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadePhase {
    /// Opacity climbing toward the element's target.
    Rising,
    /// Opacity frozen until the hold timer fires.
    Holding,
    /// Opacity draining toward zero; replaced once it gets there.
    Falling,
}

/// Per-axis drift state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Speed in px/s, non-negative on both axes.
    pub speed: Vec2,
    /// Direction sign per axis, each `+1.0` or `-1.0`.
    pub direction: Vec2,
}

/// One on-screen instance of an asset.
#[derive(Clone, Debug)]
pub struct VisualElement {
    pub(crate) id: ElementId,
    pub(crate) asset: AssetId,
    pub(crate) natural: Option<Size>,
    pub(crate) origin: Point,
    pub(crate) offset: Vec2,
    pub(crate) size: Size,
    pub(crate) opacity: f64,
    pub(crate) target_opacity: f64,
    pub(crate) fade_rate: f64,
    pub(crate) phase: FadePhase,
    pub(crate) motion: Option<Motion>,
    pub(crate) created_at: Millis,
    pub(crate) hold_timer: Option<TimerId>,
    pub(crate) grab: Option<Vec2>,
}

impl VisualElement {
    /// Fresh, not yet laid out element: invisible until its asset size is known.
    pub(crate) fn new(id: ElementId, asset: AssetId, created_at: Millis) -> Self {
        Self {
            id,
            asset,
            natural: None,
            origin: Point::ORIGIN,
            offset: Vec2::ZERO,
            size: Size::ZERO,
            opacity: 0.0,
            target_opacity: 0.0,
            fade_rate: 0.0,
            phase: FadePhase::Rising,
            motion: None,
            created_at,
            hold_timer: None,
            grab: None,
        }
    }

    /// Element id.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Source asset id.
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Current opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Current fade phase.
    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    /// Accumulated drift offset from the laid-out origin.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Drift state, `None` while the asset is still decoding.
    pub fn motion(&self) -> Option<Motion> {
        self.motion
    }

    /// Layer-clock time of creation.
    pub fn created_at(&self) -> Millis {
        self.created_at
    }

    /// Return `true` once size and motion are known.
    pub fn is_ready(&self) -> bool {
        self.motion.is_some()
    }

    /// Return `true` while the user holds this element.
    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// On-screen bounds including drift.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin + self.offset, self.size)
    }

    /// Snapshot handed to rendering surfaces.
    pub fn node(&self) -> ElementNode {
        ElementNode {
            id: self.id,
            asset: self.asset.clone(),
            rect: self.rect(),
            opacity: if self.is_ready() { self.opacity } else { 0.0 },
        }
    }
}

/// Surface-facing view of an element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementNode {
    /// Element id.
    pub id: ElementId,
    /// Source asset id.
    pub asset: AssetId,
    /// Bounds in viewport pixels.
    pub rect: Rect,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}
