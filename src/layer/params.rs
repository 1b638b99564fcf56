use crate::foundation::error::{MixscapeError, MixscapeResult};

/// Visual category of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Full-bleed photographic backdrop, slow cross-fades.
    Background,
    /// Translucent haze drifting above the samples.
    Mist,
    /// Floating, draggable sample images.
    Samples,
}

impl LayerKind {
    /// Stable lowercase name used in logs and config.
    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Mist => "mist",
            Self::Samples => "samples",
        }
    }

    /// Renderer used when a descriptor does not pick one.
    pub fn default_renderer(self) -> RendererKind {
        match self {
            Self::Background | Self::Mist => RendererKind::Ambient,
            Self::Samples => RendererKind::Sample,
        }
    }
}

/// Renderer strategy a layer descriptor resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Phased cross-fading elements on a DOM-style overlay surface.
    Ambient,
    /// Floating samples on the GPU scene graph.
    Sample,
    /// One static sprite on the GPU scene graph.
    Static,
}

/// Closed floating-point interval used for randomized tuning values.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Span {
    /// Build a span.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(self, what: &str) -> MixscapeResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(MixscapeError::validation(format!(
                "{what} must satisfy min <= max with finite bounds"
            )));
        }
        Ok(())
    }
}

/// Closed millisecond interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MsSpan {
    /// Lower bound in milliseconds.
    pub min: u64,
    /// Upper bound in milliseconds.
    pub max: u64,
}

impl MsSpan {
    /// Build a span.
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    fn validate(self, what: &str) -> MixscapeResult<()> {
        if self.min > self.max {
            return Err(MixscapeError::validation(format!("{what} must satisfy min <= max")));
        }
        Ok(())
    }
}

/// Tuning constants for one layer. Values are artistic, not general-purpose.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerParams {
    /// Fixed population; `None` derives it from the layer kind and asset count.
    pub max_elements: Option<usize>,
    /// Drift speed per axis in px/s.
    pub speed_px_per_sec: Span,
    /// Opacity ceiling reached at the end of the rising phase.
    pub target_opacity: Span,
    /// Linear fade speed in opacity units per second.
    pub fade_rate_per_sec: Span,
    /// Pause at full opacity.
    pub hold_ms: MsSpan,
    /// Drift bounds as a fraction of the viewport extent on each axis.
    pub bounce_fraction: f64,
    /// Probability per second that a drift axis reverses on its own.
    pub flip_chance_per_sec: f64,
    /// Delay between staggered initial spawns.
    pub stagger_ms: MsSpan,
    /// Delay before a single refill attempt after a failed spawn.
    pub refill_ms: u64,
    /// Sample width range in px.
    pub sample_width_px: Span,
    /// Exponent applied by the size sampler; > 1 favours small samples.
    pub sample_skew: f64,
    /// Constant per-sample opacity band.
    pub sample_opacity: Span,
    /// Window between add attempts.
    pub add_window_ms: MsSpan,
    /// Probability an add window actually adds.
    pub add_chance: f64,
    /// Window between remove attempts.
    pub remove_window_ms: MsSpan,
    /// Probability a remove window actually removes.
    pub remove_chance: f64,
}

impl LayerParams {
    /// Built-in tuning for `kind`.
    pub fn for_kind(kind: LayerKind) -> Self {
        let base = Self {
            max_elements: None,
            speed_px_per_sec: Span::new(3.0, 8.0),
            target_opacity: Span::new(0.95, 1.0),
            fade_rate_per_sec: Span::new(0.12, 0.25),
            hold_ms: MsSpan::new(4_000, 9_000),
            bounce_fraction: 0.04,
            flip_chance_per_sec: 0.02,
            stagger_ms: MsSpan::new(250, 500),
            refill_ms: 1_000,
            sample_width_px: Span::new(80.0, 520.0),
            sample_skew: 2.0,
            sample_opacity: Span::new(0.7, 0.95),
            add_window_ms: MsSpan::new(4_000, 6_000),
            add_chance: 0.8,
            remove_window_ms: MsSpan::new(6_000, 9_000),
            remove_chance: 0.7,
        };
        match kind {
            LayerKind::Background => base,
            LayerKind::Mist => Self {
                speed_px_per_sec: Span::new(8.0, 20.0),
                target_opacity: Span::new(0.8, 1.0),
                fade_rate_per_sec: Span::new(0.15, 0.3),
                hold_ms: MsSpan::new(3_000, 7_000),
                bounce_fraction: 0.08,
                flip_chance_per_sec: 0.05,
                ..base
            },
            LayerKind::Samples => Self {
                speed_px_per_sec: Span::new(5.0, 15.0),
                bounce_fraction: 0.1,
                flip_chance_per_sec: 0.03,
                ..base
            },
        }
    }

    /// Population cap for a layer holding `asset_count` eligible assets.
    ///
    /// Ambient layers always keep 3; sample layers scale with the asset count within 3..=7.
    pub fn max_elements_for(&self, kind: LayerKind, asset_count: usize) -> usize {
        if let Some(n) = self.max_elements {
            return n;
        }
        match kind {
            LayerKind::Background | LayerKind::Mist => 3,
            LayerKind::Samples => asset_count.clamp(3, 7),
        }
    }

    /// Apply the non-empty fields of `ov`.
    pub fn with_overrides(mut self, ov: &LayerParamsOverride) -> Self {
        if let Some(v) = ov.max_elements {
            self.max_elements = Some(v);
        }
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = ov.$field { self.$field = v; })*
            };
        }
        take!(
            speed_px_per_sec,
            target_opacity,
            fade_rate_per_sec,
            hold_ms,
            bounce_fraction,
            flip_chance_per_sec,
            stagger_ms,
            refill_ms,
            sample_width_px,
            sample_skew,
            sample_opacity,
            add_window_ms,
            add_chance,
            remove_window_ms,
            remove_chance,
        );
        self
    }

    /// Reject values the state machines cannot run with.
    pub fn validate(&self) -> MixscapeResult<()> {
        self.speed_px_per_sec.validate("speed_px_per_sec")?;
        self.target_opacity.validate("target_opacity")?;
        self.fade_rate_per_sec.validate("fade_rate_per_sec")?;
        self.hold_ms.validate("hold_ms")?;
        self.stagger_ms.validate("stagger_ms")?;
        self.sample_width_px.validate("sample_width_px")?;
        self.sample_opacity.validate("sample_opacity")?;
        self.add_window_ms.validate("add_window_ms")?;
        self.remove_window_ms.validate("remove_window_ms")?;

        if self.max_elements == Some(0) {
            return Err(MixscapeError::validation("max_elements must be > 0"));
        }
        if self.fade_rate_per_sec.min <= 0.0 {
            return Err(MixscapeError::validation("fade_rate_per_sec must be > 0"));
        }
        if self.target_opacity.min <= 0.0 || self.target_opacity.max > 1.0 {
            return Err(MixscapeError::validation("target_opacity must lie in (0, 1]"));
        }
        if self.sample_opacity.min < 0.0 || self.sample_opacity.max > 1.0 {
            return Err(MixscapeError::validation("sample_opacity must lie in [0, 1]"));
        }
        if self.sample_width_px.min <= 0.0 {
            return Err(MixscapeError::validation("sample_width_px must be > 0"));
        }
        if !(0.0..=0.5).contains(&self.bounce_fraction) {
            return Err(MixscapeError::validation("bounce_fraction must lie in [0, 0.5]"));
        }
        for (what, p) in [
            ("flip_chance_per_sec", self.flip_chance_per_sec),
            ("add_chance", self.add_chance),
            ("remove_chance", self.remove_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(MixscapeError::validation(format!("{what} must lie in [0, 1]")));
            }
        }
        if !(self.sample_skew.is_finite() && self.sample_skew > 0.0) {
            return Err(MixscapeError::validation("sample_skew must be > 0"));
        }
        Ok(())
    }
}

/// Partial [`LayerParams`] as written in a mix description.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(missing_docs)]
pub struct LayerParamsOverride {
    pub max_elements: Option<usize>,
    pub speed_px_per_sec: Option<Span>,
    pub target_opacity: Option<Span>,
    pub fade_rate_per_sec: Option<Span>,
    pub hold_ms: Option<MsSpan>,
    pub bounce_fraction: Option<f64>,
    pub flip_chance_per_sec: Option<f64>,
    pub stagger_ms: Option<MsSpan>,
    pub refill_ms: Option<u64>,
    pub sample_width_px: Option<Span>,
    pub sample_skew: Option<f64>,
    pub sample_opacity: Option<Span>,
    pub add_window_ms: Option<MsSpan>,
    pub add_chance: Option<f64>,
    pub remove_window_ms: Option<MsSpan>,
    pub remove_chance: Option<f64>,
}

#[cfg(test)]
#[path = "../../tests/unit/layer/params.rs"]
mod tests;
