use std::path::Path;

use tracing::info;

use crate::{
    assets::handle::AssetImage,
    foundation::{
        core::{AssetId, ElementId, Point, Viewport},
        error::{MixscapeError, MixscapeResult},
    },
    layer::{
        controller::{ElementController, LayerLifecycle, LayerStats},
        params::{LayerKind, RendererKind},
    },
    render::snapshot::{FrameRGBA, render_snapshot},
    session::config::MixConfig,
    stage::{
        compositor::{Compositor, LayerDescriptor, StageContext},
        surface::SurfaceKind,
    },
};

/// Per-layer line of a [`SessionReport`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayerReport {
    /// Layer kind.
    pub kind: LayerKind,
    /// Renderer in use.
    pub renderer: RendererKind,
    /// Container substrate.
    pub surface: SurfaceKind,
    /// Container depth.
    pub z: i32,
    /// Population cap.
    pub max_elements: usize,
    /// Elements currently alive.
    pub active: usize,
    /// Children currently in the container.
    pub children: usize,
    /// Controller lifecycle.
    pub lifecycle: LayerLifecycle,
    /// Lifetime counters.
    pub stats: LayerStats,
}

/// Serializable summary of a running session.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionReport {
    /// Name of the mix on stage, if any.
    pub mix: Option<String>,
    /// Frames stepped since the mix was loaded.
    pub frames: u64,
    /// Seconds simulated since the mix was loaded.
    pub elapsed_s: f64,
    /// Attached layers back to front.
    pub layers: Vec<LayerReport>,
}

/// Drives one stage: loads mixes, ticks the frame clock and forwards input.
#[derive(Debug)]
pub struct MixSession {
    stage: Compositor,
    mix: Option<String>,
    frames: u64,
    elapsed_s: f64,
}

impl MixSession {
    /// Empty session over `ctx`.
    pub fn new(ctx: StageContext) -> Self {
        Self {
            stage: Compositor::new(ctx),
            mix: None,
            frames: 0,
            elapsed_s: 0.0,
        }
    }

    /// Session sized and seeded from `cfg`, with the mix already on stage.
    pub fn open(cfg: &MixConfig, root: &Path) -> MixscapeResult<Self> {
        let mut session = Self::new(StageContext {
            viewport: Viewport::new(cfg.viewport.width, cfg.viewport.height)?,
            seed: cfg.seed,
            gradient: cfg.gradient_fill(),
        });
        session.load_mix(cfg, root)?;
        Ok(session)
    }

    /// The underlying stage.
    pub fn stage(&self) -> &Compositor {
        &self.stage
    }

    /// Name of the mix on stage.
    pub fn mix_name(&self) -> Option<&str> {
        self.mix.as_deref()
    }

    /// Frames stepped since the last mix switch.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Replace whatever is on stage with `cfg`, decoding its assets under `root`.
    pub fn load_mix(&mut self, cfg: &MixConfig, root: &Path) -> MixscapeResult<usize> {
        cfg.validate()?;
        self.stage.reseed(cfg.seed);
        self.stage.set_gradient(cfg.gradient_fill());
        Ok(self.switch(&cfg.name, cfg.descriptors(root)))
    }

    /// Tear down the current mix and render `descriptors` in its place.
    ///
    /// Returns the number of attached layers.
    #[tracing::instrument(skip(self, descriptors))]
    pub fn switch(&mut self, name: &str, descriptors: Vec<LayerDescriptor>) -> usize {
        let dropped = self.stage.teardown_all();
        self.frames = 0;
        self.elapsed_s = 0.0;
        let attached = self.stage.render(descriptors);
        self.mix = Some(name.to_string());
        info!(mix = name, dropped, attached, "mix switched");
        attached
    }

    /// Remove every layer. The session stays usable.
    pub fn clear(&mut self) -> usize {
        self.mix = None;
        self.stage.teardown_all()
    }

    /// One frame callback of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.stage.on_frame(dt);
        self.frames += 1;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_s += dt;
        }
    }

    /// Step `seconds` of wall time at `fps` frames per second. Returns frames stepped.
    pub fn run_for(&mut self, seconds: f64, fps: u32) -> MixscapeResult<u64> {
        if fps == 0 {
            return Err(MixscapeError::validation("fps must be > 0"));
        }
        if !(seconds.is_finite() && seconds >= 0.0) {
            return Err(MixscapeError::validation("seconds must be finite and >= 0"));
        }
        let dt = 1.0 / f64::from(fps);
        let n = (seconds * f64::from(fps)).round() as u64;
        for _ in 0..n {
            self.advance(dt);
        }
        Ok(n)
    }

    /// Propagate a viewport change.
    pub fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
    }

    /// Forward a finished decode.
    pub fn resolve_asset(&mut self, asset: &AssetId, image: AssetImage) {
        self.stage.resolve_asset(asset, image);
    }

    /// Grab a sample element.
    pub fn begin_drag(&mut self, kind: LayerKind, id: ElementId, pointer: Point) -> MixscapeResult<()> {
        self.layer_mut(kind)?.begin_drag(id, pointer)
    }

    /// Move a grabbed element.
    pub fn drag_to(&mut self, kind: LayerKind, id: ElementId, pointer: Point) -> MixscapeResult<()> {
        self.layer_mut(kind)?.drag_to(id, pointer)
    }

    /// Release a grabbed element.
    pub fn end_drag(&mut self, kind: LayerKind, id: ElementId) -> MixscapeResult<()> {
        self.layer_mut(kind)?.end_drag(id)
    }

    /// Composite the stage into a frame.
    pub fn snapshot(&self) -> MixscapeResult<FrameRGBA> {
        render_snapshot(&self.stage)
    }

    /// Current state of every attached layer.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            mix: self.mix.clone(),
            frames: self.frames,
            elapsed_s: self.elapsed_s,
            layers: self
                .stage
                .layers()
                .iter()
                .map(|slot| {
                    let c = slot.controller();
                    LayerReport {
                        kind: c.kind(),
                        renderer: c.renderer(),
                        surface: c.surface().kind(),
                        z: slot.z(),
                        max_elements: c.max_elements(),
                        active: c.active_count(),
                        children: c.surface().child_count(),
                        lifecycle: c.lifecycle(),
                        stats: c.stats(),
                    }
                })
                .collect(),
        }
    }

    fn layer_mut(&mut self, kind: LayerKind) -> MixscapeResult<&mut ElementController> {
        self.stage
            .layer_mut(kind)
            .map(|slot| slot.controller_mut())
            .ok_or_else(|| {
                MixscapeError::lifecycle(format!("no {} layer on stage", kind.name()))
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/mix.rs"]
mod tests;
