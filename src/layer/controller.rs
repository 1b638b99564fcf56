use tracing::{debug, warn};

use crate::{
    assets::{
        handle::{AssetHandle, AssetImage},
        pool::{AssetPool, DisplayedSet},
    },
    clock::timers::{TimerEvent, TimerQueue},
    foundation::{
        core::{AssetId, ElementId, Millis, Point, Vec2, Viewport},
        error::{MixscapeError, MixscapeResult},
    },
    layer::{
        element::{FadePhase, VisualElement},
        painter::{Painter, Step},
        params::{LayerKind, LayerParams, RendererKind},
    },
    random::sample::{LayerRng, chance, layer_rng, uniform_ms},
    stage::surface::{Attachment, Surface},
};

/// Everything needed to build one layer controller.
#[derive(Clone, Debug)]
pub struct LayerSetup {
    /// Position of the layer in its mix; picks the layer's RNG stream.
    pub slot: u32,
    /// Stage-unique layer key, never handed out twice by one compositor. It forms the
    /// high half of every element id the layer creates.
    pub layer_key: u32,
    /// Visual category.
    pub kind: LayerKind,
    /// Renderer strategy.
    pub renderer: RendererKind,
    /// Tuning.
    pub params: LayerParams,
    /// Viewport at creation time.
    pub viewport: Viewport,
    /// Session seed.
    pub seed: u64,
}

/// Lifecycle of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerLifecycle {
    /// Animating.
    Live,
    /// Its container was detached under it; it stopped itself.
    Unsubscribed,
    /// `teardown` ran.
    TornDown,
}

/// Counters for one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LayerStats {
    /// Elements created.
    pub spawned: u64,
    /// Elements removed (fade-out, sample window, teardown or failed decode).
    pub removed: u64,
    /// Spawns skipped because the asset was unavailable.
    pub failed: u64,
    /// Spawns that had to repeat an on-screen asset.
    pub repeats: u64,
}

/// Owns a layer's bounded element population and drives its animation.
///
/// Population trends back to `max_elements`: ambient elements are replaced the moment
/// they finish fading out, replacement first and removal second, so the layer never
/// visibly dips.
#[derive(Debug)]
pub struct ElementController {
    layer_key: u32,
    kind: LayerKind,
    renderer: RendererKind,
    painter: Painter,
    params: LayerParams,
    max_elements: usize,
    pool: AssetPool,
    displayed: DisplayedSet,
    elements: Vec<VisualElement>,
    timers: TimerQueue,
    surface: Box<dyn Surface>,
    viewport: Viewport,
    rng: LayerRng,
    clock_s: f64,
    now: Millis,
    next_serial: u32,
    populated: bool,
    lifecycle: LayerLifecycle,
    stats: LayerStats,
}

impl ElementController {
    /// Build a controller over `assets`, drawing into `surface`. Nothing is spawned yet.
    pub fn new(setup: LayerSetup, assets: Vec<AssetHandle>, surface: Box<dyn Surface>) -> Self {
        let mut rng = layer_rng(setup.seed, u64::from(setup.slot));
        let pool = AssetPool::new(assets, &mut rng);
        let max_elements = match setup.renderer {
            RendererKind::Static => 1,
            RendererKind::Ambient | RendererKind::Sample => {
                setup.params.max_elements_for(setup.kind, pool.len())
            }
        };
        Self {
            layer_key: setup.layer_key,
            kind: setup.kind,
            renderer: setup.renderer,
            painter: Painter::for_renderer(setup.renderer),
            params: setup.params,
            max_elements,
            pool,
            displayed: DisplayedSet::new(),
            elements: Vec::new(),
            timers: TimerQueue::new(),
            surface,
            viewport: setup.viewport,
            rng,
            clock_s: 0.0,
            now: Millis(0),
            next_serial: 0,
            populated: false,
            lifecycle: LayerLifecycle::Live,
            stats: LayerStats::default(),
        }
    }

    /// Layer kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Renderer strategy.
    pub fn renderer(&self) -> RendererKind {
        self.renderer
    }

    /// Painter variant driving this layer.
    pub fn painter(&self) -> Painter {
        self.painter
    }

    /// Population cap.
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Active elements in stable iteration order.
    pub fn elements(&self) -> &[VisualElement] {
        &self.elements
    }

    /// Number of active elements.
    pub fn active_count(&self) -> usize {
        self.elements.len()
    }

    /// Return `true` while `id` is on screen.
    pub fn is_displayed(&self, id: &AssetId) -> bool {
        self.displayed.contains(id)
    }

    /// Number of pending coarse timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Layer clock.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Lifecycle state.
    pub fn lifecycle(&self) -> LayerLifecycle {
        self.lifecycle
    }

    /// Counters.
    pub fn stats(&self) -> LayerStats {
        self.stats
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Handle for an asset of this layer's pool.
    pub fn asset(&self, id: &AssetId) -> Option<&AssetHandle> {
        self.pool.get(id)
    }

    /// The container this layer draws into.
    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub(crate) fn surface_mut(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }

    /// Drift bounds, re-derived from the current viewport every time.
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(
            self.viewport.width * self.params.bounce_fraction,
            self.viewport.height * self.params.bounce_fraction,
        )
    }

    /// Spawn the first element now and stagger the rest over the layer clock.
    ///
    /// Sample layers also arm their add/remove windows. Calling twice is a no-op.
    pub fn populate(&mut self) {
        if self.lifecycle != LayerLifecycle::Live || self.populated {
            return;
        }
        self.populated = true;

        self.spawn(false);
        let mut delay = 0u64;
        for _ in 1..self.max_elements {
            delay += uniform_ms(
                &mut self.rng,
                self.params.stagger_ms.min,
                self.params.stagger_ms.max,
            );
            self.timers.schedule(self.now.after(delay), TimerEvent::Spawn);
        }

        if self.painter == Painter::ManualDrag {
            self.arm(TimerEvent::SampleAddWindow);
            self.arm(TimerEvent::SampleRemoveWindow);
        }
        debug!(
            layer = self.kind.name(),
            max = self.max_elements,
            staggered = self.timers.pending(),
            "layer populated"
        );
    }

    /// Advance the layer by `dt` seconds: fire due timers, then step every element.
    pub fn on_frame(&mut self, dt: f64) {
        if self.lifecycle != LayerLifecycle::Live {
            return;
        }
        if self.surface.attachment() == Attachment::Detached {
            // Stale tick: the container left the stage without a teardown.
            let cancelled = self.timers.cancel_all();
            self.lifecycle = LayerLifecycle::Unsubscribed;
            debug!(layer = self.kind.name(), cancelled, "container detached, unsubscribing");
            return;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock_s += dt;
        self.now = Millis::from_secs_f64(self.clock_s);
        self.run_timers();

        let bounds = self.bounds();
        let mut held = Vec::new();
        let mut finished = Vec::new();
        for el in self.elements.iter_mut() {
            if !el.is_ready() {
                continue;
            }
            match self
                .painter
                .advance(el, dt, bounds, &self.params, &mut self.rng)
            {
                Step::Continue => {}
                Step::Held => held.push(el.id),
                Step::FadedOut => finished.push(el.id),
            }
            self.surface.update(&el.node());
        }

        for id in held {
            let pause = uniform_ms(&mut self.rng, self.params.hold_ms.min, self.params.hold_ms.max);
            let timer = self
                .timers
                .schedule(self.now.after(pause), TimerEvent::HoldExpired(id));
            if let Some(el) = self.elements.iter_mut().find(|e| e.id == id) {
                el.hold_timer = Some(timer);
            }
        }
        for id in finished {
            self.spawn(true);
            self.remove(id);
        }
    }

    /// Cancel every timer, remove every element and forget what is displayed.
    ///
    /// Idempotent: later calls find nothing to remove.
    pub fn teardown(&mut self) {
        if self.lifecycle == LayerLifecycle::TornDown {
            return;
        }
        let cancelled = self.timers.cancel_all();
        let removed = self.elements.len();
        for el in self.elements.drain(..) {
            self.surface.remove(el.id);
        }
        self.stats.removed += removed as u64;
        self.displayed.clear();
        self.lifecycle = LayerLifecycle::TornDown;
        debug!(layer = self.kind.name(), removed, cancelled, "layer torn down");
    }

    /// Re-read the viewport. Covers are re-fitted; drift bounds follow on the next frame.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for el in self.elements.iter_mut().filter(|e| e.is_ready()) {
            self.painter.refit(el, viewport, &self.params);
            self.surface.update(&el.node());
        }
    }

    /// Finish a pending decode for `asset`.
    ///
    /// Elements waiting on it are laid out and start animating; if the decode failed
    /// they are dropped, their slots released, and one refill is scheduled.
    pub fn resolve_asset(&mut self, asset: &AssetId, image: AssetImage) {
        let handle = AssetHandle {
            id: asset.clone(),
            source: self
                .pool
                .get(asset)
                .map(|h| h.source.clone())
                .unwrap_or_else(|| asset.to_string()),
            image,
        };
        let natural = handle.natural_size();
        self.pool.update(handle);
        if self.lifecycle != LayerLifecycle::Live {
            return;
        }

        let waiting: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|e| &e.asset == asset && !e.is_ready())
            .map(|e| e.id)
            .collect();
        if waiting.is_empty() {
            return;
        }

        match natural {
            Some(size) => {
                for el in self
                    .elements
                    .iter_mut()
                    .filter(|e| &e.asset == asset && !e.is_ready())
                {
                    self.painter
                        .layout(el, size, self.viewport, &self.params, &mut self.rng);
                    self.surface.update(&el.node());
                }
            }
            None => {
                warn!(layer = self.kind.name(), asset = %asset, "decode failed, dropping elements");
                for id in waiting {
                    self.remove(id);
                    self.stats.failed += 1;
                }
                self.schedule_refill();
            }
        }
    }

    /// Grab a sample element at `pointer`. Only sample layers support dragging.
    pub fn begin_drag(&mut self, id: ElementId, pointer: Point) -> MixscapeResult<()> {
        if self.painter != Painter::ManualDrag {
            return Err(MixscapeError::lifecycle(format!(
                "{} layer does not support dragging",
                self.kind.name()
            )));
        }
        let el = self.element_mut(id)?;
        el.grab = Some(pointer - el.rect().origin());
        Ok(())
    }

    /// Move a grabbed element so the grab point follows `pointer`.
    pub fn drag_to(&mut self, id: ElementId, pointer: Point) -> MixscapeResult<()> {
        let el = self.element_mut(id)?;
        let Some(grab) = el.grab else {
            return Err(MixscapeError::lifecycle(format!(
                "element {} is not being dragged",
                id.0
            )));
        };
        el.origin = pointer - grab - el.offset;
        let node = el.node();
        self.surface.update(&node);
        Ok(())
    }

    /// Release a grabbed element; automatic lifecycle resumes for it.
    pub fn end_drag(&mut self, id: ElementId) -> MixscapeResult<()> {
        self.element_mut(id)?.grab = None;
        Ok(())
    }

    fn element_mut(&mut self, id: ElementId) -> MixscapeResult<&mut VisualElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| MixscapeError::lifecycle(format!("no active element {}", id.0)))
    }

    fn run_timers(&mut self) {
        while let Some((_, event)) = self.timers.pop_due(self.now) {
            match event {
                TimerEvent::Spawn => {
                    if self.elements.len() < self.max_elements {
                        self.spawn(false);
                    }
                }
                TimerEvent::HoldExpired(id) => {
                    if let Some(el) = self.elements.iter_mut().find(|e| e.id == id) {
                        el.hold_timer = None;
                        if el.phase == FadePhase::Holding {
                            el.phase = FadePhase::Falling;
                        }
                    }
                }
                TimerEvent::SampleAddWindow => {
                    if self.elements.len() < self.max_elements
                        && chance(&mut self.rng, self.params.add_chance)
                    {
                        self.spawn(false);
                    }
                    self.arm(TimerEvent::SampleAddWindow);
                }
                TimerEvent::SampleRemoveWindow => {
                    if self.elements.len() > self.max_elements / 2
                        && chance(&mut self.rng, self.params.remove_chance)
                    {
                        // Oldest first; dragged elements are off limits.
                        let victim = self
                            .elements
                            .iter()
                            .filter(|e| !e.is_dragging())
                            .min_by_key(|e| e.created_at)
                            .map(|e| e.id);
                        if let Some(id) = victim {
                            self.remove(id);
                        }
                    }
                    self.arm(TimerEvent::SampleRemoveWindow);
                }
            }
        }
    }

    fn arm(&mut self, event: TimerEvent) {
        let window = match event {
            TimerEvent::SampleAddWindow => self.params.add_window_ms,
            TimerEvent::SampleRemoveWindow => self.params.remove_window_ms,
            TimerEvent::Spawn | TimerEvent::HoldExpired(_) => return,
        };
        // Zero-length windows would re-fire within the same drain loop forever.
        let delay = uniform_ms(&mut self.rng, window.min, window.max).max(1);
        self.timers.schedule(self.now.after(delay), event);
    }

    fn schedule_refill(&mut self) {
        if self.timers.has_pending(TimerEvent::Spawn) {
            return;
        }
        self.timers
            .schedule(self.now.after(self.params.refill_ms.max(1)), TimerEvent::Spawn);
    }

    /// Create one element. `replacing` lifts the cap by one for the replace-then-remove step.
    fn spawn(&mut self, replacing: bool) -> Option<ElementId> {
        let cap = self.max_elements + usize::from(replacing);
        if self.elements.len() >= cap {
            return None;
        }

        let picked = if self.painter.allows_repeat() {
            self.pool.next_or_repeat(&self.displayed, &mut self.rng)
        } else {
            self.pool
                .next(&self.displayed, &mut self.rng)
                .map(|asset| crate::assets::pool::Pick {
                    asset,
                    repeat: false,
                })
        };
        let Some(pick) = picked else {
            debug!(layer = self.kind.name(), "no asset available, skipping spawn");
            return None;
        };

        self.displayed.reserve(&pick.asset.id);
        match self.create(&pick.asset) {
            Ok(el) => {
                let id = el.id;
                self.surface.insert(&el.node());
                self.elements.push(el);
                self.stats.spawned += 1;
                if pick.repeat {
                    self.stats.repeats += 1;
                }
                debug!(
                    layer = self.kind.name(),
                    element = id.0,
                    asset = %pick.asset.id,
                    repeat = pick.repeat,
                    active = self.elements.len(),
                    "element spawned"
                );
                Some(id)
            }
            Err(err) => {
                self.displayed.release(&pick.asset.id);
                self.stats.failed += 1;
                warn!(layer = self.kind.name(), asset = %pick.asset.id, error = %err, "spawn skipped");
                self.schedule_refill();
                None
            }
        }
    }

    fn create(&mut self, asset: &AssetHandle) -> MixscapeResult<VisualElement> {
        if asset.is_unavailable() {
            return Err(MixscapeError::asset(format!("asset '{}' is unavailable", asset.id)));
        }
        let id = ElementId((u64::from(self.layer_key) << 32) | u64::from(self.next_serial));
        self.next_serial = self.next_serial.wrapping_add(1);

        let mut el = VisualElement::new(id, asset.id.clone(), self.now);
        if let Some(natural) = asset.natural_size() {
            self.painter
                .layout(&mut el, natural, self.viewport, &self.params, &mut self.rng);
        }
        Ok(el)
    }

    fn remove(&mut self, id: ElementId) -> bool {
        let Some(idx) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        let el = self.elements.remove(idx);
        if let Some(timer) = el.hold_timer {
            self.timers.cancel(timer);
        }
        self.surface.remove(id);
        self.displayed.release(&el.asset);
        self.stats.removed += 1;
        debug!(
            layer = self.kind.name(),
            element = id.0,
            asset = %el.asset,
            active = self.elements.len(),
            "element removed"
        );
        true
    }
}

impl Drop for ElementController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/controller.rs"]
mod tests;
