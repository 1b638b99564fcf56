use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use super::*;
use crate::{
    layer::element::ElementNode,
    layer::params::{MsSpan, Span},
    stage::surface::{OverlaySurface, SceneSurface, SurfaceKind},
};

const FRAME: f64 = 1.0 / 60.0;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Insert(ElementId),
    Remove(ElementId),
}

/// Surface double that logs structural calls in order.
#[derive(Debug)]
struct Recording {
    log: Rc<RefCell<Vec<Call>>>,
    inner: OverlaySurface,
}

impl Surface for Recording {
    fn kind(&self) -> SurfaceKind {
        self.inner.kind()
    }
    fn insert(&mut self, node: &ElementNode) {
        self.log.borrow_mut().push(Call::Insert(node.id));
        self.inner.insert(node);
    }
    fn update(&mut self, node: &ElementNode) {
        self.inner.update(node);
    }
    fn remove(&mut self, id: ElementId) -> bool {
        self.log.borrow_mut().push(Call::Remove(id));
        self.inner.remove(id)
    }
    fn child_count(&self) -> usize {
        self.inner.child_count()
    }
    fn children(&self) -> Vec<ElementNode> {
        self.inner.children()
    }
    fn attach(&mut self, z: i32) {
        self.inner.attach(z);
    }
    fn detach(&mut self) {
        self.inner.detach();
    }
    fn attachment(&self) -> Attachment {
        self.inner.attachment()
    }
}

fn sized_assets(n: usize) -> Vec<AssetHandle> {
    (0..n)
        .map(|i| AssetHandle::sized(format!("asset{i}"), 800, 600))
        .collect()
}

fn setup(kind: LayerKind, renderer: RendererKind, params: LayerParams) -> LayerSetup {
    LayerSetup {
        slot: 1,
        layer_key: 1,
        kind,
        renderer,
        params,
        viewport: Viewport::new(1000.0, 600.0).unwrap(),
        seed: 17,
    }
}

fn quiet(kind: LayerKind) -> LayerParams {
    let mut p = LayerParams::for_kind(kind);
    p.flip_chance_per_sec = 0.0;
    p
}

fn mist(assets: usize) -> ElementController {
    ElementController::new(
        setup(LayerKind::Mist, RendererKind::Ambient, quiet(LayerKind::Mist)),
        sized_assets(assets),
        Box::new(OverlaySurface::new()),
    )
}

fn recorded_mist(assets: usize) -> (ElementController, Rc<RefCell<Vec<Call>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let surface = Recording {
        log: Rc::clone(&log),
        inner: OverlaySurface::new(),
    };
    let c = ElementController::new(
        setup(LayerKind::Mist, RendererKind::Ambient, quiet(LayerKind::Mist)),
        sized_assets(assets),
        Box::new(surface),
    );
    (c, log)
}

fn run(c: &mut ElementController, secs: f64) {
    let frames = (secs / FRAME).round() as usize;
    for _ in 0..frames {
        c.on_frame(FRAME);
    }
}

fn finish_fade(c: &mut ElementController, idx: usize) -> (ElementId, AssetId) {
    let el = &mut c.elements[idx];
    el.phase = FadePhase::Falling;
    el.opacity = 0.0;
    (el.id, el.asset.clone())
}

#[test]
fn first_element_is_immediate_and_the_rest_are_staggered() {
    let mut c = mist(5);
    c.populate();
    assert_eq!(c.active_count(), 1);
    assert_eq!(c.pending_timers(), 2);

    run(&mut c, 1.1);
    assert_eq!(c.active_count(), 3);
    assert_eq!(c.pending_timers(), 0);

    // Staggered creation times are strictly increasing.
    let times: Vec<_> = c.elements().iter().map(|e| e.created_at()).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn populate_twice_is_a_no_op() {
    let mut c = mist(5);
    c.populate();
    c.populate();
    run(&mut c, 1.1);
    assert_eq!(c.active_count(), 3);
    assert_eq!(c.stats().spawned, 3);
}

#[test]
fn mist_lifecycle_replaces_faded_element_and_frees_its_asset() {
    let mut c = mist(5);
    c.populate();
    run(&mut c, 1.1);

    let distinct: BTreeSet<_> = c.elements().iter().map(|e| e.asset().clone()).collect();
    assert_eq!(distinct.len(), 3);

    let (gone, freed) = finish_fade(&mut c, 0);
    assert!(c.is_displayed(&freed));
    c.on_frame(FRAME);

    assert_eq!(c.active_count(), 3);
    assert!(c.elements().iter().all(|e| e.id() != gone));
    assert!(!c.is_displayed(&freed));
    assert_eq!(c.surface().child_count(), 3);
}

#[test]
fn replacement_is_inserted_before_the_faded_element_is_removed() {
    let (mut c, log) = recorded_mist(5);
    c.populate();
    run(&mut c, 1.1);
    log.borrow_mut().clear();

    let (gone, _) = finish_fade(&mut c, 1);
    c.on_frame(FRAME);

    let calls = log.borrow().clone();
    assert_eq!(calls.len(), 2, "{calls:?}");
    assert!(matches!(calls[0], Call::Insert(id) if id != gone));
    assert_eq!(calls[1], Call::Remove(gone));
}

#[test]
fn population_stays_bounded_over_many_cycles() {
    let mut params = quiet(LayerKind::Mist);
    params.fade_rate_per_sec = Span::new(2.0, 4.0);
    params.hold_ms = MsSpan::new(100, 300);
    let mut c = ElementController::new(
        setup(LayerKind::Mist, RendererKind::Ambient, params),
        sized_assets(5),
        Box::new(OverlaySurface::new()),
    );
    c.populate();
    run(&mut c, 1.1);

    for _ in 0..(60 * 60) {
        c.on_frame(FRAME);
        assert_eq!(c.active_count(), c.max_elements());
        assert_eq!(c.surface().child_count(), c.max_elements());
    }
    let stats = c.stats();
    assert!(stats.removed > 20, "{stats:?}");
    assert_eq!(stats.spawned - stats.removed, 3);
    assert_eq!(stats.repeats, 0);
}

#[test]
fn exhausted_pool_repeats_instead_of_stalling() {
    let mut c = mist(3);
    c.populate();
    run(&mut c, 1.1);
    assert_eq!(c.active_count(), 3);

    finish_fade(&mut c, 0);
    c.on_frame(FRAME);

    assert_eq!(c.active_count(), 3);
    assert_eq!(c.stats().repeats, 1);
    // The replacement repeated an on-screen asset; the counted set keeps its twin visible.
    for el in c.elements() {
        assert!(c.is_displayed(el.asset()));
    }
}

#[test]
fn teardown_is_idempotent_and_leaves_nothing_behind() {
    let (mut c, log) = recorded_mist(5);
    c.populate();
    c.on_frame(FRAME);
    assert!(c.pending_timers() > 0);

    c.teardown();
    let removes_after_first = log
        .borrow()
        .iter()
        .filter(|call| matches!(call, Call::Remove(_)))
        .count();
    assert_eq!(removes_after_first, 1);
    assert_eq!(c.active_count(), 0);
    assert_eq!(c.pending_timers(), 0);
    assert_eq!(c.surface().child_count(), 0);

    c.teardown();
    let removes_after_second = log
        .borrow()
        .iter()
        .filter(|call| matches!(call, Call::Remove(_)))
        .count();
    assert_eq!(removes_after_second, removes_after_first);
    assert_eq!(c.lifecycle(), LayerLifecycle::TornDown);

    // Ticks after teardown do nothing.
    run(&mut c, 2.0);
    assert_eq!(c.active_count(), 0);
}

#[test]
fn bounce_threshold_follows_viewport_resize() {
    let mut c = mist(5);
    c.populate();
    let id = c.elements()[0].id();
    let bounce = c.params.bounce_fraction;
    {
        let el = &mut c.elements[0];
        el.phase = FadePhase::Holding;
        el.offset = Vec2::new(30.0, 0.0);
        el.motion = Some(crate::layer::element::Motion {
            speed: Vec2::new(1.0, 0.0),
            direction: Vec2::new(1.0, 1.0),
        });
    }
    // 30px is well inside 8% of 1000px.
    assert!(30.0 < 1000.0 * bounce);
    c.on_frame(FRAME);
    assert_eq!(c.elements()[0].motion().unwrap().direction.x, 1.0);

    c.set_viewport(Viewport::new(300.0, 600.0).unwrap());
    assert_eq!(c.bounds().x, 300.0 * bounce);
    c.on_frame(FRAME);

    let el = c.elements().iter().find(|e| e.id() == id).unwrap();
    assert!((el.offset().x - 300.0 * bounce).abs() < 1e-9);
    assert_eq!(el.motion().unwrap().direction.x, -1.0);
}

#[test]
fn resize_refits_covers() {
    let mut c = mist(5);
    c.populate();
    c.set_viewport(Viewport::new(2400.0, 1800.0).unwrap());
    let r = c.elements()[0].rect();
    assert!(r.x0 <= 0.0 && r.x1 >= 2400.0);
    assert!(r.y0 <= 0.0 && r.y1 >= 1800.0);
}

fn assert_ready_covers(c: &ElementController) {
    let view = c.viewport();
    for el in c.elements().iter().filter(|e| e.is_ready()) {
        let r = el.rect();
        assert!(r.x0 <= 1e-9 && r.x1 >= view.width - 1e-9, "{r:?}");
        assert!(r.y0 <= 1e-9 && r.y1 >= view.height - 1e-9, "{r:?}");
    }
}

#[test]
fn shrinking_the_viewport_keeps_drifted_covers_edge_to_edge() {
    let mut c = mist(5);
    c.populate();
    {
        let el = &mut c.elements[0];
        el.offset = Vec2::new(70.0, -40.0);
        el.motion = Some(crate::layer::element::Motion {
            speed: Vec2::new(12.0, 12.0),
            direction: Vec2::new(1.0, -1.0),
        });
    }

    c.set_viewport(Viewport::new(500.0, 300.0).unwrap());
    assert_ready_covers(&c);
    c.on_frame(FRAME);
    assert_ready_covers(&c);
    // Jittery long frame.
    c.on_frame(0.75);
    assert_ready_covers(&c);
}

#[test]
fn pending_decode_is_attached_invisible_and_animates_after_resolve() {
    let assets = vec![AssetHandle::pending("slow")];
    let mut c = ElementController::new(
        setup(LayerKind::Background, RendererKind::Static, quiet(LayerKind::Background)),
        assets,
        Box::new(SceneSurface::new()),
    );
    c.populate();
    assert_eq!(c.active_count(), 1);
    assert_eq!(c.surface().child_count(), 1);
    assert!(!c.elements()[0].is_ready());

    run(&mut c, 0.5);
    assert_eq!(c.elements()[0].offset(), Vec2::ZERO);
    assert_eq!(c.surface().children()[0].opacity, 0.0);

    c.resolve_asset(&AssetId::new("slow"), AssetImage::Dimensions { width: 640, height: 480 });
    assert!(c.elements()[0].is_ready());
    assert_eq!(c.surface().children()[0].opacity, 1.0);
    run(&mut c, 0.5);
    assert_ne!(c.elements()[0].offset(), Vec2::ZERO);
}

#[test]
fn failed_decode_drops_waiting_elements_and_releases_slots() {
    let mut c = ElementController::new(
        setup(LayerKind::Mist, RendererKind::Ambient, quiet(LayerKind::Mist)),
        vec![AssetHandle::pending("p0")],
        Box::new(OverlaySurface::new()),
    );
    c.populate();
    let id = AssetId::new("p0");
    assert!(c.is_displayed(&id));

    c.resolve_asset(&id, AssetImage::Failed);
    assert!(c.elements().iter().all(|e| e.asset() != &id));
    assert!(!c.is_displayed(&id));
    assert!(c.stats().failed >= 1);
}

#[test]
fn creation_failure_releases_reservation_without_retry_storm() {
    let mut params = quiet(LayerKind::Background);
    params.max_elements = Some(1);
    let mut c = ElementController::new(
        setup(LayerKind::Background, RendererKind::Ambient, params),
        sized_assets(1),
        Box::new(OverlaySurface::new()),
    );
    let id = AssetId::new("asset0");
    // Decode failure lands after the pool's first pass was shuffled.
    c.resolve_asset(&id, AssetImage::Failed);
    c.populate();

    assert_eq!(c.active_count(), 0);
    assert!(!c.is_displayed(&id));
    assert_eq!(c.stats().failed, 1);
    assert_eq!(c.pending_timers(), 1);

    run(&mut c, 5.0);
    assert_eq!(c.stats().failed, 1);
    assert_eq!(c.pending_timers(), 0);
}

#[test]
fn detached_container_unsubscribes_on_next_tick() {
    let mut c = mist(5);
    c.populate();
    c.surface_mut().attach(30);
    c.surface_mut().detach();
    c.on_frame(FRAME);
    assert_eq!(c.lifecycle(), LayerLifecycle::Unsubscribed);
    assert_eq!(c.pending_timers(), 0);
    let before = c.now();
    run(&mut c, 1.0);
    assert_eq!(c.now(), before);
}

fn samples(n: usize, params: LayerParams) -> ElementController {
    ElementController::new(
        setup(LayerKind::Samples, RendererKind::Sample, params),
        sized_assets(n),
        Box::new(SceneSurface::new()),
    )
}

#[test]
fn sample_layer_scales_cap_and_holds_constant_opacity() {
    let mut c = samples(5, quiet(LayerKind::Samples));
    assert_eq!(c.max_elements(), 5);
    c.populate();
    run(&mut c, 2.5);
    let before: Vec<(ElementId, f64)> =
        c.elements().iter().map(|e| (e.id(), e.opacity())).collect();
    run(&mut c, 1.0);
    for (id, opacity) in before {
        if let Some(el) = c.elements().iter().find(|e| e.id() == id) {
            assert_eq!(el.opacity(), opacity);
        }
    }
    assert!(c.active_count() <= c.max_elements());
}

#[test]
fn sample_removal_spares_the_dragged_element_only() {
    let mut params = quiet(LayerKind::Samples);
    params.add_chance = 0.0;
    params.remove_chance = 1.0;
    params.remove_window_ms = MsSpan::new(200, 200);
    let mut c = samples(7, params);
    c.populate();
    run(&mut c, 2.9);
    assert_eq!(c.max_elements(), 7);

    let held = c.elements()[0].id();
    let grab_at = c.elements()[0].rect().center();
    c.begin_drag(held, grab_at).unwrap();

    run(&mut c, 10.0);
    assert_eq!(c.active_count(), 3);
    assert!(c.elements().iter().any(|e| e.id() == held));
    assert!(c.elements().iter().any(|e| e.id() != held));

    c.drag_to(held, Point::new(5.0, 5.0)).unwrap();
    let r = c.elements().iter().find(|e| e.id() == held).unwrap().rect();
    assert!((r.center() - Point::new(5.0, 5.0)).hypot() < 1e-9);
    c.end_drag(held).unwrap();
    assert!(!c.elements().iter().find(|e| e.id() == held).unwrap().is_dragging());
}

#[test]
fn sample_add_window_refills_toward_cap() {
    let mut params = quiet(LayerKind::Samples);
    params.add_chance = 1.0;
    params.remove_chance = 0.0;
    params.add_window_ms = MsSpan::new(100, 100);
    let mut c = samples(4, params);
    c.populate();
    run(&mut c, 3.0);
    let victim = c.elements()[0].id();
    assert!(c.remove(victim));
    assert_eq!(c.active_count(), 3);
    run(&mut c, 0.5);
    assert_eq!(c.active_count(), 4);
}

#[test]
fn drag_is_rejected_outside_sample_layers() {
    let mut c = mist(5);
    c.populate();
    let id = c.elements()[0].id();
    assert!(c.begin_drag(id, Point::ORIGIN).is_err());

    let mut s = samples(3, quiet(LayerKind::Samples));
    s.populate();
    assert!(s.begin_drag(ElementId(u64::MAX), Point::ORIGIN).is_err());
    let id = s.elements()[0].id();
    assert!(s.drag_to(id, Point::ORIGIN).is_err());
}

#[test]
fn static_renderer_shows_one_sprite_forever() {
    let mut c = ElementController::new(
        setup(LayerKind::Background, RendererKind::Static, quiet(LayerKind::Background)),
        sized_assets(4),
        Box::new(SceneSurface::new()),
    );
    assert_eq!(c.max_elements(), 1);
    c.populate();
    let id = c.elements()[0].id();
    run(&mut c, 30.0);
    assert_eq!(c.active_count(), 1);
    assert_eq!(c.elements()[0].id(), id);
    assert_eq!(c.elements()[0].opacity(), 1.0);
    assert!(c.surface().children()[0].rect.width() > 0.0);
}
