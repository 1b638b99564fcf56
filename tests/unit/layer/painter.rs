use super::*;
use crate::{
    foundation::core::{AssetId, ElementId, Millis},
    layer::params::LayerKind,
    random::sample::layer_rng,
};

fn still(kind: LayerKind) -> LayerParams {
    let mut p = LayerParams::for_kind(kind);
    p.flip_chance_per_sec = 0.0;
    p
}

fn laid_out(painter: Painter, params: &LayerParams) -> (VisualElement, LayerRng) {
    let mut rng = layer_rng(9, 0);
    let mut el = VisualElement::new(ElementId(1), AssetId::new("a"), Millis(0));
    painter.layout(
        &mut el,
        Size::new(400.0, 300.0),
        Viewport::new(1000.0, 500.0).unwrap(),
        params,
        &mut rng,
    );
    (el, rng)
}

#[test]
fn ambient_layout_covers_viewport_with_drift_margin() {
    let params = still(LayerKind::Mist);
    let (el, _) = laid_out(Painter::AmbientFade, &params);
    let margin_x = 1000.0 * params.bounce_fraction;
    let margin_y = 500.0 * params.bounce_fraction;
    let r = el.rect();
    assert!(r.x0 <= -margin_x + 1e-9 && r.x1 >= 1000.0 + margin_x - 1e-9);
    assert!(r.y0 <= -margin_y + 1e-9 && r.y1 >= 500.0 + margin_y - 1e-9);
    assert_eq!(el.opacity(), 0.0);
    assert!(el.is_ready());
}

#[test]
fn ambient_rises_holds_then_falls_out() {
    let params = still(LayerKind::Background);
    let (mut el, mut rng) = laid_out(Painter::AmbientFade, &params);
    let bounds = Vec2::new(1e9, 1e9);

    let mut held = false;
    for _ in 0..10_000 {
        if Painter::AmbientFade.advance(&mut el, 0.05, bounds, &params, &mut rng) == Step::Held {
            held = true;
            break;
        }
    }
    assert!(held);
    assert_eq!(el.phase(), FadePhase::Holding);
    assert_eq!(el.opacity(), el.target_opacity);

    // Holding never changes opacity on its own.
    let before = el.opacity();
    Painter::AmbientFade.advance(&mut el, 10.0, bounds, &params, &mut rng);
    assert_eq!(el.opacity(), before);

    el.phase = FadePhase::Falling;
    let mut out = false;
    for _ in 0..10_000 {
        if Painter::AmbientFade.advance(&mut el, 0.05, bounds, &params, &mut rng)
            == Step::FadedOut
        {
            out = true;
            break;
        }
    }
    assert!(out);
    assert_eq!(el.opacity(), 0.0);
}

#[test]
fn drift_bounces_back_toward_centre() {
    let params = still(LayerKind::Mist);
    let (mut el, mut rng) = laid_out(Painter::AmbientFade, &params);
    el.motion = Some(Motion {
        speed: Vec2::new(10.0, 0.0),
        direction: Vec2::new(1.0, 1.0),
    });
    el.offset = Vec2::new(19.5, 0.0);
    Painter::AmbientFade.advance(&mut el, 0.1, Vec2::new(20.0, 20.0), &params, &mut rng);
    assert_eq!(el.motion().unwrap().direction.x, -1.0);

    el.offset = Vec2::new(-25.0, 0.0);
    Painter::AmbientFade.advance(&mut el, 0.1, Vec2::new(20.0, 20.0), &params, &mut rng);
    assert_eq!(el.motion().unwrap().direction.x, 1.0);
}

fn assert_covers(el: &VisualElement, viewport: Viewport) {
    let r = el.rect();
    assert!(r.x0 <= 1e-9 && r.x1 >= viewport.width - 1e-9, "{r:?}");
    assert!(r.y0 <= 1e-9 && r.y1 >= viewport.height - 1e-9, "{r:?}");
}

#[test]
fn long_frame_pins_drift_to_the_cover_margin() {
    let params = still(LayerKind::Mist);
    let viewport = Viewport::new(1000.0, 500.0).unwrap();
    let (mut el, mut rng) = laid_out(Painter::AmbientFade, &params);
    let bounds = Vec2::new(
        viewport.width * params.bounce_fraction,
        viewport.height * params.bounce_fraction,
    );
    el.motion = Some(Motion {
        speed: Vec2::new(20.0, 20.0),
        direction: Vec2::new(-1.0, 1.0),
    });
    el.offset = Vec2::new(-(bounds.x - 0.1), bounds.y - 0.1);

    Painter::AmbientFade.advance(&mut el, 0.5, bounds, &params, &mut rng);
    assert_eq!(el.offset(), Vec2::new(-bounds.x, bounds.y));
    assert_eq!(el.motion().unwrap().direction, Vec2::new(1.0, -1.0));
    assert_covers(&el, viewport);
}

#[test]
fn refit_pulls_drift_inside_a_smaller_margin() {
    let params = still(LayerKind::Mist);
    let (mut el, _) = laid_out(Painter::AmbientFade, &params);
    el.offset = Vec2::new(70.0, -30.0);

    let small = Viewport::new(500.0, 250.0).unwrap();
    Painter::AmbientFade.refit(&mut el, small, &params);
    assert_eq!(
        el.offset(),
        Vec2::new(500.0 * params.bounce_fraction, -250.0 * params.bounce_fraction)
    );
    assert_covers(&el, small);
}

#[test]
fn samples_keep_constant_opacity_and_freeze_while_dragged() {
    let params = still(LayerKind::Samples);
    let (mut el, mut rng) = laid_out(Painter::ManualDrag, &params);
    let opacity = el.opacity();
    assert!((params.sample_opacity.min..=params.sample_opacity.max).contains(&opacity));
    let w = el.rect().width();
    assert!((params.sample_width_px.min..=params.sample_width_px.max).contains(&w));
    assert!((el.rect().height() - w * 0.75).abs() < 1e-9);

    el.grab = Some(Vec2::ZERO);
    let before = el.offset();
    assert_eq!(
        Painter::ManualDrag.advance(&mut el, 1.0, Vec2::new(1e9, 1e9), &params, &mut rng),
        Step::Continue
    );
    assert_eq!(el.offset(), before);
    assert_eq!(el.opacity(), opacity);

    el.grab = None;
    Painter::ManualDrag.advance(&mut el, 1.0, Vec2::new(1e9, 1e9), &params, &mut rng);
    assert_ne!(el.offset(), before);
}

#[test]
fn refit_tracks_new_viewport() {
    let params = still(LayerKind::Background);
    let (mut el, _) = laid_out(Painter::StaticDrift, &params);
    assert_eq!(el.opacity(), 1.0);
    Painter::StaticDrift.refit(&mut el, Viewport::new(3000.0, 2000.0).unwrap(), &params);
    assert!(el.rect().width() >= 3000.0);
    assert!(el.rect().height() >= 2000.0);
}

#[test]
fn renderer_mapping() {
    assert_eq!(Painter::for_renderer(RendererKind::Ambient), Painter::AmbientFade);
    assert_eq!(Painter::for_renderer(RendererKind::Static), Painter::StaticDrift);
    assert_eq!(Painter::for_renderer(RendererKind::Sample), Painter::ManualDrag);
    assert!(!Painter::ManualDrag.allows_repeat());
}
