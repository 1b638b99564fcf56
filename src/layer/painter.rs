use crate::{
    foundation::core::{Point, Size, Vec2, Viewport},
    layer::{
        element::{FadePhase, Motion, VisualElement},
        params::{LayerParams, RendererKind},
    },
    random::sample::{LayerRng, chance, random_sign, skewed_random, uniform},
};

/// Per-layer animation behaviour, selected once from the renderer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Painter {
    /// Rising/holding/falling cross-fades with bouncing drift (background, mist).
    AmbientFade,
    /// A single fully opaque sprite drifting forever.
    StaticDrift,
    /// Constant-opacity drifting samples that the user can drag.
    ManualDrag,
}

/// What a frame step asks of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Nothing to schedule.
    Continue,
    /// The element just reached its ceiling; start its hold timer.
    Held,
    /// Fade-out complete; replace then remove.
    FadedOut,
}

impl Painter {
    /// Painter for a renderer.
    pub fn for_renderer(renderer: RendererKind) -> Self {
        match renderer {
            RendererKind::Ambient => Self::AmbientFade,
            RendererKind::Static => Self::StaticDrift,
            RendererKind::Sample => Self::ManualDrag,
        }
    }

    /// Return `true` when the layer may show the same asset twice rather than stall.
    pub fn allows_repeat(self) -> bool {
        matches!(self, Self::AmbientFade | Self::StaticDrift)
    }

    /// Size, place and parameterize an element whose natural size is now known.
    pub fn layout(
        self,
        el: &mut VisualElement,
        natural: Size,
        viewport: Viewport,
        params: &LayerParams,
        rng: &mut LayerRng,
    ) {
        el.natural = Some(natural);
        el.offset = Vec2::ZERO;
        match self {
            Self::AmbientFade | Self::StaticDrift => {
                fit_cover(el, natural, viewport, params.bounce_fraction);
            }
            Self::ManualDrag => {
                let width = skewed_random(
                    rng,
                    params.sample_width_px.min,
                    params.sample_width_px.max,
                    params.sample_skew,
                );
                el.size = Size::new(width, width * natural.height / natural.width);
                let free_x = (viewport.width - el.size.width).max(0.0);
                let free_y = (viewport.height - el.size.height).max(0.0);
                el.origin = Point::new(uniform(rng, 0.0, free_x), uniform(rng, 0.0, free_y));
            }
        }

        match self {
            Self::AmbientFade => {
                el.opacity = 0.0;
                el.phase = FadePhase::Rising;
                el.target_opacity =
                    uniform(rng, params.target_opacity.min, params.target_opacity.max);
                el.fade_rate =
                    uniform(rng, params.fade_rate_per_sec.min, params.fade_rate_per_sec.max);
            }
            Self::StaticDrift => {
                el.opacity = 1.0;
                el.target_opacity = 1.0;
                el.phase = FadePhase::Holding;
            }
            Self::ManualDrag => {
                el.opacity = uniform(rng, params.sample_opacity.min, params.sample_opacity.max);
                el.target_opacity = el.opacity;
                el.phase = FadePhase::Holding;
            }
        }

        let speed = params.speed_px_per_sec;
        el.motion = Some(Motion {
            speed: Vec2::new(
                uniform(rng, speed.min, speed.max),
                uniform(rng, speed.min, speed.max),
            ),
            direction: Vec2::new(random_sign(rng), random_sign(rng)),
        });
    }

    /// Re-fit a laid-out element after a viewport change.
    ///
    /// Drift direction and speed are kept; a cover's offset is pulled inside the new bounds.
    pub fn refit(self, el: &mut VisualElement, viewport: Viewport, params: &LayerParams) {
        let Some(natural) = el.natural else {
            return;
        };
        match self {
            Self::AmbientFade | Self::StaticDrift => {
                fit_cover(el, natural, viewport, params.bounce_fraction);
                // Drift must stay inside the margin the cover was just sized for.
                let bounds = Vec2::new(
                    viewport.width * params.bounce_fraction,
                    viewport.height * params.bounce_fraction,
                );
                el.offset = clamp_offset(el.offset, bounds);
            }
            Self::ManualDrag => {
                let max_x = (viewport.width - el.size.width).max(0.0);
                let max_y = (viewport.height - el.size.height).max(0.0);
                el.origin = Point::new(el.origin.x.clamp(0.0, max_x), el.origin.y.clamp(0.0, max_y));
            }
        }
    }

    /// Advance one frame of opacity and drift for a ready element.
    pub fn advance(
        self,
        el: &mut VisualElement,
        dt: f64,
        bounds: Vec2,
        params: &LayerParams,
        rng: &mut LayerRng,
    ) -> Step {
        if !(self == Self::ManualDrag && el.is_dragging()) {
            drift(el, dt, bounds, params.flip_chance_per_sec, rng);
        }

        if self != Self::AmbientFade {
            return Step::Continue;
        }
        match el.phase {
            FadePhase::Rising => {
                el.opacity += el.fade_rate * dt;
                if el.opacity >= el.target_opacity {
                    el.opacity = el.target_opacity;
                    el.phase = FadePhase::Holding;
                    return Step::Held;
                }
                Step::Continue
            }
            FadePhase::Holding => Step::Continue,
            FadePhase::Falling => {
                el.opacity -= el.fade_rate * dt;
                if el.opacity <= 0.0 {
                    el.opacity = 0.0;
                    return Step::FadedOut;
                }
                Step::Continue
            }
        }
    }
}

/// Scale to cover the viewport plus the drift margin on every side, centred.
fn fit_cover(el: &mut VisualElement, natural: Size, viewport: Viewport, bounce_fraction: f64) {
    let need_w = viewport.width * (1.0 + 2.0 * bounce_fraction);
    let need_h = viewport.height * (1.0 + 2.0 * bounce_fraction);
    let scale = (need_w / natural.width).max(need_h / natural.height);
    el.size = Size::new(natural.width * scale, natural.height * scale);
    el.origin = Point::new(
        (viewport.width - el.size.width) / 2.0,
        (viewport.height - el.size.height) / 2.0,
    );
}

fn drift(el: &mut VisualElement, dt: f64, bounds: Vec2, flip_chance_per_sec: f64, rng: &mut LayerRng) {
    let Some(motion) = el.motion.as_mut() else {
        return;
    };
    let bounds = Vec2::new(bounds.x.max(0.0), bounds.y.max(0.0));
    el.offset.x += motion.speed.x * dt * motion.direction.x;
    el.offset.y += motion.speed.y * dt * motion.direction.y;

    // Past the bound: pin to it and head back toward the centre.
    if el.offset.x.abs() > bounds.x {
        motion.direction.x = -el.offset.x.signum();
        el.offset.x = el.offset.x.clamp(-bounds.x, bounds.x);
    } else if chance(rng, flip_chance_per_sec * dt) {
        motion.direction.x = -motion.direction.x;
    }
    if el.offset.y.abs() > bounds.y {
        motion.direction.y = -el.offset.y.signum();
        el.offset.y = el.offset.y.clamp(-bounds.y, bounds.y);
    } else if chance(rng, flip_chance_per_sec * dt) {
        motion.direction.y = -motion.direction.y;
    }
}

fn clamp_offset(offset: Vec2, bounds: Vec2) -> Vec2 {
    let bounds = Vec2::new(bounds.x.max(0.0), bounds.y.max(0.0));
    Vec2::new(
        offset.x.clamp(-bounds.x, bounds.x),
        offset.y.clamp(-bounds.y, bounds.y),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/layer/painter.rs"]
mod tests;
