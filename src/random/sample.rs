use rand::{Rng, SeedableRng, seq::SliceRandom};

/// Random source owned by a single layer. Seeded so a mix replays identically.
pub type LayerRng = rand::rngs::StdRng;

/// Rejection attempts before [`skewed_random`] gives up and clamps.
pub const SKEW_MAX_ATTEMPTS: usize = 100;

/// Build a layer RNG from a session seed and a layer slot.
pub fn layer_rng(seed: u64, slot: u64) -> LayerRng {
    LayerRng::seed_from_u64(seed ^ slot.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// One approximately standard-normal deviate via Box–Muller.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Open interval: ln(0) is -inf.
    let mut u: f64 = 0.0;
    while u <= 0.0 {
        u = rng.r#gen::<f64>();
    }
    let mut v: f64 = 0.0;
    while v <= 0.0 {
        v = rng.r#gen::<f64>();
    }
    (-2.0 * u.ln()).sqrt() * (std::f64::consts::TAU * v).cos()
}

/// Bell-shaped sample in `[min, max]`, skewed by raising the unit value to `skew`.
///
/// The normal deviate is squeezed into `[0, 1]` (`n / 10 + 0.5`), out-of-range draws are
/// rejected, and the accepted value is mapped through `v.powf(skew)` before the affine map.
/// With `skew > 1` the mass moves toward `min`: mostly small outputs with a long tail of
/// large ones.
///
/// Rejection is capped at [`SKEW_MAX_ATTEMPTS`]; past the cap the last draw is clamped.
pub fn skewed_random<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, skew: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let skew = if skew.is_finite() && skew > 0.0 {
        skew
    } else {
        1.0
    };

    let mut unit = 0.5;
    for _ in 0..SKEW_MAX_ATTEMPTS {
        unit = standard_normal(rng) / 10.0 + 0.5;
        if (0.0..=1.0).contains(&unit) {
            return lo + unit.powf(skew) * (hi - lo);
        }
    }
    lo + unit.clamp(0.0, 1.0).powf(skew) * (hi - lo)
}

/// Uniform in-place permutation (Fisher–Yates).
pub fn shuffle<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    items.shuffle(rng);
}

/// Uniform sample in `[lo, hi]`; degenerate or inverted ranges return `lo`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
}

/// Uniform whole-millisecond delay in `[lo, hi]`.
pub fn uniform_ms<R: Rng + ?Sized>(rng: &mut R, lo: u64, hi: u64) -> u64 {
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
}

/// `+1.0` or `-1.0` with equal probability.
pub fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
}

/// Bernoulli trial; probabilities outside `[0, 1]` are clamped.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    if !p.is_finite() || p <= 0.0 {
        return false;
    }
    rng.gen_bool(p.min(1.0))
}

#[cfg(test)]
#[path = "../../tests/unit/random/sample.rs"]
mod tests;
