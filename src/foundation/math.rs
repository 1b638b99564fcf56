pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn add_sat_u8(a: u16, b: u16) -> u8 {
    (a + b).min(255) as u8
}

/// Linear interpolation between `a` and `b`.
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
