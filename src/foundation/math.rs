/// Number of fractional bits in the ray caster's fixed-point format.
pub const FP_SHIFT: u32 = 15;
/// Fixed-point representation of 1.0 (`0x7FFF`).
pub const FP_SCALE: u32 = 0x7FFF;

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// `x * y` in 15-bit fixed point, rounded, saturated to [`FP_SCALE`].
pub(crate) fn fp_mul(x: u32, y: u32) -> u32 {
    (((u64::from(x) * u64::from(y)) + u64::from(FP_SCALE / 2)) / u64::from(FP_SCALE))
        .min(u64::from(FP_SCALE)) as u32
}

/// Convert a unit-interval float into 15-bit fixed point (clamped, rounded).
pub(crate) fn fp_from_unit(v: f64) -> u16 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * f64::from(FP_SCALE)).round() as u16
}

/// Convert a 15-bit fixed-point value back into the unit interval.
pub(crate) fn fp_to_unit(v: u32) -> f64 {
    f64::from(v.min(FP_SCALE)) / f64::from(FP_SCALE)
}

/// Narrow a 15-bit fixed-point channel to 8 bits with rounding.
pub(crate) fn fp_to_u8(v: u16) -> u8 {
    let v = u32::from(v).min(FP_SCALE);
    ((v * 255 + FP_SCALE / 2) / FP_SCALE) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
