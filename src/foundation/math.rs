pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Opacity in `[0, 1]` quantized to an 8-bit coverage factor.
pub(crate) fn opacity_to_u8(opacity: f64) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// Return `true` when `opacity` is fully opaque within `epsilon`.
pub(crate) fn is_opaque(opacity: f64, epsilon: f64) -> bool {
    (1.0 - opacity).abs() <= epsilon
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
