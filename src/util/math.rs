//! Numeric helpers for box decoding.

/// Clamps `value` into `[min, max]`.
///
/// Unlike `f32::clamp`, NaN maps to `min` instead of propagating.
#[inline]
pub(crate) fn clamp_coord(value: f32, min: f32, max: f32) -> f32 {
    if value > min {
        if value < max {
            value
        } else {
            max
        }
    } else {
        min
    }
}

/// Returns `(lo, hi)` with `lo <= hi`.
#[inline]
pub(crate) fn ordered(a: f32, b: f32) -> (f32, f32) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}
