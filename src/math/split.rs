//! Integer/fraction splitting and fixed-point quantization.

/// Largest magnitude `f64` that still converts to `i64` without saturation.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Split `x` into `(floor(x), x - floor(x))`.
///
/// The fractional part is always in `[0, 1)`, also for negative inputs.
pub fn int_frac(x: f64) -> (i64, f64) {
    let i = x.floor();
    (i as i64, x - i)
}

/// `floor(v · 2^shift)` as an `i64`.
///
/// Returns `None` when the scaled value does not fit in `i64`; the caller
/// treats that as a rejected candidate rather than wrapping.
pub fn quantize(v: f64, shift: u32) -> Option<i64> {
    let scaled = (v * 2f64.powi(shift as i32)).floor();
    if scaled.is_finite() && scaled >= -I64_BOUND && scaled < I64_BOUND {
        Some(scaled as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_frac_splits_positive_and_negative() {
        assert_eq!(int_frac(3.25), (3, 0.25));
        assert_eq!(int_frac(-3.25), (-4, 0.75));
        assert_eq!(int_frac(7.0), (7, 0.0));
    }

    #[test]
    fn quantize_truncates_toward_negative_infinity() {
        assert_eq!(quantize(0.6, 0), Some(0));
        assert_eq!(quantize(0.6, 3), Some(4)); // 4.8
        assert_eq!(quantize(-0.6, 3), Some(-5)); // -4.8
    }

    #[test]
    fn quantize_rejects_out_of_range() {
        assert_eq!(quantize(1.0, 63), None);
        assert_eq!(quantize(0.75, 63), Some(3 << 61));
        assert_eq!(quantize(f64::NAN, 0), None);
    }
}
