//! Numeric helpers for coordinate conversion.

/// Scales a model-space coordinate into a destination dimension and
/// truncates toward zero.
///
/// The division and multiplication run in `f64` so the truncation boundary
/// is not shifted by intermediate `f32` rounding.
pub(crate) fn scale_trunc(coord: f32, input_size: f64, dest_dim: u32) -> i32 {
    let scaled = (f64::from(coord) / input_size) * f64::from(dest_dim);
    // `as` saturates out-of-range values and truncates toward zero.
    scaled.trunc() as i32
}

/// Returns `(min, max)` of two values.
#[inline]
pub(crate) fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Converts a raw class field into a class id if it is a finite,
/// non-negative whole number that fits a `u32`.
pub(crate) fn as_class_id(value: f32) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= u32::MAX as f32 {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::{as_class_id, ordered, scale_trunc};

    #[test]
    fn scale_trunc_truncates_toward_zero() {
        assert_eq!(scale_trunc(5.0, 10.0, 99), 49);
        assert_eq!(scale_trunc(-5.0, 10.0, 99), -49);
        assert_eq!(scale_trunc(10.0, 10.0, 640), 640);
    }

    #[test]
    fn ordered_swaps_reversed_pairs() {
        assert_eq!(ordered(3.0, 1.0), (1.0, 3.0));
        assert_eq!(ordered(1.0, 3.0), (1.0, 3.0));
    }

    #[test]
    fn class_id_rejects_fractional_and_negative() {
        assert_eq!(as_class_id(4.0), Some(4));
        assert_eq!(as_class_id(0.5), None);
        assert_eq!(as_class_id(-1.0), None);
        assert_eq!(as_class_id(f32::NAN), None);
    }
}
