//! Common

use num_traits::Num;

/// All geometry and shading is done in double precision.
pub type Float = f64;

/// Shadow rays start this far along the light direction to avoid hitting
/// the surface they leave.
pub const SHADOW_EPSILON: Float = 0.0001;

/// Largest value an 8-bit colour channel can hold.
pub const MAX_CHANNEL: u8 = 255;

/// Clamps a value to the given bounds.
///
/// * `val` - The value to clamp.
/// * `low` - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Quantizes a colour channel in [0, 1] to a byte using `floor(v * 255)`,
/// saturating at 255. Values outside [0, 1] are clamped first.
///
/// * `v` - Channel value.
#[inline(always)]
pub fn channel_to_byte(v: Float) -> u8 {
    let v = clamp(v, 0.0, 1.0);
    min((v * MAX_CHANNEL as Float).floor(), MAX_CHANNEL as Float) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn channel_to_byte_bounds() {
        assert_eq!(channel_to_byte(0.0), 0);
        assert_eq!(channel_to_byte(1.0), 255);
        assert_eq!(channel_to_byte(-3.0), 0);
        assert_eq!(channel_to_byte(42.0), 255);
        assert_eq!(channel_to_byte(0.5), 127);
    }

    #[test]
    fn clamp_min_max() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-1, 0, 3), 0);
        assert_eq!(clamp(2, 0, 3), 2);
        assert_eq!(min(1.0, 2.0), 1.0);
        assert_eq!(max(1.0, 2.0), 2.0);
    }

    proptest! {
        #[test]
        fn channel_to_byte_is_floor(v in 0.0..1.0f64) {
            prop_assert_eq!(channel_to_byte(v) as Float, (v * 255.0).floor());
        }
    }
}
