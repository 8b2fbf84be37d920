//! Safe casting utilities for pixel coordinates

use crate::{Error, Result};

/// Safely convert u32 to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn u32_to_i32(value: u32) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Clamp and convert f64 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_u32_to_i32() {
        assert_eq!(u32_to_i32(42).unwrap(), 42);
        assert_eq!(u32_to_i32(0).unwrap(), 0);
        assert_eq!(u32_to_i32(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(u32_to_i32(i32::MAX as u32 + 1).is_err());
        assert!(u32_to_i32(u32::MAX).is_err());
    }

    #[test]
    fn test_f64_to_i32_clamp() {
        assert_eq!(f64_to_i32_clamp(50.7, 0, 100), 50);
        assert_eq!(f64_to_i32_clamp(-10.0, 0, 100), 0);
        assert_eq!(f64_to_i32_clamp(150.0, 0, 100), 100);
        assert_eq!(f64_to_i32_clamp(f64::NAN, 0, 100), 0);
        assert_eq!(f64_to_i32_clamp(f64::INFINITY, 0, 100), 0);
        // Swapped bounds
        assert_eq!(f64_to_i32_clamp(150.0, 100, 0), 100);
    }

    proptest! {
        #[test]
        fn prop_f64_to_i32_clamp_always_within_bounds(
            value in any::<f64>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f64_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }
    }
}
