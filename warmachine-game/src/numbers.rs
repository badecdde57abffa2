//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Floor a f64 into an index below `len`, returning 0 for NaN or empty ranges.
#[must_use]
pub fn floor_to_index(value: f64, len: usize) -> usize {
    if len == 0 || value.is_nan() {
        return 0;
    }
    let idx = cast::<f64, usize>(value.max(0.0).floor()).unwrap_or(0);
    idx.min(len - 1)
}

/// Convert u64 to f64; coin counts never approach the precision limit.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_u32(1.6), 2);
        assert_eq!(round_f64_to_u32(4.0), 4);
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(-3.0), 0);
        assert_eq!(round_f64_to_u32(f64::from(u32::MAX) * 2.0), u32::MAX);
    }

    #[test]
    fn index_never_escapes_range() {
        assert_eq!(floor_to_index(3.99, 4), 3);
        assert_eq!(floor_to_index(4.0, 4), 3);
        assert_eq!(floor_to_index(-1.0, 4), 0);
        assert_eq!(floor_to_index(2.0, 0), 0);
    }
}
