//! Angle and scalar helpers shared across the relocalization pipeline.
//!
//! All public angles in this crate are in **degrees**; radians only appear
//! inside geometry routines.

/// Wrap an angle in degrees to [-180, 180].
///
/// # Example
/// ```
/// use vastu_reloc::core::math::wrap_degrees;
///
/// assert!((wrap_degrees(190.0) - (-170.0)).abs() < 1e-4);
/// assert!((wrap_degrees(-540.0) - (-180.0)).abs() < 1e-4);
/// ```
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    a
}

/// Shortest signed angular difference from `a` to `b` (degrees).
#[inline]
pub fn angle_diff_degrees(a: f32, b: f32) -> f32 {
    wrap_degrees(b - a)
}

/// Clamp to the unit interval. NaN maps to 0.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Ratio of `value / target`, saturated to [0, 1].
#[inline]
pub fn saturating_ratio(value: f32, target: f32) -> f32 {
    if target <= 0.0 {
        return 1.0;
    }
    clamp01(value / target)
}

/// Median of integer samples (upper median for even counts, 0 if empty).
pub fn median_u32<I>(values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut sorted: Vec<u32> = values.into_iter().collect();
    if sorted.is_empty() {
        return 0;
    }
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}
