//! Q16 fixed-point helpers.
//!
//! A Q16 value stores `x * 65536` in an integer. Gains are kept unsigned
//! (`u32`), sample-domain values signed.

/// 1.0 in Q16.
pub const ONE: u32 = 1 << 16;

/// Largest representable sample.
pub const SAMPLE_MAX: i16 = i16::MAX;

/// Smallest representable sample.
pub const SAMPLE_MIN: i16 = i16::MIN;

/// Saturate a wide intermediate into the `i16` sample range.
#[inline]
pub fn clamp_sample(value: i64) -> i16 {
    if value > SAMPLE_MAX as i64 {
        SAMPLE_MAX
    } else if value < SAMPLE_MIN as i64 {
        SAMPLE_MIN
    } else {
        value as i16
    }
}

/// Scale a sample by a Q16 gain and saturate.
#[inline]
pub fn scale_sample(sample: i16, gain: u32) -> i16 {
    clamp_sample((sample as i64 * gain as i64) >> 16)
}

/// Multiply two Q16 fractions.
#[inline]
pub fn mul_fraction(a: u32, b: u32) -> u32 {
    ((a as u64 * b as u64) >> 16).min(u32::MAX as u64) as u32
}

/// Convert a non-negative float to Q16 with rounding.
///
/// Negative and NaN inputs map to zero, values too large saturate.
pub fn from_f32(value: f32) -> u32 {
    if !(value > 0.0) {
        return 0;
    }
    let scaled = libm::roundf(value * ONE as f32);
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Convert a Q16 value to float.
#[inline]
pub fn to_f32(value: u32) -> f32 {
    value as f32 / ONE as f32
}
