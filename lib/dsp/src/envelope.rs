//! Squared fade curves.
//!
//! Both directions use `(progress / total)²` rather than a linear ramp, which
//! tracks perceived loudness more closely and avoids an audible knee halfway
//! through the fade.

use crate::q16::{scale_sample, ONE};

/// Shortest configurable fade, in seconds.
pub const MIN_FADE_SECONDS: f32 = 0.001;

/// Longest configurable fade, in seconds.
pub const MAX_FADE_SECONDS: f32 = 5.0;

/// `(num / den)²` in Q16, saturating at 1.0.
#[inline]
pub fn squared_ratio_q16(num: u32, den: u32) -> u32 {
    if den == 0 || num >= den {
        return ONE;
    }
    let ratio = ((num as u64) << 16) / den as u64;
    ((ratio * ratio) >> 16) as u32
}

/// Fade-in multiplier after `elapsed` of `total` samples.
///
/// Zero at the first sample, unity once the fade has run its course.
#[inline]
pub fn fade_in_gain_q16(elapsed: u32, total: u32) -> u32 {
    squared_ratio_q16(elapsed, total)
}

/// Fade-out multiplier with `remaining` samples left in a `total`-sample window.
///
/// Unity before the window opens, zero once nothing remains.
#[inline]
pub fn fade_out_gain_q16(remaining: u32, total: u32) -> u32 {
    if remaining == 0 {
        return 0;
    }
    squared_ratio_q16(remaining, total)
}

/// Apply a Q16 envelope gain to a sample.
#[inline]
pub fn apply_gain(x: i16, gain_q16: u32) -> i16 {
    if gain_q16 >= ONE {
        x
    } else {
        scale_sample(x, gain_q16)
    }
}

/// Clamp a fade duration into the configurable range. NaN maps to the minimum.
pub fn clamp_seconds(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_FADE_SECONDS
    } else {
        seconds.clamp(MIN_FADE_SECONDS, MAX_FADE_SECONDS)
    }
}

/// Convert a fade duration to a sample count at `sample_rate`.
///
/// Always at least one sample.
pub fn seconds_to_samples(seconds: f32, sample_rate: u32) -> u32 {
    let samples = libm::roundf(clamp_seconds(seconds) * sample_rate as f32);
    if samples < 1.0 {
        1
    } else {
        samples as u32
    }
}
