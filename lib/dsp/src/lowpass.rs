//! Cutoff frequency and smoothing-alpha conversions.
//!
//! A one-pole section with pole `α` has its -3 dB corner near
//! `fc = -ln(α) · fs / 2π`. The biquad is two such sections, so the same
//! mapping is used for both filter kinds.

use core::f32::consts::PI;

use crate::q16::ONE;

/// Largest alpha handed out, keeps the pole strictly inside the unit circle.
const MAX_ALPHA: f32 = 0.99998;

/// Q16 alpha for a cutoff of `cutoff_hz` at `sample_rate` Hz.
///
/// Returns 0 when either frequency is non-positive or the cutoff is at or
/// above Nyquist.
pub fn alpha_from_cutoff(cutoff_hz: f32, sample_rate: u32) -> u16 {
    let fs = sample_rate as f32;
    if !(cutoff_hz > 0.0) || sample_rate == 0 || cutoff_hz >= fs / 2.0 {
        return 0;
    }
    let alpha = libm::expf(-2.0 * PI * cutoff_hz / fs).min(MAX_ALPHA);
    let q16 = libm::roundf(alpha * ONE as f32);
    if q16 >= u16::MAX as f32 {
        u16::MAX
    } else {
        q16 as u16
    }
}

/// Approximate cutoff in Hz for a Q16 alpha at `sample_rate`.
///
/// Alpha 0 has no pole at all and reports Nyquist.
pub fn cutoff_from_alpha(alpha: u16, sample_rate: u32) -> f32 {
    let nyquist = sample_rate as f32 / 2.0;
    if alpha == 0 {
        return nyquist;
    }
    let a = alpha as f32 / ONE as f32;
    (-libm::logf(a) * sample_rate as f32 / (2.0 * PI)).min(nyquist)
}
