//! Volume-knob response curve.
//!
//! The raw reading is an 8-bit ADC value. It is mapped through a 256-entry Q16
//! table built off the audio path, so the per-refill cost is one lookup.
//! A reading of 0 is treated as 1: the knob's bottom stop is "very quiet", not
//! mute.

use crate::q16::ONE;

/// Full-scale raw reading.
pub const RAW_MAX: u32 = 255;

/// Default perceptual exponent.
pub const DEFAULT_GAMMA: f32 = 2.0;

/// Accepted gamma range.
pub const MIN_GAMMA: f32 = 1.0;
pub const MAX_GAMMA: f32 = 4.0;

/// Lookup from raw reading to Q16 gain.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCurve {
    table: [u32; 256],
    perceptual: bool,
}

impl VolumeCurve {
    /// Linear response, `raw / 255`.
    pub const fn linear() -> Self {
        let mut table = [0u32; 256];
        let mut raw = 0;
        while raw < 256 {
            let effective = if raw == 0 { 1 } else { raw as u32 };
            table[raw] = (effective * ONE + RAW_MAX / 2) / RAW_MAX;
            raw += 1;
        }
        Self { table, perceptual: false }
    }

    /// Power-law response, `(raw / 255)^(1/γ)`, γ clamped to `1.0..=4.0`.
    pub fn perceptual(gamma: f32) -> Self {
        let gamma = clamp_gamma(gamma);
        let mut table = [0u32; 256];
        for (raw, slot) in table.iter_mut().enumerate() {
            let effective = raw.max(1) as f32 / RAW_MAX as f32;
            let shaped = libm::powf(effective, 1.0 / gamma);
            *slot = libm::roundf(shaped * ONE as f32) as u32;
        }
        Self { table, perceptual: true }
    }

    /// Q16 gain for a raw reading.
    #[inline]
    pub fn gain_q16(&self, raw: u8) -> u32 {
        self.table[raw as usize]
    }

    pub fn is_perceptual(&self) -> bool {
        self.perceptual
    }
}

impl Default for VolumeCurve {
    fn default() -> Self {
        Self::linear()
    }
}

/// Clamp a gamma into range. NaN maps to the default.
pub fn clamp_gamma(gamma: f32) -> f32 {
    if gamma.is_nan() {
        DEFAULT_GAMMA
    } else {
        gamma.clamp(MIN_GAMMA, MAX_GAMMA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_endpoints() {
        let curve = VolumeCurve::linear();
        assert_eq!(curve.gain_q16(255), ONE);
        assert_eq!(curve.gain_q16(0), curve.gain_q16(1));
        assert_eq!(curve.gain_q16(1), 257);
        assert!(!curve.is_perceptual());
    }

    #[test]
    fn test_perceptual_boosts_low_settings() {
        let linear = VolumeCurve::linear();
        let curve = VolumeCurve::perceptual(DEFAULT_GAMMA);
        assert_eq!(curve.gain_q16(255), ONE);
        assert!(curve.gain_q16(64) > linear.gain_q16(64));
        // sqrt(0.25) == 0.5 within rounding
        let quarter = curve.gain_q16(64) as i64;
        assert!((quarter - 32832).abs() < 64, "gain {}", quarter);
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in [VolumeCurve::linear(), VolumeCurve::perceptual(3.0)] {
            for raw in 1..=255u8 {
                assert!(curve.gain_q16(raw) >= curve.gain_q16(raw - 1));
            }
        }
    }

    #[test]
    fn test_gamma_clamped() {
        assert_eq!(VolumeCurve::perceptual(0.2), VolumeCurve::perceptual(MIN_GAMMA));
        assert_eq!(VolumeCurve::perceptual(9.0), VolumeCurve::perceptual(MAX_GAMMA));
        assert_eq!(clamp_gamma(f32::NAN), DEFAULT_GAMMA);
        // gamma 1.0 is the linear curve
        let unity = VolumeCurve::perceptual(1.0);
        let linear = VolumeCurve::linear();
        for raw in 0..=255u8 {
            assert!((unity.gain_q16(raw) as i64 - linear.gain_q16(raw) as i64).abs() <= 1);
        }
    }
}
