//! Second-order low-pass derived from one smoothing coefficient.
//!
//! The filter is two cascaded one-pole sections folded into a single biquad:
//!
//! ```text
//! b0 = (1 - α)² / 2      b1 = 2·b0      b2 = b0
//! a1 = -2α               a2 = α²
//!
//! y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]
//! ```
//!
//! All coefficients are Q16 and the accumulator is `i64`, so even the most
//! aggressive alpha cannot overflow. Output history holds the saturated value.

use crate::q16::clamp_sample;

/// Number of iterations used to pre-charge the history on the first sample.
pub const WARMUP_CYCLES: usize = 16;

/// Q16 biquad coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiquadCoeffs {
    pub b0: i32,
    pub b1: i32,
    pub b2: i32,
    pub a1: i32,
    pub a2: i32,
}

impl BiquadCoeffs {
    /// Derive the coefficient set from a Q16 smoothing alpha.
    ///
    /// Larger alpha means a lower cutoff.
    pub const fn from_alpha(alpha: u16) -> Self {
        let alpha = alpha as i64;
        let one_minus = 65536 - alpha;
        let b0 = ((one_minus * one_minus) >> 17) as i32;
        Self {
            b0,
            b1: b0 * 2,
            b2: b0,
            a1: -((alpha << 1) as i32),
            a2: ((alpha * alpha) >> 16) as i32,
        }
    }
}

/// Per-channel biquad history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiquadState {
    x1: i32,
    x2: i32,
    y1: i32,
    y2: i32,
}

impl BiquadState {
    pub const fn new() -> Self {
        Self { x1: 0, x2: 0, y1: 0, y2: 0 }
    }

    /// Run one sample through the filter.
    #[inline]
    pub fn process(&mut self, coeffs: &BiquadCoeffs, x: i16) -> i16 {
        let x = x as i64;
        let acc = coeffs.b0 as i64 * x
            + coeffs.b1 as i64 * self.x1 as i64
            + coeffs.b2 as i64 * self.x2 as i64
            - coeffs.a1 as i64 * self.y1 as i64
            - coeffs.a2 as i64 * self.y2 as i64;
        let y = clamp_sample(acc >> 16);

        self.x2 = self.x1;
        self.x1 = x as i32;
        self.y2 = self.y1;
        self.y1 = y as i32;
        y
    }

    /// Charge the history with `cycles` copies of `sample` so the first real
    /// output does not start from zero.
    pub fn warm_up(&mut self, coeffs: &BiquadCoeffs, sample: i16, cycles: usize) {
        for _ in 0..cycles {
            self.process(coeffs, sample);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_from_alpha() {
        let c = BiquadCoeffs::from_alpha(52429);
        assert_eq!(c, BiquadCoeffs { b0: 1310, b1: 2620, b2: 1310, a1: -104858, a2: 41943 });

        let c = BiquadCoeffs::from_alpha(63488);
        assert_eq!(c.b0, 32);
        assert_eq!(c.a2, 61504);
    }

    #[test]
    fn test_step_response_settles() {
        let coeffs = BiquadCoeffs::from_alpha(52429);
        let mut state = BiquadState::new();
        let mut last = 0;
        for _ in 0..3000 {
            last = state.process(&coeffs, 1000);
        }
        // Passband gain of this topology is 2.
        assert!((1980..=2000).contains(&last), "settled at {}", last);
    }

    #[test]
    fn test_full_scale_saturates_without_wrap() {
        let coeffs = BiquadCoeffs::from_alpha(63488);
        let mut state = BiquadState::new();
        for _ in 0..3000 {
            assert!(state.process(&coeffs, i16::MAX) >= 0);
        }
        assert_eq!(state.process(&coeffs, i16::MAX), i16::MAX);

        let mut state = BiquadState::new();
        for _ in 0..3000 {
            assert!(state.process(&coeffs, i16::MIN) <= 0);
        }
        assert_eq!(state.process(&coeffs, i16::MIN), i16::MIN);
    }

    #[test]
    fn test_warm_up_reduces_start_transient() {
        let coeffs = BiquadCoeffs::from_alpha(52429);
        let mut cold = BiquadState::new();
        let mut warm = BiquadState::new();
        warm.warm_up(&coeffs, 1000, WARMUP_CYCLES);

        let cold_first = cold.process(&coeffs, 1000);
        let warm_first = warm.process(&coeffs, 1000);
        assert!(warm_first > cold_first);
    }

    #[test]
    fn test_reset() {
        let coeffs = BiquadCoeffs::from_alpha(40960);
        let mut state = BiquadState::new();
        state.process(&coeffs, 12345);
        state.reset();
        assert_eq!(state, BiquadState::default());
    }
}
