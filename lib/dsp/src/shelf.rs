//! "Air" high-shelf boost.
//!
//! A one-pole low-pass blend with a scaled first difference added back on top:
//!
//! ```text
//! high  = x[n] - x[n-1]
//! boost = high · (1 - α) · G
//! y[n]  = α·x[n] + (1 - α)·y[n-1] + boost
//! ```
//!
//! DC gain is always 1. The gain at Nyquist is `H(π) = (α + 2(1 - α)G) / (2 - α)`,
//! which is what the dB helpers invert.

use crate::q16::{clamp_sample, ONE};

/// Shelf smoothing alpha (0.75 in Q16).
pub const CUTOFF_ALPHA: u16 = 49152;

/// Default boost gain G (1.5 in Q16).
pub const DEFAULT_GAIN_Q16: u32 = 98304;

/// Upper bound on G (2.0 in Q16).
pub const MAX_GAIN_Q16: u32 = 131072;

/// Preset boosts in dB. Index 0 means "off".
pub const PRESETS_DB: [f32; 4] = [0.0, 1.0, 2.0, 3.0];

/// High-shelf history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AirShelf {
    x1: i32,
    y1: i32,
}

impl AirShelf {
    pub const fn new() -> Self {
        Self { x1: 0, y1: 0 }
    }

    #[inline]
    pub fn process(&mut self, gain_q16: u32, x: i16) -> i16 {
        let alpha = CUTOFF_ALPHA as i64;
        let one_minus = ONE as i64 - alpha;
        let x = x as i64;

        let high = x - self.x1 as i64;
        let boost = (((high * one_minus) >> 16) * gain_q16 as i64) >> 16;
        let y = clamp_sample(((alpha * x) >> 16) + ((one_minus * self.y1 as i64) >> 16) + boost);

        self.x1 = x as i32;
        self.y1 = y as i32;
        y
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn alpha_f32() -> f32 {
    CUTOFF_ALPHA as f32 / ONE as f32
}

/// Solve for the Q16 gain G giving `db` of boost at Nyquist.
///
/// Clamped to `0..=MAX_GAIN_Q16`.
pub fn gain_q16_from_db(db: f32) -> u32 {
    if db.is_nan() {
        return ONE;
    }
    let alpha = alpha_f32();
    let h_pi = libm::powf(10.0, db / 20.0);
    let gain = (h_pi * (2.0 - alpha) - alpha) / (2.0 * (1.0 - alpha));
    if gain <= 0.0 {
        return 0;
    }
    let q16 = libm::roundf(gain * ONE as f32);
    if q16 >= MAX_GAIN_Q16 as f32 {
        MAX_GAIN_Q16
    } else {
        q16 as u32
    }
}

/// Boost in dB at Nyquist for a Q16 gain G.
pub fn db_from_gain_q16(gain_q16: u32) -> f32 {
    let alpha = alpha_f32();
    let gain = gain_q16 as f32 / ONE as f32;
    let h_pi = (alpha + 2.0 * (1.0 - alpha) * gain) / (2.0 - alpha);
    20.0 * libm::log10f(h_pi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_gain_is_unity() {
        let mut shelf = AirShelf::new();
        let mut last = 0;
        for _ in 0..50 {
            last = shelf.process(MAX_GAIN_Q16, 10000);
        }
        assert_eq!(last, 10000);
    }

    #[test]
    fn test_unity_gain_is_flat_at_nyquist() {
        let mut shelf = AirShelf::new();
        let mut out = [0i16; 200];
        for (i, y) in out.iter_mut().enumerate() {
            *y = shelf.process(ONE, if i % 2 == 0 { 8000 } else { -8000 });
        }
        assert_eq!(&out[196..], &[8000, -8000, 8000, -8000]);
    }

    #[test]
    fn test_alternating_full_scale_saturates() {
        let mut shelf = AirShelf::new();
        for i in 0..50 {
            let x = if i % 2 == 0 { i16::MAX } else { i16::MIN };
            let y = shelf.process(MAX_GAIN_Q16, x);
            if i > 2 {
                assert_eq!(y, x);
            }
        }
    }

    #[test]
    fn test_zero_db_is_unity_gain() {
        assert_eq!(gain_q16_from_db(0.0), ONE);
        assert!(db_from_gain_q16(ONE).abs() < 1e-4);
    }

    #[test]
    fn test_db_round_trip() {
        for db in [0.5f32, 1.0, 2.0, 2.5] {
            let gain = gain_q16_from_db(db);
            assert!((db_from_gain_q16(gain) - db).abs() < 0.01, "db {}", db);
        }
    }

    #[test]
    fn test_gain_is_clamped() {
        assert_eq!(gain_q16_from_db(12.0), MAX_GAIN_Q16);
        assert_eq!(gain_q16_from_db(-40.0), 0);
        // 3 dB needs G just above 2.0, so the top preset lands on the ceiling.
        assert_eq!(gain_q16_from_db(PRESETS_DB[3]), MAX_GAIN_Q16);
        assert!(db_from_gain_q16(MAX_GAIN_Q16) > 2.9);
    }
}
