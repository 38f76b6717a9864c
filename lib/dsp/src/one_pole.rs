//! First-order low-pass used on the 8-bit path.
//!
//! `y = α·x + (1 - α)·y_prev`, followed by a Q16 makeup gain. Here a *larger*
//! alpha lets more high-frequency content through, the opposite of the biquad.

use crate::q16::clamp_sample;

/// One-pole filter history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnePole {
    y1: i32,
}

impl OnePole {
    pub const fn new() -> Self {
        Self { y1: 0 }
    }

    /// Filter one sample and apply `makeup_q16`.
    #[inline]
    pub fn process(&mut self, alpha: u16, makeup_q16: u32, x: i16) -> i16 {
        let alpha = alpha as i64;
        let y = (alpha * x as i64 + (65536 - alpha) * self.y1 as i64) >> 16;
        // Convex combination of two i16 values, always in range.
        self.y1 = y as i32;
        clamp_sample((y * makeup_q16 as i64) >> 16)
    }

    pub fn reset(&mut self) {
        self.y1 = 0;
    }
}
