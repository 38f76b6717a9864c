//! DC-blocking high-pass: `y[n] = x[n] - x[n-1] + α·y[n-1]`.

use crate::q16::clamp_sample;

/// Standard blocker alpha (0.98, corner around 70 Hz at 22.05 kHz).
pub const HARD_ALPHA: u16 = 64225;

/// Gentler blocker alpha (0.995), keeps more of the low bass.
pub const SOFT_ALPHA: u16 = 65216;

/// DC blocker history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DcBlocker {
    x1: i32,
    y1: i32,
}

impl DcBlocker {
    pub const fn new() -> Self {
        Self { x1: 0, y1: 0 }
    }

    #[inline]
    pub fn process(&mut self, alpha: u16, x: i16) -> i16 {
        let feedback = (alpha as i64 * self.y1 as i64) >> 16;
        let y = clamp_sample(x as i64 - self.x1 as i64 + feedback);
        self.x1 = x as i32;
        self.y1 = y as i32;
        y
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_constant_offset() {
        let mut dc = DcBlocker::new();
        assert_eq!(dc.process(HARD_ALPHA, 10000), 10000);
        let mut last = 0;
        for _ in 0..2000 {
            last = dc.process(HARD_ALPHA, 10000);
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_soft_decays_slower() {
        let mut hard = DcBlocker::new();
        let mut soft = DcBlocker::new();
        let mut h = 0;
        let mut s = 0;
        for _ in 0..50 {
            h = hard.process(HARD_ALPHA, 10000);
            s = soft.process(SOFT_ALPHA, 10000);
        }
        assert!(s > h);
    }

    #[test]
    fn test_square_wave_saturates() {
        let mut dc = DcBlocker::new();
        for i in 0..400 {
            let x = if (i / 10) % 2 == 0 { i16::MAX } else { i16::MIN };
            // Steps of ±65535 must clamp, not wrap.
            let y = dc.process(HARD_ALPHA, x);
            if i % 10 == 0 && i > 0 {
                assert_eq!(y.signum(), x.signum());
            }
        }
    }
}
