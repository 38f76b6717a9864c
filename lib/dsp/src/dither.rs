//! TPDF dither for 8-bit to 16-bit widening.
//!
//! Two successive bytes from a linear-congruential generator are subtracted,
//! giving a triangular distribution centred on zero. The difference is scaled
//! down to a few LSBs of the 16-bit result, which is enough to break up the
//! banding an 8-bit source leaves in quiet passages.

/// LCG multiplier (ANSI C `rand`).
const LCG_MUL: u32 = 1_103_515_245;

/// LCG increment.
const LCG_INC: u32 = 12_345;

/// Seed used at power-up and by [`Dither::new`].
pub const DEFAULT_SEED: u32 = 12_345;

/// Right shift applied to the raw `r1 - r2` difference (range ±255 → ±4).
const DITHER_SHIFT: u32 = 6;

/// Midpoint of unsigned 8-bit PCM.
const U8_CENTER: i16 = 0x80;

/// Dither generator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dither {
    state: u32,
}

impl Dither {
    /// Create a generator with [`DEFAULT_SEED`].
    pub const fn new() -> Self {
        Self { state: DEFAULT_SEED }
    }

    /// Create a generator with an explicit seed.
    pub const fn with_seed(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Advance the generator and return bits 16..24 of the new state.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        ((self.state >> 16) & 0xFF) as u8
    }

    /// Triangular dither value in `-4..=3`.
    #[inline]
    pub fn next_offset(&mut self) -> i16 {
        let r1 = self.next_byte() as i16;
        let r2 = self.next_byte() as i16;
        (r1 - r2) >> DITHER_SHIFT
    }

    /// Widen an unsigned 8-bit sample to signed 16-bit with dither applied.
    #[inline]
    pub fn widen(&mut self, sample: u8) -> i16 {
        center(sample).saturating_add(self.next_offset())
    }
}

impl Default for Dither {
    fn default() -> Self {
        Self::new()
    }
}

/// Undithered widening: `(sample - 0x80) << 8`.
#[inline]
pub const fn center(sample: u8) -> i16 {
    (sample as i16 - U8_CENTER) << 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        assert_eq!(center(0x80), 0);
        assert_eq!(center(0x00), -32768);
        assert_eq!(center(0xFF), 32512);
        assert_eq!(center(0x81), 256);
    }

    #[test]
    fn test_widen_stays_near_center() {
        let mut dither = Dither::new();
        for sample in 0..=255u8 {
            for _ in 0..16 {
                let widened = dither.widen(sample) as i32;
                let offset = widened - center(sample) as i32;
                assert!((-4..=3).contains(&offset), "sample {} offset {}", sample, offset);
            }
        }
    }

    #[test]
    fn test_widen_saturates_at_bottom() {
        let mut dither = Dither::new();
        for _ in 0..1024 {
            assert!(dither.widen(0) >= i16::MIN);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = Dither::with_seed(DEFAULT_SEED);
        let mut b = Dither::new();
        let first: Vec<i16> = (0..64).map(|i| a.widen(i as u8)).collect();
        let second: Vec<i16> = (0..64).map(|i| b.widen(i as u8)).collect();
        assert_eq!(first, second);

        a.reseed(DEFAULT_SEED);
        let replay: Vec<i16> = (0..64).map(|i| a.widen(i as u8)).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_dither_is_not_constant() {
        let mut dither = Dither::new();
        let offsets: Vec<i16> = (0..256).map(|_| dither.next_offset()).collect();
        assert!(offsets.iter().any(|&o| o != offsets[0]));
    }
}
