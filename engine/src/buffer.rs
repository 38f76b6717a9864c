//! Ping-pong output buffer.
//!
//! One interleaved-stereo `i16` buffer, transmitted circularly by the DMA
//! peripheral. While one half is on the wire the other is refilled.
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────┐
//! │  First: 512 frames L/R   │  Second: 512 frames L/R  │
//! └──────────────────────────┴──────────────────────────┘
//!            ▲ HalfComplete              ▲ FullComplete
//! ```

use crate::hal::BufferHalf;

/// Total buffer length in `i16` slots.
pub const BUFFER_LEN: usize = 2048;

/// Slots per half.
pub const HALF_LEN: usize = BUFFER_LEN / 2;

/// Stereo frames per half.
pub const FRAMES_PER_HALF: usize = HALF_LEN / 2;

/// Output value for silence (signed midpoint).
pub const SILENCE: i16 = 0;

/// The DMA transmit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPongBuffer {
    data: [i16; BUFFER_LEN],
}

impl PingPongBuffer {
    pub const fn new() -> Self {
        Self { data: [SILENCE; BUFFER_LEN] }
    }

    /// Whole buffer, as handed to the DMA peripheral.
    pub fn as_slice(&self) -> &[i16] {
        &self.data
    }

    pub fn half(&self, half: BufferHalf) -> &[i16] {
        let (first, second) = self.data.split_at(HALF_LEN);
        match half {
            BufferHalf::First => first,
            BufferHalf::Second => second,
        }
    }

    pub fn half_mut(&mut self, half: BufferHalf) -> &mut [i16] {
        let (first, second) = self.data.split_at_mut(HALF_LEN);
        match half {
            BufferHalf::First => first,
            BufferHalf::Second => second,
        }
    }

    pub fn fill_silence(&mut self, half: BufferHalf) {
        self.half_mut(half).fill(SILENCE);
    }

    pub fn clear(&mut self) {
        self.data.fill(SILENCE);
    }
}

impl Default for PingPongBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_do_not_overlap() {
        let mut buffer = PingPongBuffer::new();
        buffer.half_mut(BufferHalf::First).fill(1);
        buffer.half_mut(BufferHalf::Second).fill(2);
        assert_eq!(buffer.half(BufferHalf::First).len(), HALF_LEN);
        assert!(buffer.half(BufferHalf::First).iter().all(|&s| s == 1));
        assert!(buffer.half(BufferHalf::Second).iter().all(|&s| s == 2));
        assert_eq!(buffer.as_slice()[HALF_LEN - 1], 1);
        assert_eq!(buffer.as_slice()[HALF_LEN], 2);
    }

    #[test]
    fn test_fill_silence() {
        let mut buffer = PingPongBuffer::new();
        buffer.half_mut(BufferHalf::First).fill(7);
        buffer.half_mut(BufferHalf::Second).fill(7);
        buffer.fill_silence(BufferHalf::Second);
        assert!(buffer.half(BufferHalf::First).iter().all(|&s| s == 7));
        assert!(buffer.half(BufferHalf::Second).iter().all(|&s| s == SILENCE));
        buffer.clear();
        assert_eq!(buffer, PingPongBuffer::new());
    }
}
