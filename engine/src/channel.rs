//! Per-channel filter memory.

use chime_dsp::{AirShelf, BiquadState, DcBlocker, OnePole};

/// Output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

/// History for every stateful stage on one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelFilterState {
    pub dc: DcBlocker,
    pub lpf16: BiquadState,
    pub lpf8: OnePole,
    pub lpf8_biquad: BiquadState,
    pub air: AirShelf,
}

impl ChannelFilterState {
    pub const fn new() -> Self {
        Self {
            dc: DcBlocker::new(),
            lpf16: BiquadState::new(),
            lpf8: OnePole::new(),
            lpf8_biquad: BiquadState::new(),
            air: AirShelf::new(),
        }
    }

    /// Zero all history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
