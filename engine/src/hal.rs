//! Hardware capability interface.
//!
//! The engine never touches peripherals directly. Board support code
//! implements [`AudioHardware`] and hands it to the engine once with
//! [`AudioEngine::init`](crate::AudioEngine::init); every call the engine makes
//! goes through it.
//!
//! ## Calling context
//!
//! | Method                | Called from            |
//! |-----------------------|------------------------|
//! | `set_amplifier`       | foreground             |
//! | `read_volume`         | foreground and ISR     |
//! | `reinit_audio_clock`  | foreground             |
//! | `start_dma`           | foreground             |
//! | `stop_dma`            | foreground only        |
//! | `on_playback_end`     | ISR                    |
//! | `on_fault`            | ISR                    |
//! | `delay_ms`            | foreground             |

use crate::error::AudioError;

/// Board hooks used by the playback engine.
pub trait AudioHardware {
    /// Switch the output amplifier (DAC enable line) on or off.
    fn set_amplifier(&mut self, enabled: bool);

    /// Current volume knob position, 0..=255.
    fn read_volume(&mut self) -> u8;

    /// Reprogram the audio clock tree for `sample_rate`.
    fn reinit_audio_clock(&mut self, sample_rate: u32);

    /// Start a circular transmit of `buffer` (interleaved stereo `i16`).
    ///
    /// The slice points into the engine and stays valid for the engine's
    /// lifetime; engines driving real DMA should live in a `static`. The
    /// peripheral must raise the half- and full-complete interrupts.
    fn start_dma(&mut self, buffer: &[i16]) -> Result<(), AudioError>;

    /// Stop the circular transmit. Never called from the completion handler.
    fn stop_dma(&mut self);

    /// Playback finished. Runs in interrupt context; keep it short.
    fn on_playback_end(&mut self) {}

    /// Unrecoverable condition detected in the completion handler.
    fn on_fault(&mut self, error: AudioError) {
        let _ = error;
        self.set_amplifier(false);
    }

    /// Busy-wait for `ms` milliseconds with interrupts enabled.
    ///
    /// Used by [`AudioEngine::shutdown`](crate::AudioEngine::shutdown) to let
    /// the stop fade play out. The default returns immediately.
    fn delay_ms(ms: u32)
    where
        Self: Sized,
    {
        let _ = ms;
    }

    /// Run `f` with the completion interrupt masked.
    ///
    /// The default runs `f` directly, which is only correct on hosts where
    /// the "interrupt" is driven synchronously (tests, offline rendering).
    fn critical_section<R, F: FnOnce() -> R>(f: F) -> R
    where
        Self: Sized,
    {
        f()
    }
}

/// DMA completion interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaEvent {
    /// First half of the buffer has been transmitted
    HalfComplete,
    /// Second half of the buffer has been transmitted
    FullComplete,
}

impl DmaEvent {
    /// The half that just finished playing and is now free to refill.
    pub const fn free_half(self) -> BufferHalf {
        match self {
            DmaEvent::HalfComplete => BufferHalf::First,
            DmaEvent::FullComplete => BufferHalf::Second,
        }
    }
}

/// One half of the ping-pong buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferHalf {
    First,
    Second,
}

impl BufferHalf {
    pub const fn other(self) -> Self {
        match self {
            BufferHalf::First => BufferHalf::Second,
            BufferHalf::Second => BufferHalf::First,
        }
    }

    /// Completion event raised once this half has been transmitted.
    pub const fn completion_event(self) -> DmaEvent {
        match self {
            BufferHalf::First => DmaEvent::HalfComplete,
            BufferHalf::Second => DmaEvent::FullComplete,
        }
    }
}
