//! Synchronous DMA stand-in for hosts.
//!
//! Plays the ping-pong buffer half by half: hand the playing half to a sink,
//! raise its completion event, move on. The same sequence real hardware
//! produces, without timers or interrupts. Used by the offline renderer and
//! the integration tests.

use crate::engine::AudioEngine;
use crate::hal::{AudioHardware, BufferHalf};

/// Drives an [`AudioEngine`] the way a circular DMA transfer would.
pub struct Loopback<'a, H: AudioHardware> {
    engine: &'a AudioEngine<H>,
    playing: BufferHalf,
}

impl<'a, H: AudioHardware> Loopback<'a, H> {
    /// Start at the first half, as a fresh transfer does.
    pub fn new(engine: &'a AudioEngine<H>) -> Self {
        Self { engine, playing: BufferHalf::First }
    }

    /// Transmit one half into `sink`, then raise its completion event.
    pub fn step(&mut self, mut sink: impl FnMut(&[i16])) {
        self.engine.with_half(self.playing, |data| sink(data));
        self.engine.on_dma_event(self.playing.completion_event());
        self.playing = self.playing.other();
    }

    /// Step while audio is being produced, at most `max_halves` times.
    ///
    /// Stops once the engine reaches `Idle` or `Paused`. Returns the number
    /// of halves transmitted.
    pub fn run(&mut self, max_halves: usize, mut sink: impl FnMut(&[i16])) -> usize {
        let mut halves = 0;
        while halves < max_halves && self.engine.state().is_active() {
            self.step(&mut sink);
            halves += 1;
        }
        halves
    }
}
