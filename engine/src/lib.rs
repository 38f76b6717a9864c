//! # Chime Playback Engine
//!
//! Plays 8- or 16-bit PCM held in flash through an I2S DAC fed by a circular
//! DMA transfer. The CPU never writes the DAC directly: each DMA completion
//! interrupt refills the half of the ping-pong buffer that just finished.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  foreground: play_sample / pause / resume / stop / config     │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ critical section
//! ┌──────────────────────────────▼────────────────────────────────┐
//! │                         AudioEngine                           │
//! │  ┌────────────┐  ┌──────────────┐  ┌────────────────────────┐ │
//! │  │  Session   │─▶│   Decoder    │─▶│  PingPongBuffer (DMA)  │ │
//! │  │  (cursor)  │  │ FilterChain  │  │  First | Second        │ │
//! │  └────────────┘  │ FadeEnvelope │  └───────────▲────────────┘ │
//! │                  └──────────────┘              │              │
//! └────────────────────────────────────────────────┼──────────────┘
//!                                                  │ half/full complete
//!                                     ┌────────────┴────────────┐
//!                                     │ AudioHardware (board)   │
//!                                     └─────────────────────────┘
//! ```
//!
//! ## Per-sample path
//!
//! widen (8-bit dither or 16-bit passthrough) → volume → low-pass + makeup →
//! DC blocker → air shelf → fade envelope → noise gate → soft clip.
//!
//! ## Usage
//!
//! ```ignore
//! static AUDIO: AudioEngine<Board> = AudioEngine::new();
//!
//! AUDIO.init(Board::take());
//! AUDIO.play_sample(SampleSource::S16(&CHIME), CHIME.len(), 22050, ChannelMode::Mono)?;
//! AUDIO.wait_for_sample_end();
//!
//! // DMA interrupt handlers
//! fn DMA1_HT() { AUDIO.on_half_complete(); }
//! fn DMA1_TC() { AUDIO.on_full_complete(); }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod chain;
pub mod channel;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod hal;
pub mod loopback;
pub mod session;
pub mod source;

pub use buffer::{PingPongBuffer, BUFFER_LEN, FRAMES_PER_HALF, HALF_LEN};
pub use config::{FilterConfig, FilterFlags, LpfLevel};
pub use engine::{AudioEngine, PlaybackState, PlaybackStats};
pub use envelope::Fade;
pub use error::AudioError;
pub use hal::{AudioHardware, BufferHalf, DmaEvent};
pub use loopback::Loopback;
pub use source::{ChannelMode, SampleDepth, SampleSource};
