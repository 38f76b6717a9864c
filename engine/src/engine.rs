//! Playback engine context and state machine.
//!
//! ## Execution model
//!
//! There are exactly two execution contexts: foreground code and the DMA
//! completion interrupt. The interrupt never nests with itself, so the
//! "concurrency" is sequential re-entry across time rather than parallelism.
//!
//! - The interrupt handler ([`AudioEngine::on_dma_event`]) is the only code
//!   that touches the session cursor, the buffer and the filter history while
//!   playback is running. It takes the context lock with `try_lock`.
//! - Foreground entry points take the same lock inside
//!   [`AudioHardware::critical_section`], so the interrupt can never observe
//!   a half-applied update.
//! - The published [`PlaybackState`] and the stop request are atomics. Polling
//!   the state and requesting a stop never take the lock.
//!
//! ## State machine
//!
//! ```text
//!             play_sample             pause_playback        fade done
//!   Idle ─────────────────▶ Playing ───────────────▶ Pausing ───────▶ Paused
//!    ▲  ▲                    │   ▲                                      │
//!    │  └── terminal half ───┘   └────────── resume_playback ───────────┘
//!    │        played
//!    └──── stop_playback (after fade-out) / DMA start failure → PlayingFailed
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use chime_dsp::lowpass;
use chime_dsp::q16::to_f32;
use chime_dsp::shelf;
use chime_dsp::volume::{clamp_gamma, VolumeCurve, DEFAULT_GAMMA};
use log::{debug, info, trace, warn};
use spin::Mutex;

use crate::buffer::{PingPongBuffer, BUFFER_LEN};
use crate::chain::FilterChain;
use crate::channel::Channel;
use crate::config::{self, FilterConfig, FilterFlags, LpfLevel, AIR_PRESET_COUNT};
use crate::decoder::{decode_chunk, ChunkOutcome};
use crate::envelope::{Fade, FadeEnvelope, DEFAULT_SAMPLE_RATE};
use crate::error::AudioError;
use crate::hal::{AudioHardware, BufferHalf, DmaEvent};
use crate::session::PlaybackSession;
use crate::source::{ChannelMode, SampleSource};

/// Lowest accepted playback rate.
pub const MIN_SAMPLE_RATE: u32 = 1_000;

/// Highest accepted playback rate.
pub const MAX_SAMPLE_RATE: u32 = 96_000;

// =============================================================================
// Playback State
// =============================================================================

/// Top-level playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    /// Nothing playing
    Idle = 0,
    /// Streaming a sample
    Playing = 1,
    /// Fading to silence after a pause request
    Pausing = 2,
    /// Silent, resume point held
    Paused = 3,
    /// The DMA transfer could not be started
    PlayingFailed = 4,
}

impl PlaybackState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Pausing,
            3 => PlaybackState::Paused,
            4 => PlaybackState::PlayingFailed,
            _ => PlaybackState::Idle,
        }
    }

    /// Audio is being produced (`Playing` or `Pausing`).
    pub const fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Pausing)
    }

    /// A session exists (active or paused).
    pub const fn has_session(self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Pausing | PlaybackState::Paused
        )
    }
}

/// Counters for the current (or last) session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Output frames that carried source data
    pub frames_decoded: u32,
    /// Source samples consumed
    pub samples_consumed: u32,
    /// Buffer halves refilled with decoded audio
    pub refills: u32,
    /// Completion events dropped because the context was locked
    pub missed_refills: u32,
    /// End-of-playback notifications delivered
    pub end_notifications: u32,
}

// =============================================================================
// Engine Context
// =============================================================================

/// Everything the completion handler mutates.
struct Inner<H> {
    hw: Option<H>,
    chain: FilterChain,
    envelope: FadeEnvelope,
    volume: VolumeCurve,
    volume_gamma: f32,
    buffer: PingPongBuffer,
    session: Option<PlaybackSession>,
    sample_rate: u32,
    half_to_fill: BufferHalf,
    amp_control: bool,
    stats: PlaybackStats,
}

impl<H: AudioHardware> Inner<H> {
    const fn new() -> Self {
        Self {
            hw: None,
            chain: FilterChain::new(),
            envelope: FadeEnvelope::new(),
            volume: VolumeCurve::linear(),
            volume_gamma: DEFAULT_GAMMA,
            buffer: PingPongBuffer::new(),
            session: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            half_to_fill: BufferHalf::First,
            amp_control: true,
            stats: PlaybackStats {
                frames_decoded: 0,
                samples_consumed: 0,
                refills: 0,
                missed_refills: 0,
                end_notifications: 0,
            },
        }
    }

    fn hw(&mut self) -> Result<&mut H, AudioError> {
        self.hw.as_mut().ok_or(AudioError::NotInitialized)
    }

    fn read_volume_q16(&mut self) -> u32 {
        let raw = match self.hw.as_mut() {
            Some(hw) => hw.read_volume(),
            None => u8::MAX,
        };
        self.volume.gain_q16(raw)
    }

    /// Decode the next chunk into `half` and account for it.
    fn refill(&mut self, half: BufferHalf, volume_q16: u32) -> Result<ChunkOutcome, AudioError> {
        let outcome = decode_chunk(
            self.session.as_mut(),
            &mut self.chain,
            &mut self.envelope,
            volume_q16,
            self.buffer.half_mut(half),
        )?;

        if outcome.exhausted {
            if let Some(session) = self.session.as_mut() {
                session.mark_terminal(half);
            }
        }
        self.stats.frames_decoded = self.stats.frames_decoded.wrapping_add(outcome.frames as u32);
        self.stats.samples_consumed =
            self.stats.samples_consumed.wrapping_add(outcome.consumed as u32);
        self.stats.refills = self.stats.refills.wrapping_add(1);
        Ok(outcome)
    }

    /// Reset filters and fades, warm up, and pre-fill both halves.
    fn start_session(
        &mut self,
        source: SampleSource,
        length: usize,
        sample_rate: u32,
        mode: ChannelMode,
    ) -> Result<(), AudioError> {
        self.hw()?.reinit_audio_clock(sample_rate);
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        self.envelope.start();
        self.chain.reset();
        self.stats = PlaybackStats::default();

        let volume_q16 = self.read_volume_q16();
        let session = PlaybackSession::new(source, length, mode);
        if let Some(first) = source.get(0) {
            self.chain.warm_up(Channel::Left, first, volume_q16);
        }
        let right_first = match mode {
            ChannelMode::Mono => source.get(0),
            ChannelMode::Stereo if length > 1 => source.get(1),
            ChannelMode::Stereo => None,
        };
        if let Some(first) = right_first {
            self.chain.warm_up(Channel::Right, first, volume_q16);
        }

        self.session = Some(session);
        self.buffer.clear();
        let prefill = self
            .refill(BufferHalf::First, volume_q16)
            .and_then(|_| self.refill(BufferHalf::Second, volume_q16));
        if let Err(err) = prefill {
            self.session = None;
            return Err(err);
        }
        self.half_to_fill = BufferHalf::First;
        Ok(())
    }

    fn update_config(&mut self, f: impl FnOnce(&mut FilterConfig)) {
        let mut config = *self.chain.config();
        f(&mut config);
        self.chain.set_config(config);
    }
}

/// The playback engine.
///
/// Construct with [`AudioEngine::new`] (usable in a `static`), attach the
/// board with [`AudioEngine::init`], and wire the DMA completion interrupts
/// to [`AudioEngine::on_dma_event`].
pub struct AudioEngine<H: AudioHardware> {
    state: AtomicU8,
    stop_requested: AtomicBool,
    missed_refills: AtomicU32,
    inner: Mutex<Inner<H>>,
}

impl<H: AudioHardware> AudioEngine<H> {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(PlaybackState::Idle as u8),
            stop_requested: AtomicBool::new(false),
            missed_refills: AtomicU32::new(0),
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Run `f` on the context with the completion interrupt masked.
    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner<H>) -> R) -> R {
        H::critical_section(|| f(&mut self.inner.lock()))
    }

    fn publish(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Attach the board and restore the default configuration.
    pub fn init(&self, hw: H) {
        self.with_inner(|inner| {
            inner.hw = Some(hw);
            inner.chain.set_config(FilterConfig::DEFAULT);
            inner.envelope.set_sample_rate(inner.sample_rate);
            inner.session = None;
            inner.buffer.clear();
        });
        self.stop_requested.store(false, Ordering::Release);
        self.publish(PlaybackState::Idle);
        info!("audio engine initialised");
    }

    /// Stop the transfer, power down and hand the board back.
    pub fn release(&self) -> Option<H> {
        let hw = self.with_inner(|inner| {
            inner.session = None;
            let mut hw = inner.hw.take();
            if let Some(hw) = hw.as_mut() {
                hw.stop_dma();
                hw.set_amplifier(false);
            }
            hw
        });
        self.stop_requested.store(false, Ordering::Release);
        self.publish(PlaybackState::Idle);
        hw
    }

    /// Borrow the attached hardware.
    pub fn with_hardware<R>(&self, f: impl FnOnce(&mut H) -> R) -> Option<R> {
        self.with_inner(|inner| inner.hw.as_mut().map(f))
    }

    // =========================================================================
    // Playback control
    // =========================================================================

    /// Start playing `length` samples of `source` at `sample_rate`.
    ///
    /// Any session in progress is cut off. On a validation error nothing
    /// changes. If the DMA refuses to start the state becomes
    /// [`PlaybackState::PlayingFailed`] and the amplifier is switched back off.
    pub fn play_sample(
        &self,
        source: SampleSource,
        length: usize,
        sample_rate: u32,
        mode: ChannelMode,
    ) -> Result<PlaybackState, AudioError> {
        if source.is_empty() {
            warn!("play_sample: empty source");
            return Err(AudioError::EmptySource);
        }
        if length == 0 || length > source.len() {
            warn!("play_sample: bad length {} (source has {})", length, source.len());
            return Err(AudioError::InvalidLength);
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            warn!("play_sample: unsupported rate {} Hz", sample_rate);
            return Err(AudioError::InvalidSampleRate);
        }

        self.with_inner(|inner| {
            inner.hw()?;
            if self.state().has_session() {
                inner.hw()?.stop_dma();
                inner.session = None;
            }
            self.stop_requested.store(false, Ordering::Release);
            self.missed_refills.store(0, Ordering::Relaxed);

            if let Err(err) = inner.start_session(source, length, sample_rate, mode) {
                self.publish(PlaybackState::Idle);
                return Err(err);
            }

            let amp_control = inner.amp_control;
            let Inner { hw, buffer, session, .. } = inner;
            let hw = hw.as_mut().ok_or(AudioError::NotInitialized)?;
            if amp_control {
                hw.set_amplifier(true);
            }
            self.publish(PlaybackState::Playing);
            if let Err(err) = hw.start_dma(buffer.as_slice()) {
                warn!("play_sample: DMA start failed: {}", err);
                *session = None;
                if amp_control {
                    hw.set_amplifier(false);
                }
                self.publish(PlaybackState::PlayingFailed);
                return Err(err);
            }

            info!(
                "playback started: {} samples, {}-bit {:?} at {} Hz",
                length,
                source.depth().bits(),
                mode,
                sample_rate
            );
            Ok(PlaybackState::Playing)
        })
    }

    /// Begin fading to silence. Only meaningful while `Playing`.
    pub fn pause_playback(&self) -> PlaybackState {
        if self.state() != PlaybackState::Playing {
            return self.state();
        }
        self.with_inner(|inner| {
            if self.state() != PlaybackState::Playing {
                return self.state();
            }
            let remaining = match inner.session.as_ref() {
                Some(session) if session.terminal().is_none() => session.remaining(),
                // Nothing left to fade; let the tail play out.
                _ => return PlaybackState::Playing,
            };
            inner.envelope.begin_pause(remaining as u32);
            self.publish(PlaybackState::Pausing);
            info!("pausing with {} samples left", remaining);
            PlaybackState::Pausing
        })
    }

    /// Fade back in from the held position. Only meaningful while `Paused`.
    pub fn resume_playback(&self) -> PlaybackState {
        if self.state() != PlaybackState::Paused {
            return self.state();
        }
        self.with_inner(|inner| {
            if self.state() != PlaybackState::Paused {
                return self.state();
            }
            inner.envelope.begin_resume();
            self.publish(PlaybackState::Playing);
            if let Some(session) = inner.session.as_ref() {
                info!("resuming at sample {}", session.cursor());
            }
            PlaybackState::Playing
        })
    }

    /// Ask the completion handler to fade out and finish.
    ///
    /// Returns immediately; the state reaches `Idle` once the shortened
    /// fade-out has played. A pause fade in progress is finished instead of
    /// parking in `Paused`. A failed start is cleared straight to `Idle`.
    pub fn stop_playback(&self) -> PlaybackState {
        match self.state() {
            PlaybackState::Idle => PlaybackState::Idle,
            PlaybackState::PlayingFailed => {
                self.publish(PlaybackState::Idle);
                PlaybackState::Idle
            }
            state => {
                self.stop_requested.store(true, Ordering::Release);
                info!("stop requested");
                state
            }
        }
    }

    /// Spin until the state leaves `Playing`/`Pausing`, then stop the DMA.
    ///
    /// Returns the state that ended the wait. A `Paused` engine keeps its DMA
    /// running so it can be resumed.
    pub fn wait_for_sample_end(&self) -> PlaybackState {
        while self.state().is_active() {
            core::hint::spin_loop();
        }
        let state = self.state();
        if state != PlaybackState::Paused {
            self.with_inner(|inner| {
                let amp_control = inner.amp_control;
                if let Some(hw) = inner.hw.as_mut() {
                    hw.stop_dma();
                    if amp_control {
                        hw.set_amplifier(false);
                    }
                }
            });
            debug!("playback ended, DMA stopped");
        }
        state
    }

    /// Milliseconds needed to play out a stop fade and the buffered audio.
    pub fn drain_time_ms(&self) -> u32 {
        let (rate, fade) =
            self.with_inner(|inner| (inner.sample_rate, inner.envelope.samples(Fade::Out)));
        let samples = BUFFER_LEN as u64 + fade as u64;
        ((samples * 1000 + rate as u64 - 1) / rate as u64) as u32
    }

    /// Fade out whatever is playing, then stop the DMA and power down.
    pub fn shutdown(&self) {
        if self.state().has_session() {
            self.stop_requested.store(true, Ordering::Release);
            H::delay_ms(self.drain_time_ms());
        }
        self.with_inner(|inner| {
            if let Some(hw) = inner.hw.as_mut() {
                hw.stop_dma();
                hw.set_amplifier(false);
            }
            inner.session = None;
            inner.buffer.clear();
        });
        self.stop_requested.store(false, Ordering::Release);
        self.publish(PlaybackState::Idle);
        info!("audio shut down");
    }

    // =========================================================================
    // Interrupt entry points
    // =========================================================================

    /// DMA completion handler. Wire both completion interrupts here.
    pub fn on_dma_event(&self, event: DmaEvent) {
        let Some(mut inner) = self.inner.try_lock() else {
            self.missed_refills.fetch_add(1, Ordering::Relaxed);
            warn!("{:?}: context busy, refill skipped", event);
            return;
        };
        let half = event.free_half();
        inner.half_to_fill = half;

        match self.state() {
            PlaybackState::Idle | PlaybackState::PlayingFailed => {
                inner.buffer.fill_silence(half);
            }
            PlaybackState::Paused => {
                inner.buffer.fill_silence(half);
                if self.stop_requested.swap(false, Ordering::AcqRel) {
                    self.finish(&mut inner);
                }
            }
            PlaybackState::Playing | PlaybackState::Pausing => self.service(&mut inner, half),
        }
    }

    /// Half-transfer-complete interrupt.
    pub fn on_half_complete(&self) {
        self.on_dma_event(DmaEvent::HalfComplete);
    }

    /// Transfer-complete interrupt.
    pub fn on_full_complete(&self) {
        self.on_dma_event(DmaEvent::FullComplete);
    }

    fn service(&self, inner: &mut Inner<H>, half: BufferHalf) {
        if self.stop_requested.swap(false, Ordering::AcqRel) {
            let mut fade_out = inner.envelope.samples(Fade::Out);
            // A pause fade already in flight ends the session where it reaches
            // silence, so the refill below sees exhaustion and never `Paused`.
            if inner.envelope.is_pausing() {
                fade_out = fade_out.min(inner.envelope.pause_remaining());
            }
            if let Some(session) = inner.session.as_mut() {
                session.truncate(fade_out as usize);
            }
        }

        if let Some(terminal) = inner.session.as_ref().and_then(|s| s.terminal()) {
            inner.buffer.fill_silence(half);
            if terminal == half {
                self.finish(inner);
            }
            return;
        }

        let volume_q16 = inner.read_volume_q16();
        match inner.refill(half, volume_q16) {
            Ok(outcome) => {
                trace!("{:?} refilled: {} frames", half, outcome.frames);
                if self.state() == PlaybackState::Pausing
                    && outcome.pause_complete
                    && !outcome.exhausted
                {
                    self.publish(PlaybackState::Paused);
                }
            }
            Err(err) => {
                warn!("refill of {:?} failed: {}", half, err);
                inner.buffer.fill_silence(half);
                inner.session = None;
                if let Some(hw) = inner.hw.as_mut() {
                    hw.on_fault(err);
                }
                self.publish(PlaybackState::Idle);
            }
        }
    }

    /// End the session: publish `Idle` and notify once.
    fn finish(&self, inner: &mut Inner<H>) {
        if inner.session.take().is_none() {
            return;
        }
        self.publish(PlaybackState::Idle);
        self.stop_requested.store(false, Ordering::Release);
        inner.stats.end_notifications = inner.stats.end_notifications.wrapping_add(1);
        if let Some(hw) = inner.hw.as_mut() {
            hw.on_playback_end();
        }
    }

    // =========================================================================
    // Engine accessors
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Overwrite the published state. For fault handlers and ISR glue.
    pub fn set_state(&self, state: PlaybackState) {
        self.publish(state);
    }

    /// Half most recently handed to the refill path.
    pub fn half_to_fill(&self) -> BufferHalf {
        self.with_inner(|inner| inner.half_to_fill)
    }

    pub fn set_half_to_fill(&self, half: BufferHalf) {
        self.with_inner(|inner| inner.half_to_fill = half);
    }

    /// Rate of the current or last session.
    pub fn playback_rate(&self) -> u32 {
        self.with_inner(|inner| inner.sample_rate)
    }

    /// Change the rate used for fade-duration conversions. Idle only.
    pub fn set_playback_rate(&self, sample_rate: u32) -> Result<(), AudioError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(AudioError::InvalidSampleRate);
        }
        if self.state().has_session() {
            return Err(AudioError::Busy);
        }
        self.with_inner(|inner| {
            inner.sample_rate = sample_rate;
            inner.envelope.set_sample_rate(sample_rate);
        });
        Ok(())
    }

    /// Source position of the active session.
    pub fn position(&self) -> Option<usize> {
        self.with_inner(|inner| inner.session.as_ref().map(|s| s.cursor()))
    }

    pub fn stats(&self) -> PlaybackStats {
        let mut stats = self.with_inner(|inner| inner.stats);
        stats.missed_refills = self.missed_refills.load(Ordering::Relaxed);
        stats
    }

    /// Read one half of the output buffer.
    pub fn with_half<R>(&self, half: BufferHalf, f: impl FnOnce(&[i16]) -> R) -> R {
        self.with_inner(|inner| f(inner.buffer.half(half)))
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn config(&self) -> FilterConfig {
        self.with_inner(|inner| *inner.chain.config())
    }

    /// Replace the whole configuration (sanitised first).
    pub fn set_config(&self, config: FilterConfig) {
        self.with_inner(|inner| inner.chain.set_config(config));
    }

    /// Enable or disable one or more stages.
    pub fn set_filter_enabled(&self, flags: FilterFlags, enabled: bool) {
        self.with_inner(|inner| inner.update_config(|c| c.flags.set(flags, enabled)));
    }

    /// `true` if every stage in `flags` is enabled.
    pub fn filter_enabled(&self, flags: FilterFlags) -> bool {
        self.config().flags.contains(flags)
    }

    pub fn set_lpf16_level(&self, level: LpfLevel) {
        self.with_inner(|inner| inner.update_config(|c| c.set_lpf16_level(level)));
    }

    pub fn lpf16_level(&self) -> LpfLevel {
        self.config().lpf16_level
    }

    /// Set the custom biquad alpha. Takes effect when the level is `Custom`.
    pub fn set_lpf16_custom_alpha(&self, alpha: u16) {
        self.with_inner(|inner| inner.update_config(|c| c.lpf16_custom_alpha = alpha));
    }

    pub fn lpf16_custom_alpha(&self) -> u16 {
        self.config().lpf16_custom_alpha
    }

    /// Active 16-bit alpha, 0 when the filter is off.
    pub fn lpf16_alpha(&self) -> u16 {
        self.config().lpf16_alpha().unwrap_or(0)
    }

    /// Switch the 16-bit filter to a custom alpha for `cutoff_hz` at the current rate.
    ///
    /// Returns the alpha chosen, or 0 (filter unchanged) for an invalid cutoff.
    pub fn set_lpf16_cutoff_hz(&self, cutoff_hz: f32) -> u16 {
        let alpha = lowpass::alpha_from_cutoff(cutoff_hz, self.playback_rate());
        if alpha != 0 {
            self.with_inner(|inner| {
                inner.update_config(|c| {
                    c.lpf16_custom_alpha = alpha;
                    c.set_lpf16_level(LpfLevel::Custom);
                })
            });
        }
        alpha
    }

    /// Approximate 16-bit corner frequency at the current rate.
    pub fn lpf16_cutoff_hz(&self) -> f32 {
        lowpass::cutoff_from_alpha(self.lpf16_alpha(), self.playback_rate())
    }

    pub fn set_lpf8_level(&self, level: LpfLevel) {
        self.with_inner(|inner| inner.update_config(|c| c.set_lpf8_level(level)));
    }

    pub fn lpf8_level(&self) -> LpfLevel {
        self.config().lpf8_level
    }

    pub fn set_lpf8_custom_alpha(&self, alpha: u16) {
        self.with_inner(|inner| inner.update_config(|c| c.lpf8_custom_alpha = alpha));
    }

    pub fn lpf8_custom_alpha(&self) -> u16 {
        self.config().lpf8_custom_alpha
    }

    pub fn set_lpf16_makeup_gain(&self, gain: f32) {
        let q16 = config::makeup_gain_q16(gain);
        self.with_inner(|inner| inner.update_config(|c| c.lpf16_makeup_gain_q16 = q16));
    }

    pub fn lpf16_makeup_gain(&self) -> f32 {
        to_f32(self.config().lpf16_makeup_gain_q16)
    }

    pub fn set_lpf8_makeup_gain(&self, gain: f32) {
        let q16 = config::makeup_gain_q16(gain);
        self.with_inner(|inner| inner.update_config(|c| c.lpf8_makeup_gain_q16 = q16));
    }

    pub fn lpf8_makeup_gain(&self) -> f32 {
        to_f32(self.config().lpf8_makeup_gain_q16)
    }

    pub fn set_noise_gate_threshold(&self, threshold: u16) {
        self.with_inner(|inner| inner.update_config(|c| c.gate_threshold = threshold));
    }

    // -------------------------------------------------------------------------
    // Air effect
    // -------------------------------------------------------------------------

    pub fn set_air_effect(&self, enabled: bool) {
        self.set_filter_enabled(FilterFlags::AIR_EFFECT, enabled);
    }

    pub fn air_effect_enabled(&self) -> bool {
        self.filter_enabled(FilterFlags::AIR_EFFECT)
    }

    /// Set the shelf gain G directly (Q16, clamped to 2.0).
    pub fn set_air_gain_q16(&self, gain_q16: u32) {
        self.with_inner(|inner| inner.update_config(|c| c.air_gain_q16 = gain_q16));
    }

    pub fn air_gain_q16(&self) -> u32 {
        self.config().air_gain_q16
    }

    /// Set the boost at Nyquist in dB.
    pub fn set_air_gain_db(&self, db: f32) {
        self.set_air_gain_q16(shelf::gain_q16_from_db(db));
    }

    pub fn air_gain_db(&self) -> f32 {
        shelf::db_from_gain_q16(self.air_gain_q16())
    }

    /// Select a preset; 0 turns the effect off. Indices wrap.
    pub fn set_air_preset(&self, index: u8) {
        self.with_inner(|inner| inner.update_config(|c| c.apply_air_preset(index)));
    }

    pub fn air_preset(&self) -> u8 {
        self.config().air_preset
    }

    /// Step to the next preset and return its index.
    pub fn cycle_air_preset(&self) -> u8 {
        self.with_inner(|inner| {
            inner.update_config(|c| c.apply_air_preset((c.air_preset + 1) % AIR_PRESET_COUNT));
            inner.chain.config().air_preset
        })
    }

    pub fn air_preset_count(&self) -> u8 {
        AIR_PRESET_COUNT
    }

    /// Boost of a preset in dB; out-of-range indices read as 0.
    pub fn air_preset_db(&self, index: u8) -> f32 {
        shelf::PRESETS_DB.get(index as usize).copied().unwrap_or(0.0)
    }

    // -------------------------------------------------------------------------
    // Fades
    // -------------------------------------------------------------------------

    /// Set a fade duration in seconds (clamped to 1 ms..5 s).
    pub fn set_fade_time(&self, fade: Fade, seconds: f32) {
        self.with_inner(|inner| inner.envelope.set_seconds(fade, seconds));
    }

    pub fn fade_time(&self, fade: Fade) -> f32 {
        self.with_inner(|inner| inner.envelope.seconds(fade))
    }

    /// Fade duration in samples at the current rate.
    pub fn fade_samples(&self, fade: Fade) -> u32 {
        self.with_inner(|inner| inner.envelope.samples(fade))
    }

    pub fn set_fade_in_time(&self, seconds: f32) {
        self.set_fade_time(Fade::In, seconds);
    }

    pub fn fade_in_time(&self) -> f32 {
        self.fade_time(Fade::In)
    }

    pub fn set_fade_out_time(&self, seconds: f32) {
        self.set_fade_time(Fade::Out, seconds);
    }

    pub fn fade_out_time(&self) -> f32 {
        self.fade_time(Fade::Out)
    }

    pub fn set_pause_fade_time(&self, seconds: f32) {
        self.set_fade_time(Fade::Pause, seconds);
    }

    pub fn pause_fade_time(&self) -> f32 {
        self.fade_time(Fade::Pause)
    }

    pub fn set_resume_fade_time(&self, seconds: f32) {
        self.set_fade_time(Fade::Resume, seconds);
    }

    pub fn resume_fade_time(&self) -> f32 {
        self.fade_time(Fade::Resume)
    }

    // -------------------------------------------------------------------------
    // Volume response
    // -------------------------------------------------------------------------

    /// Choose between the linear and the power-law volume response.
    pub fn set_volume_response_nonlinear(&self, nonlinear: bool) {
        let gamma = self.volume_gamma();
        let curve = volume_curve(nonlinear, gamma);
        self.with_inner(|inner| inner.volume = curve);
    }

    pub fn volume_response_nonlinear(&self) -> bool {
        self.with_inner(|inner| inner.volume.is_perceptual())
    }

    /// Set the power-law exponent (clamped to 1.0..=4.0).
    ///
    /// Kept while the linear response is selected.
    pub fn set_volume_gamma(&self, gamma: f32) {
        let gamma = clamp_gamma(gamma);
        let curve = volume_curve(self.volume_response_nonlinear(), gamma);
        self.with_inner(|inner| {
            inner.volume = curve;
            inner.volume_gamma = gamma;
        });
    }

    pub fn volume_gamma(&self) -> f32 {
        self.with_inner(|inner| inner.volume_gamma)
    }

    // -------------------------------------------------------------------------
    // Amplifier
    // -------------------------------------------------------------------------

    /// Let the engine switch the amplifier around each session.
    pub fn set_amp_control(&self, enabled: bool) {
        self.with_inner(|inner| inner.amp_control = enabled);
    }

    pub fn amp_control(&self) -> bool {
        self.with_inner(|inner| inner.amp_control)
    }
}

/// Tables are built outside the lock; 256 `powf` calls are too slow for a
/// critical section.
fn volume_curve(nonlinear: bool, gamma: f32) -> VolumeCurve {
    if nonlinear {
        VolumeCurve::perceptual(gamma)
    } else {
        VolumeCurve::linear()
    }
}

impl<H: AudioHardware> Default for AudioEngine<H> {
    fn default() -> Self {
        Self::new()
    }
}
