//! Per-sample DSP chain.
//!
//! Stage order, per channel:
//!
//! ```text
//! widen (8-bit) → volume → low-pass → DC block → air → fade → gate → soft clip
//! ```
//!
//! The widen and volume stages are driven by the chunk decoder; everything
//! from the low-pass on lives here. Coefficients are derived from the
//! configuration when it changes, not per sample.

use chime_dsp::biquad::{BiquadCoeffs, WARMUP_CYCLES};
use chime_dsp::q16::{scale_sample, ONE};
use chime_dsp::{dc_block, dither, dynamics, envelope, Dither};

use crate::channel::{Channel, ChannelFilterState};
use crate::config::{FilterConfig, FilterFlags};
use crate::source::{RawSample, SampleDepth};

/// Low-pass variant on the 8-bit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lpf8 {
    Off,
    OnePole(u16),
    Biquad(BiquadCoeffs),
}

/// Values derived from a [`FilterConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Coefficients {
    lpf16: Option<BiquadCoeffs>,
    lpf8: Lpf8,
    dc_alpha: u16,
}

impl Coefficients {
    const fn from_config(config: &FilterConfig) -> Self {
        let lpf16 = match config.lpf16_alpha() {
            Some(alpha) => Some(BiquadCoeffs::from_alpha(alpha)),
            None => None,
        };
        let lpf8 = match config.lpf8_alpha() {
            None => Lpf8::Off,
            Some(alpha) if config.flags.contains(FilterFlags::LPF_8BIT_BIQUAD) => {
                Lpf8::Biquad(BiquadCoeffs::from_alpha(alpha))
            }
            Some(alpha) => Lpf8::OnePole(alpha),
        };
        let dc_alpha = if config.flags.contains(FilterFlags::SOFT_DC_FILTER) {
            dc_block::SOFT_ALPHA
        } else {
            dc_block::HARD_ALPHA
        };
        Self { lpf16, lpf8, dc_alpha }
    }
}

/// Configuration, derived coefficients and both channels' filter state.
#[derive(Debug, Clone)]
pub struct FilterChain {
    config: FilterConfig,
    coeffs: Coefficients,
    channels: [ChannelFilterState; 2],
    dither: Dither,
}

impl FilterChain {
    pub const fn new() -> Self {
        Self {
            config: FilterConfig::DEFAULT,
            coeffs: Coefficients::from_config(&FilterConfig::DEFAULT),
            channels: [ChannelFilterState::new(); 2],
            dither: Dither::new(),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Install a new configuration. Takes effect from the next sample.
    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config.sanitized();
        self.coeffs = Coefficients::from_config(&self.config);
    }

    pub fn channel(&self, channel: Channel) -> &ChannelFilterState {
        &self.channels[channel.index()]
    }

    /// Clear filter history and restart the dither sequence.
    pub fn reset(&mut self) {
        for state in self.channels.iter_mut() {
            state.reset();
        }
        self.dither.reseed(dither::DEFAULT_SEED);
    }

    /// Convert a raw source sample to signed 16-bit.
    #[inline]
    pub fn widen(&mut self, raw: RawSample) -> i16 {
        match raw {
            RawSample::S16(s) => s,
            RawSample::U8(s) if self.config.flags.contains(FilterFlags::DITHER_8BIT) => {
                self.dither.widen(s)
            }
            RawSample::U8(s) => dither::center(s),
        }
    }

    /// Pre-charge the biquad history for `channel` with its first sample.
    ///
    /// Uses the undithered value so the dither sequence is unaffected.
    pub fn warm_up(&mut self, channel: Channel, raw: RawSample, volume_q16: u32) {
        let x = match raw {
            RawSample::S16(s) => s,
            RawSample::U8(s) => dither::center(s),
        };
        let x = scale_sample(x, volume_q16);
        let state = &mut self.channels[channel.index()];
        match raw {
            RawSample::S16(_) => {
                if let Some(coeffs) = &self.coeffs.lpf16 {
                    state.lpf16.warm_up(coeffs, x, WARMUP_CYCLES);
                }
            }
            RawSample::U8(_) => {
                if let Lpf8::Biquad(coeffs) = &self.coeffs.lpf8 {
                    state.lpf8_biquad.warm_up(coeffs, x, WARMUP_CYCLES);
                }
            }
        }
    }

    /// Run the low-pass through soft-clip stages on one widened, volume-scaled sample.
    #[inline]
    pub fn process(&mut self, depth: SampleDepth, channel: Channel, x: i16, fade_q16: u32) -> i16 {
        let config = &self.config;
        let state = &mut self.channels[channel.index()];

        let mut s = match depth {
            SampleDepth::Bits16 => match &self.coeffs.lpf16 {
                Some(coeffs) => makeup(state.lpf16.process(coeffs, x), config.lpf16_makeup_gain_q16),
                None => x,
            },
            SampleDepth::Bits8 => match &self.coeffs.lpf8 {
                Lpf8::Off => x,
                Lpf8::OnePole(alpha) => state.lpf8.process(*alpha, config.lpf8_makeup_gain_q16, x),
                Lpf8::Biquad(coeffs) => {
                    makeup(state.lpf8_biquad.process(coeffs, x), config.lpf8_makeup_gain_q16)
                }
            },
        };

        s = state.dc.process(self.coeffs.dc_alpha, s);

        if config.flags.contains(FilterFlags::AIR_EFFECT) {
            s = state.air.process(config.air_gain_q16, s);
        }

        s = envelope::apply_gain(s, fade_q16);

        if config.flags.contains(FilterFlags::NOISE_GATE) {
            s = dynamics::noise_gate(s, config.gate_threshold);
        }
        if config.flags.contains(FilterFlags::SOFT_CLIPPING) {
            s = dynamics::soft_clip(s);
        }
        s
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn makeup(x: i16, gain_q16: u32) -> i16 {
    if gain_q16 == ONE {
        x
    } else {
        scale_sample(x, gain_q16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LpfLevel, MAKEUP_MAX_Q16};
    use chime_dsp::{shelf, BiquadState};

    fn everything_on() -> FilterConfig {
        let mut config = FilterConfig::DEFAULT;
        config.flags |= FilterFlags::AIR_EFFECT | FilterFlags::NOISE_GATE;
        config.set_lpf16_level(LpfLevel::Aggressive);
        config.lpf16_makeup_gain_q16 = MAKEUP_MAX_Q16;
        config.lpf8_makeup_gain_q16 = MAKEUP_MAX_Q16;
        config.air_gain_q16 = shelf::MAX_GAIN_Q16;
        config
    }

    #[test]
    fn test_adversarial_input_does_not_overflow() {
        for biquad8 in [false, true] {
            let mut config = everything_on();
            config.flags.set(FilterFlags::LPF_8BIT_BIQUAD, biquad8);
            config.flags.remove(FilterFlags::SOFT_CLIPPING);
            let mut chain = FilterChain::new();
            chain.set_config(config);

            for depth in [SampleDepth::Bits8, SampleDepth::Bits16] {
                chain.reset();
                for i in 0..4096 {
                    let x = match (i / 7) % 3 {
                        0 => i16::MAX,
                        1 => i16::MIN,
                        _ => if i % 2 == 0 { i16::MAX } else { i16::MIN },
                    };
                    // Any wrap in the intermediates panics in debug builds.
                    chain.process(depth, Channel::Left, x, ONE);
                }
            }
        }
    }

    #[test]
    fn test_soft_clip_limits_peaks() {
        let mut chain = FilterChain::new();
        let mut config = everything_on();
        config.set_lpf16_level(LpfLevel::Off);
        chain.set_config(config);
        let mut peak = 0i32;
        for i in 0..4096 {
            let x = if (i / 20) % 2 == 0 { i16::MAX } else { i16::MIN };
            let y = chain.process(SampleDepth::Bits16, Channel::Right, x, ONE) as i32;
            peak = peak.max(y.abs());
        }
        assert!(peak <= dynamics::CLIP_MAX);
        assert!(peak > dynamics::CLIP_THRESHOLD);
    }

    #[test]
    fn test_zero_fade_silences() {
        let mut chain = FilterChain::new();
        for i in 0..100 {
            let y = chain.process(SampleDepth::Bits16, Channel::Left, (i * 300) as i16, 0);
            assert_eq!(y, 0);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut chain = FilterChain::new();
        for _ in 0..50 {
            chain.process(SampleDepth::Bits16, Channel::Left, 20000, ONE);
        }
        assert_eq!(*chain.channel(Channel::Right), ChannelFilterState::new());
        assert_ne!(*chain.channel(Channel::Left), ChannelFilterState::new());
    }

    #[test]
    fn test_widen_respects_dither_flag() {
        let mut chain = FilterChain::new();
        let mut config = FilterConfig::DEFAULT;
        config.flags.remove(FilterFlags::DITHER_8BIT);
        chain.set_config(config);
        assert_eq!(chain.widen(RawSample::U8(0x90)), dither::center(0x90));
        assert_eq!(chain.widen(RawSample::S16(-7)), -7);
    }

    #[test]
    fn test_reset_replays_dither() {
        let mut chain = FilterChain::new();
        let first: Vec<i16> = (0..32).map(|_| chain.widen(RawSample::U8(0x80))).collect();
        chain.reset();
        let second: Vec<i16> = (0..32).map(|_| chain.widen(RawSample::U8(0x80))).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_warm_up_charges_biquad() {
        let mut chain = FilterChain::new();
        chain.warm_up(Channel::Left, RawSample::S16(8000), ONE);
        assert_ne!(chain.channel(Channel::Left).lpf16, BiquadState::new());
        // One-pole 8-bit path has no biquad to warm.
        chain.warm_up(Channel::Right, RawSample::U8(0xC0), ONE);
        assert_eq!(*chain.channel(Channel::Right), ChannelFilterState::new());
    }

    #[test]
    fn test_config_change_recomputes_coefficients() {
        let mut chain = FilterChain::new();
        let mut config = FilterConfig::DEFAULT;
        config.set_lpf16_level(LpfLevel::Off);
        chain.set_config(config);
        // Without the biquad the DC blocker passes a first sample straight through.
        assert_eq!(chain.process(SampleDepth::Bits16, Channel::Left, 1000, ONE), 1000);
    }
}
