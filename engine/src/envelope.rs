//! Fade envelope: start fade-in, end-of-data fade-out, pause and resume.
//!
//! Durations are configured in seconds and converted to sample counts at the
//! current playback rate. Counters count *source samples*, so a stereo frame
//! advances them by two.
//!
//! ## Pause continuity
//!
//! A pause can land in the middle of the start fade-in or inside the
//! end-of-data window. The pause fade-out then starts from the gain already in
//! effect: the current progress ratio is mapped onto the pause length and the
//! pause counter is armed part-way down. All curves are `ratio²`, so mapping
//! the ratio maps the gain.

use chime_dsp::envelope::{clamp_seconds, fade_in_gain_q16, fade_out_gain_q16, seconds_to_samples};
use chime_dsp::q16::mul_fraction;

/// Rate assumed before the first `set_sample_rate`.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

pub const DEFAULT_FADE_IN_SECONDS: f32 = 0.150;
pub const DEFAULT_FADE_OUT_SECONDS: f32 = 0.150;
pub const DEFAULT_PAUSE_FADE_SECONDS: f32 = 0.100;
pub const DEFAULT_RESUME_FADE_SECONDS: f32 = 0.100;

/// Which configured fade a duration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    /// Start of every sample
    In,
    /// Last stretch before the end of the data, and after a stop request
    Out,
    /// Fade to silence on pause
    Pause,
    /// Fade back in on resume
    Resume,
}

impl Fade {
    const fn index(self) -> usize {
        match self {
            Fade::In => 0,
            Fade::Out => 1,
            Fade::Pause => 2,
            Fade::Resume => 3,
        }
    }
}

/// Fade timing and progress.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeEnvelope {
    seconds: [f32; 4],
    samples: [u32; 4],
    sample_rate: u32,
    /// Samples left in the active fade-in (start or resume)
    fade_in_remaining: u32,
    /// Length of the active fade-in
    fade_in_len: u32,
    /// Samples left in the pause fade-out
    pause_remaining: u32,
    pausing: bool,
}

impl FadeEnvelope {
    pub const fn new() -> Self {
        Self {
            seconds: [
                DEFAULT_FADE_IN_SECONDS,
                DEFAULT_FADE_OUT_SECONDS,
                DEFAULT_PAUSE_FADE_SECONDS,
                DEFAULT_RESUME_FADE_SECONDS,
            ],
            // The defaults above at DEFAULT_SAMPLE_RATE.
            samples: [3308, 3308, 2205, 2205],
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_in_remaining: 0,
            fade_in_len: 0,
            pause_remaining: 0,
            pausing: false,
        }
    }

    /// Recompute every sample count for a new rate.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        for fade in [Fade::In, Fade::Out, Fade::Pause, Fade::Resume] {
            self.samples[fade.index()] = seconds_to_samples(self.seconds[fade.index()], sample_rate);
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set a duration in seconds, clamped to 1 ms..5 s.
    pub fn set_seconds(&mut self, fade: Fade, seconds: f32) {
        let seconds = clamp_seconds(seconds);
        self.seconds[fade.index()] = seconds;
        self.samples[fade.index()] = seconds_to_samples(seconds, self.sample_rate);
    }

    pub fn seconds(&self, fade: Fade) -> f32 {
        self.seconds[fade.index()]
    }

    pub fn samples(&self, fade: Fade) -> u32 {
        self.samples[fade.index()]
    }

    /// Arm the start fade-in for a new session.
    pub fn start(&mut self) {
        self.fade_in_len = self.samples(Fade::In);
        self.fade_in_remaining = self.fade_in_len;
        self.pause_remaining = 0;
        self.pausing = false;
    }

    /// Envelope gain for the next frame, given how many source samples remain.
    #[inline]
    pub fn gain_q16(&self, remaining_source: u32) -> u32 {
        let end = fade_out_gain_q16(remaining_source, self.samples(Fade::Out));
        if self.pausing {
            return fade_out_gain_q16(self.pause_remaining, self.samples(Fade::Pause)).min(end);
        }
        if self.fade_in_remaining == 0 {
            return end;
        }
        let elapsed = self.fade_in_len - self.fade_in_remaining;
        mul_fraction(fade_in_gain_q16(elapsed, self.fade_in_len), end)
    }

    /// Account for `consumed` source samples.
    #[inline]
    pub fn advance(&mut self, consumed: u32) {
        self.fade_in_remaining = self.fade_in_remaining.saturating_sub(consumed);
        if self.pausing {
            self.pause_remaining = self.pause_remaining.saturating_sub(consumed);
        }
    }

    /// Arm the pause fade-out starting from the gain currently in effect.
    pub fn begin_pause(&mut self, remaining_source: u32) {
        let (in_num, in_den) = if self.fade_in_remaining > 0 {
            (self.fade_in_len - self.fade_in_remaining, self.fade_in_len)
        } else {
            (1, 1)
        };
        let fade_out = self.samples(Fade::Out);
        let (out_num, out_den) = if remaining_source < fade_out {
            (remaining_source, fade_out)
        } else {
            (1, 1)
        };

        let num = self.samples(Fade::Pause) as u64 * in_num as u64 * out_num as u64;
        let den = in_den as u64 * out_den as u64;
        self.pause_remaining = ((num + den / 2) / den) as u32;
        self.fade_in_remaining = 0;
        self.pausing = true;
    }

    /// Cancel the pause fade and arm the resume fade-in.
    pub fn begin_resume(&mut self) {
        self.pausing = false;
        self.pause_remaining = 0;
        self.fade_in_len = self.samples(Fade::Resume);
        self.fade_in_remaining = self.fade_in_len;
    }

    pub fn is_pausing(&self) -> bool {
        self.pausing
    }

    /// The pause fade-out has reached silence.
    #[inline]
    pub fn pause_complete(&self) -> bool {
        self.pausing && self.pause_remaining == 0
    }

    /// Samples left in the active fade-in.
    pub fn fade_in_remaining(&self) -> u32 {
        self.fade_in_remaining
    }

    /// Samples left in the pause fade-out.
    pub fn pause_remaining(&self) -> u32 {
        self.pause_remaining
    }
}

impl Default for FadeEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_dsp::q16::ONE;

    const TOLERANCE: i64 = 64;

    #[test]
    fn test_default_counts_match_rate() {
        let mut envelope = FadeEnvelope::new();
        let defaults = envelope.clone();
        envelope.set_sample_rate(DEFAULT_SAMPLE_RATE);
        assert_eq!(envelope, defaults);
    }

    #[test]
    fn test_durations_follow_rate() {
        let mut envelope = FadeEnvelope::new();
        envelope.set_sample_rate(44100);
        assert_eq!(envelope.samples(Fade::In), 6615);
        envelope.set_seconds(Fade::Pause, 0.050);
        assert_eq!(envelope.samples(Fade::Pause), 2205);
        envelope.set_seconds(Fade::Resume, 10.0);
        assert_eq!(envelope.seconds(Fade::Resume), 5.0);
        envelope.set_seconds(Fade::Out, 0.0);
        assert_eq!(envelope.samples(Fade::Out), 44);
    }

    #[test]
    fn test_start_fade_in_ramps_to_unity() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        let total = envelope.samples(Fade::In);
        assert_eq!(envelope.gain_q16(100_000), 0);
        let mut prev = 0;
        for _ in 0..total {
            envelope.advance(1);
            let gain = envelope.gain_q16(100_000);
            assert!(gain >= prev);
            prev = gain;
        }
        assert_eq!(prev, ONE);
    }

    #[test]
    fn test_stereo_advances_twice_as_fast() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        let total = envelope.samples(Fade::In);
        for _ in 0..total / 2 {
            envelope.advance(2);
        }
        assert!(envelope.fade_in_remaining() <= 1);
    }

    #[test]
    fn test_end_fade_combines_with_fade_in() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        for _ in 0..1654 {
            envelope.advance(1);
        }
        // Quarter gain from the fade-in, quarter from the end window.
        let gain = envelope.gain_q16(1654) as i64;
        assert!((gain - (ONE as i64 / 16)).abs() < TOLERANCE, "gain {}", gain);
    }

    fn assert_pause_continuous(envelope: &mut FadeEnvelope, remaining_source: u32) {
        let before = envelope.gain_q16(remaining_source) as i64;
        envelope.begin_pause(remaining_source);
        let after = envelope.gain_q16(remaining_source) as i64;
        assert!(
            (before - after).abs() <= TOLERANCE,
            "jump from {} to {} (remaining {})",
            before,
            after,
            remaining_source
        );
    }

    #[test]
    fn test_pause_during_fade_in_is_continuous() {
        for percent in [0u32, 25, 50, 75, 99] {
            let mut envelope = FadeEnvelope::new();
            envelope.start();
            let total = envelope.samples(Fade::In);
            envelope.advance(total * percent / 100);
            assert_pause_continuous(&mut envelope, 1_000_000);
        }
    }

    #[test]
    fn test_pause_during_end_fade_is_continuous() {
        for percent in [0u32, 25, 50, 75, 99] {
            let mut envelope = FadeEnvelope::new();
            envelope.start();
            envelope.advance(10_000);
            let window = envelope.samples(Fade::Out);
            // 0% through the window means everything still remains.
            let remaining = window - window * percent / 100;
            assert_pause_continuous(&mut envelope, remaining);
        }
    }

    #[test]
    fn test_pause_during_both_fades_is_continuous() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        envelope.advance(2000);
        assert_pause_continuous(&mut envelope, 1500);
    }

    #[test]
    fn test_pause_at_full_volume_uses_whole_fade() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        envelope.advance(50_000);
        envelope.begin_pause(50_000);
        assert_eq!(envelope.pause_remaining(), envelope.samples(Fade::Pause));
        assert!(!envelope.pause_complete());
        for _ in 0..envelope.samples(Fade::Pause) {
            envelope.advance(1);
        }
        assert!(envelope.pause_complete());
        assert_eq!(envelope.gain_q16(50_000), 0);
    }

    #[test]
    fn test_pause_at_first_sample_completes_immediately() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        envelope.begin_pause(50_000);
        assert!(envelope.pause_complete());
    }

    #[test]
    fn test_resume_fades_back_in() {
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        envelope.advance(50_000);
        envelope.begin_pause(50_000);
        envelope.advance(envelope.samples(Fade::Pause));
        envelope.begin_resume();
        assert!(!envelope.is_pausing());
        assert_eq!(envelope.gain_q16(50_000), 0);
        envelope.advance(envelope.samples(Fade::Resume));
        assert_eq!(envelope.gain_q16(50_000), ONE);
    }
}
