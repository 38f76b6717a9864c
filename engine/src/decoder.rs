//! Chunk decoder: one half-buffer of source samples to stereo output frames.

use chime_dsp::q16::scale_sample;

use crate::buffer::SILENCE;
use crate::chain::FilterChain;
use crate::channel::Channel;
use crate::envelope::FadeEnvelope;
use crate::error::AudioError;
use crate::session::PlaybackSession;
use crate::source::ChannelMode;

/// Result of decoding one half.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Frames carrying source data (the rest are silence)
    pub frames: usize,
    /// Source samples consumed
    pub consumed: usize,
    /// The source ran out during (or before) this chunk
    pub exhausted: bool,
    /// The pause fade-out reached silence during (or before) this chunk
    pub pause_complete: bool,
}

/// Decode into `out` (interleaved stereo) from the session cursor.
///
/// Frames are rendered until the half is full, the source is exhausted, or a
/// pause fade-out reaches silence; any remaining frames are silence and
/// consume nothing. The session cursor and fade counters advance by exactly
/// the samples rendered.
pub fn decode_chunk(
    session: Option<&mut PlaybackSession>,
    chain: &mut FilterChain,
    envelope: &mut FadeEnvelope,
    volume_q16: u32,
    out: &mut [i16],
) -> Result<ChunkOutcome, AudioError> {
    let session = session.ok_or(AudioError::MissingChunk)?;
    if session.end() > session.source().len() {
        return Err(AudioError::MissingChunk);
    }

    let source = *session.source();
    let depth = source.depth();
    let mode = session.mode();
    let mut outcome = ChunkOutcome::default();

    for frame in out.chunks_exact_mut(2) {
        if session.is_exhausted() || envelope.pause_complete() {
            frame[0] = SILENCE;
            frame[1] = SILENCE;
            continue;
        }

        let cursor = session.cursor();
        let fade = envelope.gain_q16(session.remaining() as u32);
        let mut render = |channel: Channel, index: usize| -> Result<i16, AudioError> {
            let raw = source.get(index).ok_or(AudioError::MissingChunk)?;
            let x = scale_sample(chain.widen(raw), volume_q16);
            Ok(chain.process(depth, channel, x, fade))
        };

        let left = render(Channel::Left, cursor)?;
        let (right, consumed) = match mode {
            ChannelMode::Mono => (left, 1),
            ChannelMode::Stereo if cursor + 1 < session.end() => {
                (render(Channel::Right, cursor + 1)?, 2)
            }
            // Odd-length stereo data: the last frame has no right sample.
            ChannelMode::Stereo => (SILENCE, 1),
        };

        frame[0] = left;
        frame[1] = right;
        session.advance(consumed);
        envelope.advance(consumed as u32);
        outcome.frames += 1;
        outcome.consumed += consumed;
    }

    outcome.exhausted = session.is_exhausted();
    outcome.pause_complete = envelope.pause_complete();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{FRAMES_PER_HALF, HALF_LEN};
    use crate::config::{FilterConfig, FilterFlags, LpfLevel};
    use crate::envelope::Fade;
    use crate::source::SampleSource;
    use chime_dsp::q16::ONE;

    fn transparent_chain() -> FilterChain {
        let mut config = FilterConfig::DEFAULT;
        config.set_lpf16_level(LpfLevel::Off);
        config.set_lpf8_level(LpfLevel::Off);
        config.flags.remove(FilterFlags::SOFT_CLIPPING | FilterFlags::DITHER_8BIT);
        let mut chain = FilterChain::new();
        chain.set_config(config);
        chain
    }

    fn leak<T: Copy>(data: Vec<T>) -> &'static [T] {
        Box::leak(data.into_boxed_slice())
    }

    #[test]
    fn test_missing_session_is_an_error() {
        let mut chain = FilterChain::new();
        let mut envelope = FadeEnvelope::new();
        let mut out = [0i16; HALF_LEN];
        assert_eq!(
            decode_chunk(None, &mut chain, &mut envelope, ONE, &mut out),
            Err(AudioError::MissingChunk)
        );
    }

    #[test]
    fn test_session_past_source_is_an_error() {
        let data = leak(vec![0i16; 10]);
        let mut session = PlaybackSession::new(SampleSource::S16(data), 20, ChannelMode::Mono);
        let mut out = [0i16; HALF_LEN];
        let result = decode_chunk(
            Some(&mut session),
            &mut FilterChain::new(),
            &mut FadeEnvelope::new(),
            ONE,
            &mut out,
        );
        assert_eq!(result, Err(AudioError::MissingChunk));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_mono_is_duplicated_and_padded() {
        let data = leak((0..700).map(|i| (i % 50) as i16 * 100).collect());
        let mut session = PlaybackSession::new(SampleSource::S16(data), 700, ChannelMode::Mono);
        let mut chain = transparent_chain();
        let mut envelope = FadeEnvelope::new();
        let mut out = [1i16; HALF_LEN];

        let first = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert_eq!(first.frames, FRAMES_PER_HALF);
        assert_eq!(first.consumed, 512);
        assert!(!first.exhausted);
        assert!(out.chunks_exact(2).all(|f| f[0] == f[1]));

        let second = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert_eq!(second.frames, 188);
        assert!(second.exhausted);
        assert!(out[188 * 2..].iter().all(|&s| s == SILENCE));
    }

    #[test]
    fn test_stereo_consumes_pairs() {
        let data = leak(vec![1000i16; 2049]);
        let mut session = PlaybackSession::new(SampleSource::S16(data), 2049, ChannelMode::Stereo);
        let mut chain = transparent_chain();
        let mut envelope = FadeEnvelope::new();
        let mut out = [0i16; HALF_LEN];

        let first = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert_eq!(first.consumed, 1024);
        let second = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert_eq!(second.consumed, 1024);
        let third = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        // One dangling left sample, right slot silent.
        assert_eq!(third.frames, 1);
        assert_eq!(third.consumed, 1);
        assert_eq!(out[1], SILENCE);
        assert!(third.exhausted);
    }

    #[test]
    fn test_fade_counters_track_consumed_samples() {
        let data = leak(vec![200u8; 4096]);
        let mut session = PlaybackSession::new(SampleSource::U8(data), 4096, ChannelMode::Stereo);
        let mut chain = FilterChain::new();
        let mut envelope = FadeEnvelope::new();
        envelope.start();
        let before = envelope.fade_in_remaining();
        let mut out = [0i16; HALF_LEN];
        decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert_eq!(before - envelope.fade_in_remaining(), 1024);
    }

    #[test]
    fn test_pause_completion_stops_consuming() {
        let data = leak(vec![8000i16; 20_000]);
        let mut session = PlaybackSession::new(SampleSource::S16(data), 20_000, ChannelMode::Mono);
        let mut chain = transparent_chain();
        let mut envelope = FadeEnvelope::new();
        envelope.set_seconds(Fade::Pause, 0.010);
        envelope.begin_pause(20_000);
        let pause_len = envelope.samples(Fade::Pause) as usize;

        let mut out = [0i16; HALF_LEN];
        let outcome = decode_chunk(Some(&mut session), &mut chain, &mut envelope, ONE, &mut out).unwrap();
        assert!(outcome.pause_complete);
        assert_eq!(outcome.consumed, pause_len);
        assert_eq!(session.cursor(), pause_len);
        assert!(out[pause_len * 2..].iter().all(|&s| s == SILENCE));
    }
}
