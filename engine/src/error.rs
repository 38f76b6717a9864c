//! Engine error type.

use core::fmt;

/// Categorical playback errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// No hardware has been attached with `init`
    NotInitialized,
    /// Sample depth other than 8 or 16 bits
    InvalidDepth,
    /// Zero length, longer than the source, or odd byte count for 16-bit data
    InvalidLength,
    /// Source holds no samples
    EmptySource,
    /// Sample rate outside the supported range
    InvalidSampleRate,
    /// DMA peripheral refused to start
    DmaStart,
    /// Decode requested with no live session or past the end of the source
    MissingChunk,
    /// Operation requires an idle engine
    Busy,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AudioError::NotInitialized => "audio hardware not attached",
            AudioError::InvalidDepth => "sample depth must be 8 or 16 bits",
            AudioError::InvalidLength => "invalid sample length",
            AudioError::EmptySource => "sample source is empty",
            AudioError::InvalidSampleRate => "unsupported sample rate",
            AudioError::DmaStart => "failed to start DMA transfer",
            AudioError::MissingChunk => "no sample data for refill",
            AudioError::Busy => "playback in progress",
        };
        f.write_str(msg)
    }
}
