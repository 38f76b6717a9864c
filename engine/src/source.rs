//! Sample sources and playback formats.

use crate::error::AudioError;

/// PCM sample depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDepth {
    /// Unsigned 8-bit
    Bits8,
    /// Signed 16-bit
    Bits16,
}

impl SampleDepth {
    pub const fn bits(self) -> u8 {
        match self {
            SampleDepth::Bits8 => 8,
            SampleDepth::Bits16 => 16,
        }
    }
}

impl TryFrom<u8> for SampleDepth {
    type Error = AudioError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(SampleDepth::Bits8),
            16 => Ok(SampleDepth::Bits16),
            _ => Err(AudioError::InvalidDepth),
        }
    }
}

/// Channel layout of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// One channel, duplicated to both DAC slots
    Mono,
    /// Interleaved left/right
    Stereo,
}

impl ChannelMode {
    /// Source samples per output frame.
    pub const fn samples_per_frame(self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo => 2,
        }
    }
}

/// Borrowed PCM data. Samples usually live in flash, hence `'static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// Unsigned 8-bit samples
    U8(&'static [u8]),
    /// Signed 16-bit samples
    S16(&'static [i16]),
    /// Signed 16-bit little-endian samples as raw bytes, e.g. from `include_bytes!`
    S16Le(&'static [u8]),
}

/// One undecoded source sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSample {
    U8(u8),
    S16(i16),
}

impl SampleSource {
    /// Wrap raw bytes of the given bit depth.
    pub fn from_raw(bytes: &'static [u8], depth: u8) -> Result<Self, AudioError> {
        match SampleDepth::try_from(depth)? {
            SampleDepth::Bits8 => Ok(SampleSource::U8(bytes)),
            SampleDepth::Bits16 if bytes.len() % 2 != 0 => Err(AudioError::InvalidLength),
            SampleDepth::Bits16 => Ok(SampleSource::S16Le(bytes)),
        }
    }

    pub const fn depth(&self) -> SampleDepth {
        match self {
            SampleSource::U8(_) => SampleDepth::Bits8,
            SampleSource::S16(_) | SampleSource::S16Le(_) => SampleDepth::Bits16,
        }
    }

    /// Number of samples (not bytes).
    pub const fn len(&self) -> usize {
        match self {
            SampleSource::U8(data) => data.len(),
            SampleSource::S16(data) => data.len(),
            SampleSource::S16Le(bytes) => bytes.len() / 2,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<RawSample> {
        match self {
            SampleSource::U8(data) => data.get(index).map(|&s| RawSample::U8(s)),
            SampleSource::S16(data) => data.get(index).map(|&s| RawSample::S16(s)),
            SampleSource::S16Le(bytes) => {
                let offset = index.checked_mul(2)?;
                let pair = bytes.get(offset..offset + 2)?;
                Some(RawSample::S16(i16::from_le_bytes([pair[0], pair[1]])))
            }
        }
    }
}
