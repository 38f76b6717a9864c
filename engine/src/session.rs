//! State of one `play_sample` call.

use crate::hal::BufferHalf;
use crate::source::{ChannelMode, SampleSource};

/// Source position and end-of-data bookkeeping for the active sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSession {
    source: SampleSource,
    mode: ChannelMode,
    /// Next source sample to decode
    cursor: usize,
    /// One past the last sample that will be played
    end: usize,
    /// Half holding the last decoded sample, once decoded
    terminal: Option<BufferHalf>,
}

impl PlaybackSession {
    /// `length` must already be validated against the source.
    pub fn new(source: SampleSource, length: usize, mode: ChannelMode) -> Self {
        Self {
            source,
            mode,
            cursor: 0,
            end: length,
            terminal: None,
        }
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Samples still to be decoded.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.end
    }

    pub(crate) fn advance(&mut self, consumed: usize) {
        self.cursor = (self.cursor + consumed).min(self.end);
    }

    pub fn terminal(&self) -> Option<BufferHalf> {
        self.terminal
    }

    /// Record the half holding the final samples. The first call wins.
    pub(crate) fn mark_terminal(&mut self, half: BufferHalf) {
        if self.terminal.is_none() {
            self.terminal = Some(half);
        }
    }

    /// Bring the end forward so at most `fade_out` samples remain.
    pub(crate) fn truncate(&mut self, fade_out: usize) {
        self.end = self.end.min(self.cursor + fade_out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DATA: [i16; 3000] = [0; 3000];

    #[test]
    fn test_truncate_only_shortens() {
        let mut session = PlaybackSession::new(SampleSource::S16(&DATA), 3000, ChannelMode::Mono);
        session.advance(1000);
        session.truncate(500);
        assert_eq!(session.end(), 1500);
        session.truncate(5000);
        assert_eq!(session.end(), 1500);
        assert_eq!(session.remaining(), 500);
    }

    #[test]
    fn test_terminal_first_call_wins() {
        let mut session = PlaybackSession::new(SampleSource::S16(&DATA), 10, ChannelMode::Mono);
        session.advance(100);
        assert!(session.is_exhausted());
        assert_eq!(session.cursor(), 10);
        session.mark_terminal(BufferHalf::Second);
        session.mark_terminal(BufferHalf::First);
        assert_eq!(session.terminal(), Some(BufferHalf::Second));
    }
}
