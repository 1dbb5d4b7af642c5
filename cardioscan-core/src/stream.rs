//! # Chunk Streaming Module
//!
//! Splits a recording into a fixed number of growing prefixes so the display
//! can reveal it progressively, emulating real-time acquisition.

use serde::Serialize;

/// A prefix `[0, end)` of a `SignalBuffer` revealed at `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevealWindow {
    /// Zero-based step index.
    pub step: usize,
    /// Exclusive end index into the buffer.
    pub end: usize,
}

/// Finite iterator over the reveal windows of one scan.
///
/// Yields exactly `steps` windows. Step `i` exposes
/// `min((i + 1) * chunk, sample_count)` samples where
/// `chunk = sample_count / steps`; the last step always exposes the whole
/// buffer, whatever the rounding of `chunk`.
#[derive(Debug, Clone)]
pub struct ChunkStreamer {
    sample_count: usize,
    steps: usize,
    chunk_size: usize,
    next_step: usize,
}

/// Creates a fresh window sequence for a buffer of `sample_count` samples.
pub fn step_windows(sample_count: usize, steps: usize) -> ChunkStreamer {
    ChunkStreamer {
        sample_count,
        steps,
        chunk_size: if steps == 0 { 0 } else { sample_count / steps },
        next_step: 0,
    }
}

impl ChunkStreamer {
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Window for an arbitrary step, without advancing the sequence.
    pub fn window_at(&self, step: usize) -> Option<RevealWindow> {
        if step >= self.steps {
            return None;
        }
        let end = if step + 1 == self.steps {
            self.sample_count
        } else {
            ((step + 1) * self.chunk_size).min(self.sample_count)
        };
        Some(RevealWindow { step, end })
    }
}

impl Iterator for ChunkStreamer {
    type Item = RevealWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.window_at(self.next_step)?;
        self.next_step += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps.saturating_sub(self.next_step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkStreamer {}
