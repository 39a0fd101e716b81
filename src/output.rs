//! Output types: the assembled audio plus run statistics.

use crate::pipeline::assemble::AudioFormat;
use serde::{Deserialize, Serialize};

/// The result of a successful conversion.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// The assembled audio, one contiguous stream in `format`.
    pub audio: Vec<u8>,
    /// Encoding of `audio` — MP3 for the network backends, WAV for offline.
    pub format: AudioFormat,
    /// Timing and size statistics for the run.
    pub stats: SynthesisStats,
}

/// Statistics for one conversion run.
///
/// Serialisable so the CLI can emit them as JSON (`--json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisStats {
    /// Characters of cleaned text extracted from the PDF.
    pub text_chars: usize,
    /// Number of segments the text was split into.
    pub segments: usize,
    /// Effective per-segment character limit used for chunking.
    pub chunk_limit: usize,
    /// Total retries spent across all segments.
    pub total_retries: u64,
    /// Size of the assembled audio in bytes.
    pub audio_bytes: usize,
    /// Provider that produced the audio.
    pub provider: String,
    /// Wall-clock time resolving + extracting the input, in milliseconds.
    pub extract_duration_ms: u64,
    /// Wall-clock time in the synthesis stage, in milliseconds.
    pub synth_duration_ms: u64,
    /// End-to-end wall-clock time, in milliseconds.
    pub total_duration_ms: u64,
}
