//! Progress-callback trait for per-segment synthesis events.
//!
//! Inject an [`Arc<dyn SynthesisProgressCallback>`] via
//! [`crate::config::SynthesisConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline synthesizes each segment.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a database record, or a terminal progress bar
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so it works correctly when
//! segments are synthesized concurrently.

use std::sync::Arc;

/// Called by the conversion pipeline as it synthesizes each segment.
///
/// Segments are processed concurrently, so `on_segment_start` and
/// `on_segment_complete` may be called from different tasks in any order.
/// Implementations must protect shared mutable state accordingly. All methods
/// have default no-op implementations so callers only override what they care
/// about.
pub trait SynthesisProgressCallback: Send + Sync {
    /// Called once after chunking, before any synthesis call.
    fn on_run_start(&self, total_segments: usize) {
        let _ = total_segments;
    }

    /// Called just before a segment's synthesis request is issued.
    fn on_segment_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a segment's audio fragment has been produced.
    ///
    /// `audio_len` is the byte length of the fragment.
    fn on_segment_complete(&self, index: usize, total: usize, audio_len: usize) {
        let _ = (index, total, audio_len);
    }

    /// Called when a segment fails after all retries are exhausted.
    ///
    /// The run aborts after this event; no further segments complete.
    fn on_segment_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after the last segment, before assembly.
    fn on_run_complete(&self, total_segments: usize, success_count: usize) {
        let _ = (total_segments, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SynthesisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SynthesisConfig`].
pub type ProgressCallback = Arc<dyn SynthesisProgressCallback>;
