//! Error types for the pdf2speech library.
//!
//! A single [`SpeechError`] enum covers every failure mode, grouped by the
//! pipeline stage that produces it. The grouping matters for callers:
//!
//! * **Input / extraction / configuration** errors happen before any
//!   synthesis call is made — bailing out is free.
//! * **Synthesis** errors are only surfaced after per-segment retries are
//!   exhausted; at that point the whole run is aborted rather than emitting a
//!   silently-incomplete audio file.
//! * **Assembly** errors mean an internal invariant broke (a fragment missing
//!   or undecodable despite a successful synthesis call) and are worded as
//!   internal-consistency failures rather than user mistakes.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2speech library.
#[derive(Debug, Error)]
pub enum SpeechError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF could not be parsed for text.
    #[error("Failed to extract text from '{path}': {detail}\nThe file may be corrupt or image-only (scanned).")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// The PDF parsed fine but contains no text at all.
    #[error("No extractable text found in '{path}'\nScanned PDFs need OCR before they can be read aloud.")]
    NoExtractableText { path: PathBuf },

    // ── Configuration errors ──────────────────────────────────────────────
    /// `--provider` value is not one of the known backends.
    #[error("Unknown provider '{name}'\nSupported: cloud, free, offline")]
    UnknownProvider { name: String },

    /// The cloud provider needs credentials and none were found.
    #[error("Speech provider '{provider}' is not configured.\n{hint}")]
    MissingCredentials { provider: String, hint: String },

    /// Speaking rate outside the accepted range.
    #[error("Invalid speaking rate {rate}: must be between 0.25 and 4.0")]
    InvalidRate { rate: f32 },

    /// The offline synthesis engine is not installed or not runnable.
    #[error("Offline speech engine unavailable: {detail}\nInstall espeak-ng (e.g. apt install espeak-ng / brew install espeak-ng).")]
    OfflineEngineUnavailable { detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Chunking errors ───────────────────────────────────────────────────
    /// The per-segment character limit must be positive.
    #[error("Invalid chunk limit {limit}: must be at least 1 character")]
    InvalidChunkLimit { limit: usize },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// One provider call failed (HTTP status, network, or engine error).
    ///
    /// Retryable: the synthesis stage only surfaces it to the caller wrapped
    /// in [`SpeechError::SynthesisFailed`] once the retries are exhausted.
    #[error("{provider} synthesis call failed: {detail}")]
    ProviderCallFailed {
        provider: &'static str,
        detail: String,
    },

    /// A segment failed synthesis after all retries; the run is aborted.
    #[error("Synthesis failed for segment {segment} after {retries} retries: {detail}")]
    SynthesisFailed {
        segment: usize,
        retries: u32,
        detail: String,
    },

    // ── Assembly errors (internal consistency) ────────────────────────────
    /// A fragment index is missing from the assembly input.
    #[error("Internal consistency failure: audio fragment {index} missing (expected {expected} fragments)")]
    MissingFragment { index: usize, expected: usize },

    /// A fragment's audio bytes could not be decoded.
    #[error("Internal consistency failure: audio fragment {index} is malformed: {detail}")]
    MalformedFragment { index: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output audio file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
