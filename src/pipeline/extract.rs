//! Text extraction: PDF bytes → cleaned, page-ordered text.
//!
//! Extraction is delegated to the `pdf-extract` crate; this module only owns
//! the cleanup that makes raw layout text readable aloud. PDF text comes out
//! with hard line breaks and hyphenation artefacts ("hy-\nphen") that a TTS
//! engine would dutifully pronounce, so three deterministic regex passes
//! repair them before the text reaches the chunker:
//!
//! 1. re-join words split across lines with a hyphen
//! 2. trim trailing spaces before newlines
//! 3. collapse runs of blank lines down to one
//!
//! `pdf-extract` is synchronous and CPU-bound, so it runs under
//! `spawn_blocking` to stay off the async executor's worker threads.

use crate::error::SpeechError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

static RE_HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\n(\w)").unwrap());
static RE_TRAILING_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Extract the PDF's text in reading order and clean it for narration.
///
/// # Errors
/// - [`SpeechError::ExtractionFailed`] if the PDF cannot be parsed
/// - [`SpeechError::NoExtractableText`] if parsing succeeds but yields no
///   text (typically a scanned, image-only document)
pub async fn extract_text(pdf_path: &Path) -> Result<String, SpeechError> {
    let path = pdf_path.to_path_buf();
    info!("Extracting text from {}", path.display());

    let raw = tokio::task::spawn_blocking({
        let path = path.clone();
        move || pdf_extract::extract_text(&path)
    })
    .await
    .map_err(|e| SpeechError::Internal(format!("extraction task panicked: {e}")))?
    .map_err(|e| SpeechError::ExtractionFailed {
        path: path.clone(),
        detail: e.to_string(),
    })?;

    let cleaned = clean_text(&raw);
    if cleaned.is_empty() {
        return Err(SpeechError::NoExtractableText { path });
    }

    debug!("Extracted {} chars of cleaned text", cleaned.chars().count());
    Ok(cleaned)
}

/// Apply the narration-cleanup passes to raw extracted text.
pub fn clean_text(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n");
    let s = RE_HYPHEN_BREAK.replace_all(&s, "$1");
    let s = RE_TRAILING_SPACE.replace_all(&s, "\n");
    let s = RE_BLANK_RUNS.replace_all(&s, "\n\n");
    s.trim().to_string()
}
