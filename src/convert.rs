//! Eager (full-document) conversion entry points.
//!
//! The pipeline runs every stage to completion and returns the assembled
//! audio in memory. Segments are synthesized concurrently; a single fatal
//! segment failure aborts the run and cancels whatever is still in flight,
//! so a partial audiobook is never produced.

use crate::config::SynthesisConfig;
use crate::error::SpeechError;
use crate::output::{SynthesisOutput, SynthesisStats};
use crate::pipeline::{assemble, chunk, extract, input, synth};
use crate::provider::{create_provider, SpeechProvider};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL into one spoken-word audio stream.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// Extraction and configuration problems (missing file, missing credentials,
/// uninstalled offline engine) fail before any synthesis call is made. A
/// segment that fails after all retries aborts the whole run.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &SynthesisConfig,
) -> Result<SynthesisOutput, SpeechError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Build the provider ───────────────────────────────────────
    // First so that configuration errors (missing credentials, no offline
    // engine) surface before any download or extraction work is spent.
    let provider = create_provider(config)?;

    // ── Step 2: Resolve input ────────────────────────────────────────────
    let extract_start = Instant::now();
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 3: Extract and clean text ───────────────────────────────────
    let text = extract::extract_text(resolved.path()).await?;
    let text_chars = text.chars().count();
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!("Extracted {} chars in {}ms", text_chars, extract_duration_ms);

    // ── Step 4: Chunk under the provider's limit ─────────────────────────
    let chunk_limit = effective_chunk_limit(config, provider.as_ref());
    let segments = chunk::chunk(&text, chunk_limit)?;
    info!(
        "Split into {} segment(s) of ≤ {} chars for provider '{}'",
        segments.len(),
        chunk_limit,
        provider.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(segments.len());
    }

    // ── Step 5: Synthesize segments concurrently ─────────────────────────
    let synth_start = Instant::now();
    let expected = segments.len();
    let (fragments, total_retries) =
        synthesize_all(&provider, segments, config).await?;
    let synth_duration_ms = synth_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(expected, fragments.len());
    }

    // ── Step 6: Assemble into one stream ─────────────────────────────────
    let format = provider.audio_format();
    let audio = assemble::assemble(fragments, format, expected)?;

    let stats = SynthesisStats {
        text_chars,
        segments: expected,
        chunk_limit,
        total_retries,
        audio_bytes: audio.len(),
        provider: provider.name().to_string(),
        extract_duration_ms,
        synth_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} segments, {} audio bytes, {}ms total",
        stats.segments, stats.audio_bytes, stats.total_duration_ms
    );

    Ok(SynthesisOutput {
        audio,
        format,
        stats,
    })
}

/// Convert a PDF and write the audio directly to a file.
///
/// Uses atomic write (temp file in the target directory + rename) so a failed
/// or interrupted run never leaves a truncated audio file on disk. An
/// existing file at `output_path` is overwritten on success.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &SynthesisConfig,
) -> Result<SynthesisStats, SpeechError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SpeechError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", output.format.extension()));
    tokio::fs::write(&tmp_path, &output.audio)
        .await
        .map_err(|e| SpeechError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| SpeechError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} bytes to {}", output.audio.len(), path.display());
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &SynthesisConfig,
) -> Result<SynthesisOutput, SpeechError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SpeechError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_str, config))
}

/// Extract and clean a PDF's text without synthesizing anything.
///
/// Does not require a provider, credentials, or any network access beyond a
/// URL input's download (bounded by `download_timeout_secs`). Useful for
/// previewing what would be read aloud.
pub async fn extract_text(
    input_str: impl AsRef<str>,
    download_timeout_secs: u64,
) -> Result<String, SpeechError> {
    let resolved = input::resolve_input(input_str.as_ref(), download_timeout_secs).await?;
    extract::extract_text(resolved.path()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The per-segment limit actually used for chunking.
///
/// A configured override can only tighten the provider's own limit — a
/// looser one would just produce rejected synthesis calls.
fn effective_chunk_limit(config: &SynthesisConfig, provider: &dyn SpeechProvider) -> usize {
    match config.max_chunk_chars {
        Some(limit) => limit.min(provider.max_chars()),
        None => provider.max_chars(),
    }
}

/// Fan segments out over a bounded worker pool and collect the fragments.
///
/// Completion order is arbitrary; the assembler restores `index` order.
/// The first fatal segment error is returned immediately — dropping the
/// stream cancels every in-flight synthesis future.
async fn synthesize_all(
    provider: &Arc<dyn SpeechProvider>,
    segments: Vec<chunk::Segment>,
    config: &SynthesisConfig,
) -> Result<(Vec<assemble::AudioFragment>, u64), SpeechError> {
    let total = segments.len();
    let mut results = stream::iter(segments.into_iter().map(|segment| {
        let provider = Arc::clone(provider);
        let config = config.clone();
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_segment_start(segment.index, total);
            }
            let result = synth::synthesize_segment(&provider, &segment, &config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result {
                    Ok((fragment, _)) => {
                        cb.on_segment_complete(segment.index, total, fragment.bytes.len())
                    }
                    Err(e) => cb.on_segment_error(segment.index, total, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency);

    let mut fragments = Vec::with_capacity(total);
    let mut total_retries: u64 = 0;
    while let Some(result) = results.next().await {
        let (fragment, retries) = result?;
        total_retries += retries as u64;
        fragments.push(fragment);
    }
    debug!(
        "Synthesized {} fragments with {} total retries",
        fragments.len(),
        total_retries
    );
    Ok((fragments, total_retries))
}
