//! # pdf2speech
//!
//! Turn a PDF document into a single spoken-word audio file.
//!
//! ## Why this crate?
//!
//! Listening to a paper or a book is a one-liner until the text outgrows a
//! single TTS request: every backend caps its per-call input, long documents
//! need hundreds of calls, and stitching the resulting audio back together
//! naively corrupts most encoded formats. This crate owns that plumbing —
//! provider-safe chunking at word boundaries, concurrent synthesis with
//! retry/backoff, and format-aware concatenation into one valid stream.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   page-ordered text via pdf-extract, hyphenation repaired
//!  ├─ 3. Chunk     word-boundary segments under the provider's char limit
//!  ├─ 4. Synthesize concurrent provider calls (cloud / free / offline)
//!  ├─ 5. Assemble  reorder by segment index, splice into one audio stream
//!  └─ 6. Output    atomic write (temp file + rename)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2speech::{convert_to_file, ProviderKind, SynthesisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Cloud provider reads its API key from GOOGLE_TTS_API_KEY.
//!     let config = SynthesisConfig::builder()
//!         .voice("en-US-Studio-O")
//!         .rate(1.05)
//!         .build()?;
//!     let stats = convert_to_file("my-book.pdf", "my-book.mp3", &config).await?;
//!     eprintln!("{} segments, {} bytes", stats.segments, stats.audio_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Choosing a Provider
//!
//! | Provider  | Quality | Needs              | Per-call limit | Output |
//! |-----------|---------|--------------------|----------------|--------|
//! | `cloud`   | ★★★★★  | Google TTS API key | 4 900 chars    | MP3    |
//! | `free`    | ★★      | Internet only      | 200 chars      | MP3    |
//! | `offline` | ★★      | espeak-ng installed| 8 000 chars    | WAV    |
//!
//! Selection is explicit — there is no silent fallback between providers.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2speech` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2speech = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod provider;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProviderKind, SynthesisConfig, SynthesisConfigBuilder, VoiceOptions};
pub use convert::{convert, convert_sync, convert_to_file, extract_text};
pub use error::SpeechError;
pub use output::{SynthesisOutput, SynthesisStats};
pub use pipeline::assemble::{AudioFormat, AudioFragment};
pub use pipeline::chunk::Segment;
pub use progress::{NoopProgressCallback, ProgressCallback, SynthesisProgressCallback};
pub use provider::{CloudProvider, FreeProvider, OfflineProvider, SpeechProvider};
