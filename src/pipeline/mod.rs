//! Pipeline stages for PDF-to-speech conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different extraction backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ synth ──▶ assemble
//! (URL/path) (pdf-extract) (segments) (provider)  (one stream)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]  — pull page-ordered text out of the PDF; runs in
//!    `spawn_blocking` because PDF parsing is CPU-bound
//! 3. [`chunk`]    — split the text into word-boundary segments under the
//!    provider's per-call character limit
//! 4. [`synth`]    — drive the provider call with timeout/retry/backoff; the
//!    only stage with external I/O
//! 5. [`assemble`] — reorder fragments by index and splice them into a single
//!    valid audio stream

pub mod assemble;
pub mod chunk;
pub mod extract;
pub mod input;
pub mod synth;
