//! Configuration types for PDF-to-speech conversion.
//!
//! All conversion behaviour is controlled through [`SynthesisConfig`], built
//! via its [`SynthesisConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest. Validation (rate range, concurrency
//! floor) happens once, in `build()`, so the rest of the pipeline can trust
//! the values.

use crate::error::SpeechError;
use crate::progress::ProgressCallback;
use crate::provider::SpeechProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Which text-to-speech backend to use.
///
/// Selection is always explicit — there is no automatic fallback from one
/// backend to another on failure. A run either succeeds with the backend the
/// caller asked for or fails with a clear error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Cloud Text-to-Speech (neural voices, needs an API key). (default)
    #[default]
    Cloud,
    /// Google Translate's public TTS endpoint. No credentials, lower quality,
    /// much smaller per-request character limit.
    Free,
    /// Local synthesis via the espeak-ng engine. No network at all.
    Offline,
}

impl ProviderKind {
    /// Lower-case name as used on the CLI and in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Cloud => "cloud",
            ProviderKind::Free => "free",
            ProviderKind::Offline => "offline",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cloud" | "google" => Ok(ProviderKind::Cloud),
            "free" | "gtts" => Ok(ProviderKind::Free),
            "offline" | "espeak" => Ok(ProviderKind::Offline),
            other => Err(SpeechError::UnknownProvider {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice parameters shared by every synthesis call in a run.
///
/// Supplied once, read-only thereafter. Each backend interprets the fields
/// according to its own conventions (see the provider modules).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceOptions {
    /// Voice identifier, provider-specific (e.g. "en-US-Studio-M" for cloud,
    /// "en-us" for espeak-ng).
    pub voice: String,
    /// BCP-47-ish language code used when the voice name doesn't imply one.
    pub language: String,
    /// Speaking-rate multiplier; 1.0 is normal speed. Valid range 0.25–4.0.
    pub rate: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            voice: "en-US-Studio-M".to_string(),
            language: "en".to_string(),
            rate: 1.0,
        }
    }
}

/// Configuration for a PDF-to-speech conversion.
///
/// Built via [`SynthesisConfig::builder()`] or [`SynthesisConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2speech::{ProviderKind, SynthesisConfig};
///
/// let config = SynthesisConfig::builder()
///     .provider_kind(ProviderKind::Free)
///     .voice("en")
///     .rate(1.05)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SynthesisConfig {
    /// Which backend to synthesize with. Default: [`ProviderKind::Cloud`].
    pub provider_kind: ProviderKind,

    /// Pre-constructed provider. Takes precedence over `provider_kind`.
    ///
    /// The injection point for tests and for callers that need custom
    /// middleware (caching, rate limiting) around a backend.
    pub provider: Option<Arc<dyn SpeechProvider>>,

    /// Voice parameters shared across all segments.
    pub voice: VoiceOptions,

    /// Override for the per-segment character limit. Default: None.
    ///
    /// The effective limit is always capped at the provider's own
    /// `max_chars()` — a larger override would just produce rejected API
    /// calls. Useful for forcing small segments in tests or for providers
    /// whose published limit turns out optimistic in practice.
    pub max_chunk_chars: Option<usize>,

    /// Number of concurrent synthesis calls. Default: 4.
    ///
    /// Synthesis calls are network-bound (or a separate process for the
    /// offline backend), so a handful in flight cuts wall-clock time roughly
    /// linearly. Raise it if the provider tolerates the load; lower it on
    /// rate-limit errors.
    pub concurrency: usize,

    /// Maximum retry attempts per segment on a synthesis failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent failures burn
    /// through the retries quickly and then abort the whole run — a partial
    /// audiobook is worse than an explicit failure.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s, so concurrent workers
    /// don't re-hammer a recovering endpoint in lockstep.
    pub retry_backoff_ms: u64,

    /// Per-synthesis-call timeout in seconds. Default: 60.
    ///
    /// Provider calls are network-bound and must not hang indefinitely.
    /// A timed-out call counts as a failed attempt and is retried.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Path to a file holding the cloud API key. Default: None.
    ///
    /// When unset, the cloud provider falls back to the `GOOGLE_TTS_API_KEY`
    /// environment variable. Ignored by the free and offline backends.
    pub credentials_path: Option<PathBuf>,

    /// Per-segment progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider_kind: ProviderKind::default(),
            provider: None,
            voice: VoiceOptions::default(),
            max_chunk_chars: None,
            concurrency: 4,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            credentials_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("provider_kind", &self.provider_kind)
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("voice", &self.voice)
            .field("max_chunk_chars", &self.max_chunk_chars)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

impl SynthesisConfig {
    /// Create a new builder for `SynthesisConfig`.
    pub fn builder() -> SynthesisConfigBuilder {
        SynthesisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SynthesisConfig`].
pub struct SynthesisConfigBuilder {
    config: SynthesisConfig,
}

impl SynthesisConfigBuilder {
    pub fn provider_kind(mut self, kind: ProviderKind) -> Self {
        self.config.provider_kind = kind;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn SpeechProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice.voice = voice.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.voice.language = language.into();
        self
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.config.voice.rate = rate;
        self
    }

    pub fn max_chunk_chars(mut self, limit: usize) -> Self {
        self.config.max_chunk_chars = Some(limit);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credentials_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SynthesisConfig, SpeechError> {
        let c = &self.config;
        if !(0.25..=4.0).contains(&c.voice.rate) || !c.voice.rate.is_finite() {
            return Err(SpeechError::InvalidRate { rate: c.voice.rate });
        }
        if c.concurrency == 0 {
            return Err(SpeechError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_chunk_chars == Some(0) {
            return Err(SpeechError::InvalidChunkLimit { limit: 0 });
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SynthesisConfig::builder().build().unwrap();
        assert_eq!(config.provider_kind, ProviderKind::Cloud);
        assert_eq!(config.voice.voice, "en-US-Studio-M");
        assert_eq!(config.voice.rate, 1.0);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn rate_out_of_range_rejected() {
        let err = SynthesisConfig::builder().rate(5.0).build().unwrap_err();
        assert!(matches!(err, SpeechError::InvalidRate { .. }));

        let err = SynthesisConfig::builder().rate(0.1).build().unwrap_err();
        assert!(matches!(err, SpeechError::InvalidRate { .. }));
    }

    #[test]
    fn zero_chunk_limit_rejected() {
        let err = SynthesisConfig::builder()
            .max_chunk_chars(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SpeechError::InvalidChunkLimit { limit: 0 }));
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let config = SynthesisConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn provider_kind_from_str() {
        assert_eq!("cloud".parse::<ProviderKind>().unwrap(), ProviderKind::Cloud);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Cloud);
        assert_eq!("FREE".parse::<ProviderKind>().unwrap(), ProviderKind::Free);
        assert_eq!("gtts".parse::<ProviderKind>().unwrap(), ProviderKind::Free);
        assert_eq!(
            "offline".parse::<ProviderKind>().unwrap(),
            ProviderKind::Offline
        );
        assert!(matches!(
            "azure".parse::<ProviderKind>(),
            Err(SpeechError::UnknownProvider { .. })
        ));
    }
}
