//! The speech-provider abstraction and its concrete backends.
//!
//! Callers depend only on the [`SpeechProvider`] trait; which backend sits
//! behind it is decided once, at startup, by [`create_provider`]. The chunker
//! reads `max_chars()` *before* splitting the text, so each backend's
//! per-call limit is part of its public contract rather than a constant
//! buried in calling code.
//!
//! There is deliberately no automatic fallback between backends: if the cloud
//! provider is misconfigured the run fails with a configuration error instead
//! of silently producing lower-quality audio with the free one.

mod cloud;
mod free;
mod offline;

pub use cloud::CloudProvider;
pub use free::FreeProvider;
pub use offline::OfflineProvider;

use crate::config::{ProviderKind, SynthesisConfig, VoiceOptions};
use crate::error::SpeechError;
use crate::pipeline::assemble::AudioFormat;
use async_trait::async_trait;
use std::sync::Arc;

/// A text-to-speech backend.
///
/// One synthesis call turns one segment of text into one encoded audio
/// fragment. Every fragment a provider returns within a run uses the same
/// encoding, declared by [`audio_format`](SpeechProvider::audio_format), so
/// the assembler can splice them.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Short backend name for logs and error messages.
    fn name(&self) -> &'static str;

    /// The largest text, in characters, one synthesis call may carry.
    ///
    /// The chunker respects this limit; it must be queryable before any
    /// synthesis call is made.
    fn max_chars(&self) -> usize;

    /// Encoding of the audio bytes this backend returns.
    fn audio_format(&self) -> AudioFormat;

    /// Synthesize one segment of text into encoded audio bytes.
    ///
    /// A single blocking external interaction — network call or local engine.
    /// Retry policy lives in the caller ([`crate::pipeline::synth`]), not here.
    async fn synthesize(&self, text: &str, voice: &VoiceOptions)
        -> Result<Vec<u8>, SpeechError>;
}

/// Build the provider the configuration asks for.
///
/// Resolution order, most-specific first (mirrors how the config is meant to
/// be used):
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed and
///    configured the backend entirely; we use it as-is. This is the injection
///    point for tests and for custom middleware.
/// 2. **`config.provider_kind`** — construct the named backend. Construction
///    validates its environment (cloud credentials present, offline engine
///    installed) so configuration errors surface *before* extraction or any
///    synthesis call.
pub fn create_provider(config: &SynthesisConfig) -> Result<Arc<dyn SpeechProvider>, SpeechError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    match config.provider_kind {
        ProviderKind::Cloud => Ok(Arc::new(CloudProvider::new(
            config.credentials_path.as_deref(),
            config.api_timeout_secs,
        )?)),
        ProviderKind::Free => Ok(Arc::new(FreeProvider::new(config.api_timeout_secs)?)),
        ProviderKind::Offline => Ok(Arc::new(OfflineProvider::new()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl SpeechProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn max_chars(&self) -> usize {
            42
        }
        fn audio_format(&self) -> AudioFormat {
            AudioFormat::Wav
        }
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &VoiceOptions,
        ) -> Result<Vec<u8>, SpeechError> {
            Ok(vec![0u8; 4])
        }
    }

    #[test]
    fn prebuilt_provider_takes_precedence() {
        let config = SynthesisConfig::builder()
            .provider_kind(ProviderKind::Cloud)
            .provider(Arc::new(FixedProvider))
            .build()
            .unwrap();
        // Would fail with MissingCredentials if the kind were consulted.
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "fixed");
        assert_eq!(provider.max_chars(), 42);
    }
}
