//! Free backend: Google Translate's public TTS endpoint.
//!
//! The same endpoint the gTTS tooling uses. No credentials, but lower
//! perceptual quality than the cloud voices and a much smaller per-request
//! limit — the endpoint starts rejecting or truncating inputs well before the
//! cloud API's 5 000 characters, so we chunk at 200.
//!
//! Speaking rate is only approximated here: the endpoint knows a single
//! "slow" flag, nothing finer. Rates below 0.75 map to slow, everything else
//! to normal; the approximation is logged at debug level so it never
//! surprises silently.

use crate::config::VoiceOptions;
use crate::error::SpeechError;
use crate::pipeline::assemble::AudioFormat;
use crate::provider::SpeechProvider;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const FREE_TTS_URL: &str = "https://translate.google.com/translate_tts";
const FREE_MAX_CHARS: usize = 200;

/// Speed value the endpoint understands for its "slow" mode.
const SLOW_SPEED: &str = "0.24";

pub struct FreeProvider {
    client: reqwest::Client,
}

impl FreeProvider {
    pub fn new(api_timeout_secs: u64) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_timeout_secs))
            .build()
            .map_err(|e| SpeechError::Internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// The endpoint wants a bare language code ("en"), not a full voice name.
    /// Accept either: "en-US-Studio-M" and "en-US" both map to "en".
    fn language_tag(voice: &VoiceOptions) -> String {
        let source = if voice.voice.is_empty() {
            &voice.language
        } else {
            &voice.voice
        };
        source
            .split('-')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("en")
            .to_lowercase()
    }
}

#[async_trait]
impl SpeechProvider for FreeProvider {
    fn name(&self) -> &'static str {
        "free"
    }

    fn max_chars(&self) -> usize {
        FREE_MAX_CHARS
    }

    fn audio_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceOptions,
    ) -> Result<Vec<u8>, SpeechError> {
        let lang = Self::language_tag(voice);

        let mut query: Vec<(&str, String)> = vec![
            ("ie", "UTF-8".to_string()),
            ("client", "tw-ob".to_string()),
            ("tl", lang),
            ("q", text.to_string()),
        ];
        if voice.rate < 0.75 {
            debug!(
                "free TTS approximates rate {} with its slow mode",
                voice.rate
            );
            query.push(("ttsspeed", SLOW_SPEED.to_string()));
        } else if (voice.rate - 1.0).abs() > f32::EPSILON {
            debug!("free TTS cannot honour rate {}; using normal speed", voice.rate);
        }

        let response = self
            .client
            .get(FREE_TTS_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "free",
                detail: format!("request: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::ProviderCallFailed {
                provider: "free",
                detail: format!(
                    "HTTP {status} (the endpoint throttles heavy use; retry later or lower --concurrency)"
                ),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("audio/") {
            return Err(SpeechError::ProviderCallFailed {
                provider: "free",
                detail: format!(
                    "returned '{content_type}' instead of audio (likely a block page)"
                ),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "free",
                detail: format!("response body: {e}"),
            })?;

        debug!("free TTS returned {} bytes of MP3", audio.len());
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, language: &str) -> VoiceOptions {
        VoiceOptions {
            voice: name.to_string(),
            language: language.to_string(),
            rate: 1.0,
        }
    }

    #[test]
    fn language_tag_strips_region_and_voice() {
        assert_eq!(FreeProvider::language_tag(&voice("en-US-Studio-M", "fr")), "en");
        assert_eq!(FreeProvider::language_tag(&voice("de-DE", "en")), "de");
        assert_eq!(FreeProvider::language_tag(&voice("ja", "en")), "ja");
    }

    #[test]
    fn language_tag_falls_back_to_language() {
        assert_eq!(FreeProvider::language_tag(&voice("", "pt-BR")), "pt");
        assert_eq!(FreeProvider::language_tag(&voice("", "")), "en");
    }

    #[test]
    fn limit_is_modest() {
        let p = FreeProvider::new(10).unwrap();
        assert!(p.max_chars() <= 250);
        assert_eq!(p.name(), "free");
    }
}
