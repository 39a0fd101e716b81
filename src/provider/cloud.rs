//! Google Cloud Text-to-Speech backend.
//!
//! Talks to the REST endpoint
//! (`https://texttospeech.googleapis.com/v1/text:synthesize`) with an API key
//! sent in the `X-Goog-Api-Key` header. The response carries the MP3 audio as
//! base64 in `audioContent`.
//!
//! ## Credentials
//!
//! The key is resolved at construction, not at call time, so a missing key is
//! a configuration error surfaced before any text is extracted or any API
//! call is made:
//!
//! 1. `credentials_path` from the config — a file whose contents are the key
//! 2. the `GOOGLE_TTS_API_KEY` environment variable
//!
//! ## Character limit
//!
//! The API rejects inputs over 5 000 characters; we chunk at 4 900 to leave
//! headroom for multi-byte counting differences on the server side.

use crate::config::VoiceOptions;
use crate::error::SpeechError;
use crate::pipeline::assemble::AudioFormat;
use crate::provider::SpeechProvider;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const CLOUD_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const CLOUD_MAX_CHARS: usize = 4_900;

/// Environment variable consulted when no credentials path is configured.
pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

pub struct CloudProvider {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: String,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl CloudProvider {
    /// Construct the provider, resolving and validating credentials.
    ///
    /// # Errors
    /// [`SpeechError::MissingCredentials`] when no API key can be found.
    pub fn new(
        credentials_path: Option<&Path>,
        api_timeout_secs: u64,
    ) -> Result<Self, SpeechError> {
        let api_key = resolve_api_key(credentials_path)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_timeout_secs))
            .build()
            .map_err(|e| SpeechError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, api_key })
    }

    /// Derive the BCP-47 language code for the API's `voice.languageCode`.
    ///
    /// Cloud voice names embed it ("en-US-Studio-O" → "en-US"); when the
    /// voice doesn't follow that pattern, fall back to the configured
    /// language.
    fn language_code(voice: &VoiceOptions) -> String {
        let mut parts = voice.voice.splitn(3, '-');
        match (parts.next(), parts.next()) {
            (Some(lang), Some(region))
                if lang.len() == 2 && region.len() == 2 && lang.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                format!("{lang}-{region}")
            }
            _ => voice.language.clone(),
        }
    }
}

fn resolve_api_key(credentials_path: Option<&Path>) -> Result<String, SpeechError> {
    if let Some(path) = credentials_path {
        let key = std::fs::read_to_string(path).map_err(|e| SpeechError::MissingCredentials {
            provider: "cloud".to_string(),
            hint: format!("Could not read credentials file '{}': {e}", path.display()),
        })?;
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(SpeechError::MissingCredentials {
                provider: "cloud".to_string(),
                hint: format!("Credentials file '{}' is empty", path.display()),
            });
        }
        return Ok(key);
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(SpeechError::MissingCredentials {
            provider: "cloud".to_string(),
            hint: format!(
                "Set {API_KEY_ENV} or pass --credentials <file> with a Google Cloud TTS API key."
            ),
        }),
    }
}

#[async_trait]
impl SpeechProvider for CloudProvider {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn max_chars(&self) -> usize {
        CLOUD_MAX_CHARS
    }

    fn audio_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceOptions,
    ) -> Result<Vec<u8>, SpeechError> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: Self::language_code(voice),
                name: &voice.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: voice.rate,
            },
        };

        let response = self
            .client
            .post(CLOUD_TTS_URL)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "cloud",
                detail: format!("request: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::ProviderCallFailed {
                provider: "cloud",
                detail: format!(
                    "HTTP {status}: {}",
                    body.chars().take(200).collect::<String>()
                ),
            });
        }

        let body: SynthesizeResponse =
            response
                .json()
                .await
                .map_err(|e| SpeechError::ProviderCallFailed {
                    provider: "cloud",
                    detail: format!("response body: {e}"),
                })?;

        let audio = BASE64
            .decode(body.audio_content.as_bytes())
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "cloud",
                detail: format!("audioContent is not valid base64: {e}"),
            })?;

        debug!("cloud TTS returned {} bytes of MP3", audio.len());
        Ok(audio)
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
    fn language_code_from_voice_name() {
        assert_eq!(
            CloudProvider::language_code(&voice("en-US-Studio-O", "fr")),
            "en-US"
        );
        assert_eq!(
            CloudProvider::language_code(&voice("de-DE-Neural2-C", "en")),
            "de-DE"
        );
    }

    #[test]
    fn language_code_falls_back_to_config() {
        assert_eq!(CloudProvider::language_code(&voice("karen", "en-AU")), "en-AU");
        assert_eq!(CloudProvider::language_code(&voice("", "en")), "en");
    }

    #[test]
    fn credentials_file_wins_over_env() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(f, "  AIzaTestKey123  ").unwrap();
        let key = resolve_api_key(Some(f.path())).unwrap();
        assert_eq!(key, "AIzaTestKey123");
    }

    #[test]
    fn empty_credentials_file_is_an_error() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_api_key(Some(f.path())).unwrap_err();
        assert!(matches!(err, SpeechError::MissingCredentials { .. }));
    }

    #[test]
    fn request_body_shape() {
        let request = SynthesizeRequest {
            input: SynthesisInput { text: "hello" },
            voice: VoiceSelection {
                language_code: "en-US".to_string(),
                name: "en-US-Studio-M",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 1.05,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"]["text"], "hello");
        assert_eq!(json["voice"]["languageCode"], "en-US");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
    }
}
