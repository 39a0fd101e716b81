//! Offline backend: local synthesis via the espeak-ng engine.
//!
//! Runs `espeak-ng` as a subprocess, feeding the segment text on stdin and
//! reading 16-bit PCM WAV from stdout (`--stdout`). Nothing leaves the host.
//!
//! The binary is probed at construction (`espeak-ng --version`) so a missing
//! installation is a configuration error raised before extraction begins —
//! not a cryptic spawn failure on segment 37. An unknown voice is reported by
//! espeak on stderr at synthesis time and surfaces with that stderr attached.
//!
//! Text goes over stdin rather than argv so segment size is not bounded by
//! the platform's argument-length limit.

use crate::config::VoiceOptions;
use crate::error::SpeechError;
use crate::pipeline::assemble::AudioFormat;
use crate::provider::SpeechProvider;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

const ESPEAK_BIN: &str = "espeak-ng";
const OFFLINE_MAX_CHARS: usize = 8_000;

/// espeak's default speaking speed in words per minute; `rate` scales it.
const BASE_WPM: f32 = 175.0;

pub struct OfflineProvider {
    _private: (),
}

impl OfflineProvider {
    /// Construct the provider, verifying the engine is runnable.
    ///
    /// # Errors
    /// [`SpeechError::OfflineEngineUnavailable`] when `espeak-ng` cannot be
    /// executed on this host.
    pub fn new() -> Result<Self, SpeechError> {
        let probe = std::process::Command::new(ESPEAK_BIN)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match probe {
            Ok(status) if status.success() => Ok(Self { _private: () }),
            Ok(status) => Err(SpeechError::OfflineEngineUnavailable {
                detail: format!("'{ESPEAK_BIN} --version' exited with {status}"),
            }),
            Err(e) => Err(SpeechError::OfflineEngineUnavailable {
                detail: format!("could not run '{ESPEAK_BIN}': {e}"),
            }),
        }
    }

    /// espeak voice identifier: the configured voice, or the language code
    /// when no voice was named.
    fn espeak_voice(voice: &VoiceOptions) -> String {
        if voice.voice.is_empty() {
            voice.language.to_lowercase()
        } else {
            voice.voice.to_lowercase()
        }
    }

    /// Map the rate multiplier onto espeak's words-per-minute scale.
    fn words_per_minute(rate: f32) -> u32 {
        (BASE_WPM * rate).round().clamp(80.0, 450.0) as u32
    }
}

/// espeak writes its WAV header before the audio and, on a pipe, cannot seek
/// back to fill in the RIFF and `data` chunk sizes — they come out as
/// placeholders far larger than the payload. Rewrite both from the byte count
/// actually captured so downstream decoders read the real sample count
/// instead of hitting a short read.
fn patch_wav_sizes(bytes: &mut [u8]) {
    if bytes.len() < 12 || &bytes[..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return;
    }
    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());

    // Walk the chunk list to "data"; earlier chunks (fmt) have known sizes
    // at write time and can be trusted.
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let is_data = &bytes[pos..pos + 4] == b"data";
        if is_data {
            let data_size = (bytes.len() - pos - 8) as u32;
            bytes[pos + 4..pos + 8].copy_from_slice(&data_size.to_le_bytes());
            return;
        }
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        pos += 8 + size + (size & 1);
    }
}

#[async_trait]
impl SpeechProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn max_chars(&self) -> usize {
        OFFLINE_MAX_CHARS
    }

    fn audio_format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceOptions,
    ) -> Result<Vec<u8>, SpeechError> {
        let mut child = Command::new(ESPEAK_BIN)
            .arg("-v")
            .arg(Self::espeak_voice(voice))
            .arg("-s")
            .arg(Self::words_per_minute(voice.rate).to_string())
            .arg("--stdout")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpeechError::OfflineEngineUnavailable {
                detail: format!("could not spawn '{ESPEAK_BIN}': {e}"),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpeechError::Internal("espeak stdin not captured".into()))?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "offline",
                detail: format!("espeak stdin write: {e}"),
            })?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SpeechError::ProviderCallFailed {
                provider: "offline",
                detail: format!("espeak wait: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::ProviderCallFailed {
                provider: "offline",
                detail: format!("espeak-ng exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let mut audio = output.stdout;
        patch_wav_sizes(&mut audio);
        debug!("espeak-ng produced {} bytes of WAV", audio.len());
        Ok(audio)
    }
}
