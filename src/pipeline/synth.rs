//! Synthesis: drive one provider call per segment with timeout and retry.
//!
//! This module is intentionally thin — which backend runs, and what its
//! limits are, lives behind [`SpeechProvider`]; this stage only owns the
//! failure policy around a call.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 responses and timeouts are transient and frequent under
//! concurrent load. Exponential backoff (`retry_backoff_ms * 2^attempt`)
//! avoids thundering-herd: with 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s, totalling < 4 s of back-off per segment. Once the
//! retries are exhausted the error is fatal for the whole run — the caller
//! aborts rather than shipping an audiobook with missing passages.

use crate::config::SynthesisConfig;
use crate::error::SpeechError;
use crate::pipeline::assemble::AudioFragment;
use crate::pipeline::chunk::Segment;
use crate::provider::SpeechProvider;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Synthesize one segment, retrying transient failures.
///
/// The attempt loop treats three things as a failed attempt: a provider
/// error, a per-call timeout, and an empty audio body (some endpoints return
/// 200 with nothing in it when throttling). Each records a human-readable
/// reason; the last one is carried in the final
/// [`SpeechError::SynthesisFailed`] if all attempts burn out.
pub async fn synthesize_segment(
    provider: &Arc<dyn SpeechProvider>,
    segment: &Segment,
    config: &SynthesisConfig,
) -> Result<(AudioFragment, u32), SpeechError> {
    let start = Instant::now();
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Segment {}: retry {}/{} after {}ms",
                segment.index, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.synthesize(&segment.text, &config.voice)).await {
            Err(_) => {
                warn!(
                    "Segment {}: attempt {} timed out after {}s",
                    segment.index,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(format!("timed out after {}s", config.api_timeout_secs));
            }
            Ok(Err(e)) => {
                let err_msg = e.to_string();
                warn!(
                    "Segment {}: attempt {} failed — {}",
                    segment.index,
                    attempt + 1,
                    err_msg
                );
                last_err = Some(err_msg);
            }
            Ok(Ok(bytes)) if bytes.is_empty() => {
                warn!(
                    "Segment {}: attempt {} returned empty audio",
                    segment.index,
                    attempt + 1
                );
                last_err = Some("provider returned empty audio".to_string());
            }
            Ok(Ok(bytes)) => {
                debug!(
                    "Segment {}: {} chars → {} audio bytes in {:?}",
                    segment.index,
                    segment.char_len(),
                    bytes.len(),
                    start.elapsed()
                );
                return Ok((
                    AudioFragment {
                        index: segment.index,
                        bytes,
                    },
                    attempt,
                ));
            }
        }
    }

    Err(SpeechError::SynthesisFailed {
        segment: segment.index,
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoiceOptions;
    use crate::pipeline::assemble::AudioFormat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times, then succeeds.
    struct FlakyProvider {
        calls: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl SpeechProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn max_chars(&self) -> usize {
            1000
        }
        fn audio_format(&self) -> AudioFormat {
            AudioFormat::Mp3
        }
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &VoiceOptions,
        ) -> Result<Vec<u8>, SpeechError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SpeechError::Internal("transient".into()))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    fn segment(index: usize) -> Segment {
        Segment {
            index,
            text: "hello world".to_string(),
        }
    }

    fn config(max_retries: u32) -> SynthesisConfig {
        SynthesisConfig::builder()
            .max_retries(max_retries)
            .retry_backoff_ms(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let provider: Arc<dyn SpeechProvider> = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            failures: 2,
        });
        let (fragment, retries) = synthesize_segment(&provider, &segment(5), &config(3))
            .await
            .unwrap();
        assert_eq!(fragment.index, 5);
        assert_eq!(fragment.bytes, vec![1, 2, 3]);
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal() {
        let provider: Arc<dyn SpeechProvider> = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            failures: 10,
        });
        let err = synthesize_segment(&provider, &segment(2), &config(2))
            .await
            .unwrap_err();
        match err {
            SpeechError::SynthesisFailed {
                segment, retries, ..
            } => {
                assert_eq!(segment, 2);
                assert_eq!(retries, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_call_is_retried() {
        /// First call hangs past the per-call timeout; later calls succeed.
        struct SlowFirstCall {
            calls: AtomicU32,
        }

        #[async_trait]
        impl SpeechProvider for SlowFirstCall {
            fn name(&self) -> &'static str {
                "slow-first"
            }
            fn max_chars(&self) -> usize {
                1000
            }
            fn audio_format(&self) -> AudioFormat {
                AudioFormat::Mp3
            }
            async fn synthesize(
                &self,
                _text: &str,
                _voice: &VoiceOptions,
            ) -> Result<Vec<u8>, SpeechError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    sleep(Duration::from_secs(3600)).await;
                }
                Ok(vec![7, 7])
            }
        }

        let provider: Arc<dyn SpeechProvider> = Arc::new(SlowFirstCall {
            calls: AtomicU32::new(0),
        });
        let config = SynthesisConfig::builder()
            .max_retries(2)
            .retry_backoff_ms(1)
            .api_timeout_secs(1)
            .build()
            .unwrap();

        let (fragment, retries) = synthesize_segment(&provider, &segment(3), &config)
            .await
            .unwrap();
        assert_eq!(fragment.bytes, vec![7, 7]);
        assert_eq!(retries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_timeouts_report_the_timeout() {
        struct NeverFinishes;

        #[async_trait]
        impl SpeechProvider for NeverFinishes {
            fn name(&self) -> &'static str {
                "hung"
            }
            fn max_chars(&self) -> usize {
                1000
            }
            fn audio_format(&self) -> AudioFormat {
                AudioFormat::Mp3
            }
            async fn synthesize(
                &self,
                _text: &str,
                _voice: &VoiceOptions,
            ) -> Result<Vec<u8>, SpeechError> {
                sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }

        let provider: Arc<dyn SpeechProvider> = Arc::new(NeverFinishes);
        let config = SynthesisConfig::builder()
            .max_retries(1)
            .retry_backoff_ms(1)
            .api_timeout_secs(1)
            .build()
            .unwrap();

        let err = synthesize_segment(&provider, &segment(0), &config)
            .await
            .unwrap_err();
        match err {
            SpeechError::SynthesisFailed { detail, .. } => {
                assert!(detail.contains("timed out"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_audio_counts_as_failure() {
        struct EmptyProvider;

        #[async_trait]
        impl SpeechProvider for EmptyProvider {
            fn name(&self) -> &'static str {
                "empty"
            }
            fn max_chars(&self) -> usize {
                1000
            }
            fn audio_format(&self) -> AudioFormat {
                AudioFormat::Mp3
            }
            async fn synthesize(
                &self,
                _text: &str,
                _voice: &VoiceOptions,
            ) -> Result<Vec<u8>, SpeechError> {
                Ok(Vec::new())
            }
        }

        let provider: Arc<dyn SpeechProvider> = Arc::new(EmptyProvider);
        let err = synthesize_segment(&provider, &segment(0), &config(1))
            .await
            .unwrap_err();
        match err {
            SpeechError::SynthesisFailed { detail, .. } => {
                assert!(detail.contains("empty audio"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
