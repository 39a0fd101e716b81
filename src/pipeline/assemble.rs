//! Assembly: splice ordered audio fragments into one valid stream.
//!
//! Fragments arrive in synthesis-completion order, which under concurrency is
//! not text order; the `index` tag restores ordering here. Concatenation is
//! format-aware because naive byte concatenation of encoded containers
//! produces corrupt output:
//!
//! * **MP3** — an MP3 stream is a sequence of self-contained frames, so two
//!   streams splice correctly at frame granularity. Each fragment is walked
//!   frame by frame (skipping ID3v2 headers and ID3v1 trailers) and only the
//!   frames are emitted. Anything that doesn't parse as a frame is a
//!   malformed fragment, not something to pass through.
//! * **WAV** — a RIFF container holds one header; appending whole files would
//!   bury stale headers mid-stream. Fragments are decoded with `hound`,
//!   required to share a spec, and re-encoded once behind a single header.
//!
//! Output is deterministic in the `(index, bytes)` pairs — arrival order
//! never changes a byte of it.

use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Encoding of the audio a provider returns, and therefore of the assembled
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// Conventional file extension for this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// The encoded audio produced for one segment.
#[derive(Debug, Clone)]
pub struct AudioFragment {
    /// Index of the originating segment; assembly order follows this.
    pub index: usize,
    /// Encoded audio bytes in the provider's declared format.
    pub bytes: Vec<u8>,
}

/// Concatenate `fragments` into one audio stream in `format`.
///
/// `expected` is the segment count from the chunker; the fragments must carry
/// exactly the indices `0..expected`, in any order.
///
/// # Errors
/// - [`SpeechError::MissingFragment`] on a count mismatch or index gap
/// - [`SpeechError::MalformedFragment`] when a fragment fails to decode
pub fn assemble(
    mut fragments: Vec<AudioFragment>,
    format: AudioFormat,
    expected: usize,
) -> Result<Vec<u8>, SpeechError> {
    if expected == 0 {
        return Err(SpeechError::Internal(
            "assembly called with zero expected fragments".into(),
        ));
    }

    fragments.sort_by_key(|f| f.index);
    for (i, fragment) in fragments.iter().enumerate() {
        if fragment.index != i {
            return Err(SpeechError::MissingFragment { index: i, expected });
        }
    }
    if fragments.len() != expected {
        return Err(SpeechError::MissingFragment {
            index: fragments.len(),
            expected,
        });
    }

    let out = match format {
        AudioFormat::Mp3 => assemble_mp3(&fragments)?,
        AudioFormat::Wav => assemble_wav(&fragments)?,
    };
    debug!(
        "Assembled {} fragments into {} bytes of {:?}",
        fragments.len(),
        out.len(),
        format
    );
    Ok(out)
}

// ── MP3 ──────────────────────────────────────────────────────────────────

/// Bitrates in kbit/s, indexed by the header's 4-bit bitrate field.
/// Index 0 ("free format") and 15 are invalid for our purposes.
const BITRATES_V1_L3: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const BITRATES_V2_L3: [u32; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

/// Sample rates in Hz, indexed by the header's 2-bit field, per MPEG version.
const SAMPLE_RATES_V1: [u32; 3] = [44_100, 48_000, 32_000];
const SAMPLE_RATES_V2: [u32; 3] = [22_050, 24_000, 16_000];
const SAMPLE_RATES_V25: [u32; 3] = [11_025, 12_000, 8_000];

fn assemble_mp3(fragments: &[AudioFragment]) -> Result<Vec<u8>, SpeechError> {
    let total: usize = fragments.iter().map(|f| f.bytes.len()).sum();
    let mut out = Vec::with_capacity(total);
    for fragment in fragments {
        append_mp3_frames(fragment, &mut out)?;
    }
    Ok(out)
}

/// Walk one fragment's MPEG audio frames, copying them into `out`.
fn append_mp3_frames(fragment: &AudioFragment, out: &mut Vec<u8>) -> Result<(), SpeechError> {
    let bytes = &fragment.bytes;
    let malformed = |detail: String| SpeechError::MalformedFragment {
        index: fragment.index,
        detail,
    };

    let mut pos = skip_id3v2(bytes);
    let mut frames = 0usize;

    while pos < bytes.len() {
        let remaining = bytes.len() - pos;

        // ID3v1 trailer: exactly 128 bytes starting with "TAG".
        if remaining == 128 && bytes[pos..].starts_with(b"TAG") {
            break;
        }
        if remaining < 4 {
            return Err(malformed(format!(
                "{remaining} trailing bytes after frame {frames} are not a frame header"
            )));
        }

        let len = frame_length(&bytes[pos..pos + 4])
            .map_err(|detail| malformed(format!("frame {frames} at offset {pos}: {detail}")))?;
        if pos + len > bytes.len() {
            return Err(malformed(format!(
                "frame {frames} at offset {pos} claims {len} bytes but only {remaining} remain"
            )));
        }

        out.extend_from_slice(&bytes[pos..pos + len]);
        pos += len;
        frames += 1;
    }

    if frames == 0 {
        return Err(malformed("no MPEG audio frames found".into()));
    }
    Ok(())
}

/// Length of the ID3v2 block at the start of `bytes`, or 0 if there is none.
fn skip_id3v2(bytes: &[u8]) -> usize {
    if bytes.len() < 10 || &bytes[..3] != b"ID3" {
        return 0;
    }
    // Tag size is a 28-bit syncsafe integer; the 10-byte header is extra,
    // plus another 10 when the footer flag is set.
    let size = ((bytes[6] as usize & 0x7F) << 21)
        | ((bytes[7] as usize & 0x7F) << 14)
        | ((bytes[8] as usize & 0x7F) << 7)
        | (bytes[9] as usize & 0x7F);
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    (10 + size + footer).min(bytes.len())
}

/// Parse a 4-byte MPEG audio frame header and return the whole frame's length.
fn frame_length(header: &[u8]) -> Result<usize, String> {
    if header[0] != 0xFF || header[1] & 0xE0 != 0xE0 {
        return Err(format!(
            "bad sync word {:02X}{:02X}",
            header[0], header[1]
        ));
    }

    let version = (header[1] >> 3) & 0x03; // 0=2.5, 1=reserved, 2=MPEG2, 3=MPEG1
    let layer = (header[1] >> 1) & 0x03; // 1 = Layer III
    if version == 1 {
        return Err("reserved MPEG version".into());
    }
    if layer != 1 {
        return Err("not a Layer III frame".into());
    }

    let bitrate_index = (header[2] >> 4) as usize;
    let samplerate_index = ((header[2] >> 2) & 0x03) as usize;
    let padding = ((header[2] >> 1) & 0x01) as usize;

    if bitrate_index == 0 || bitrate_index == 15 {
        return Err(format!("unsupported bitrate index {bitrate_index}"));
    }
    if samplerate_index == 3 {
        return Err("reserved sample-rate index".into());
    }

    let (bitrate_kbps, sample_rate, coefficient) = match version {
        3 => (
            BITRATES_V1_L3[bitrate_index],
            SAMPLE_RATES_V1[samplerate_index],
            144,
        ),
        2 => (
            BITRATES_V2_L3[bitrate_index],
            SAMPLE_RATES_V2[samplerate_index],
            72,
        ),
        _ => (
            BITRATES_V2_L3[bitrate_index],
            SAMPLE_RATES_V25[samplerate_index],
            72,
        ),
    };

    let len = (coefficient * bitrate_kbps * 1000 / sample_rate) as usize + padding;
    if len <= 4 {
        return Err(format!("implausible frame length {len}"));
    }
    Ok(len)
}

// ── WAV ──────────────────────────────────────────────────────────────────

fn assemble_wav(fragments: &[AudioFragment]) -> Result<Vec<u8>, SpeechError> {
    let mut spec: Option<hound::WavSpec> = None;
    let mut samples: Vec<i16> = Vec::new();

    for fragment in fragments {
        let malformed = |detail: String| SpeechError::MalformedFragment {
            index: fragment.index,
            detail,
        };

        let mut reader = hound::WavReader::new(Cursor::new(&fragment.bytes))
            .map_err(|e| malformed(format!("WAV header: {e}")))?;
        let this_spec = reader.spec();

        if this_spec.bits_per_sample != 16 || this_spec.sample_format != hound::SampleFormat::Int {
            return Err(malformed(format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                this_spec.bits_per_sample, this_spec.sample_format
            )));
        }
        match spec {
            None => spec = Some(this_spec),
            Some(first) if first != this_spec => {
                return Err(malformed(format!(
                    "WAV spec mismatch: {:?} vs first fragment's {:?}",
                    this_spec, first
                )));
            }
            Some(_) => {}
        }

        for sample in reader.samples::<i16>() {
            samples.push(sample.map_err(|e| malformed(format!("WAV samples: {e}")))?);
        }
    }

    let spec = spec.ok_or_else(|| SpeechError::Internal("no WAV fragments".into()))?;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SpeechError::Internal(format!("WAV writer: {e}")))?;
        for sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| SpeechError::Internal(format!("WAV write: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| SpeechError::Internal(format!("WAV finalize: {e}")))?;
    }
    Ok(cursor.into_inner())
}
