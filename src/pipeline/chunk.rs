//! Chunking: split long text into provider-safe segments.
//!
//! Every TTS backend caps how much text one synthesis call may carry, and the
//! caps differ by two orders of magnitude between backends. The chunker
//! greedily packs whitespace-delimited words into segments of at most
//! `max_chars` characters, joined by single spaces. Words are the only valid
//! split points — a segment never ends mid-word, because the synthesis engine
//! would pronounce both halves as garbage.
//!
//! Lengths are measured in Unicode scalar values, not bytes, because the
//! providers' documented limits are character counts.
//!
//! ## The oversized-word exception
//!
//! A single word longer than `max_chars` (URLs, DNA sequences, pathological
//! extraction output) is emitted alone as an oversized segment rather than
//! truncated. Never silently drop content: the provider may still accept it,
//! and if it doesn't the caller gets a synthesis error naming the segment
//! instead of an audiobook with a hole in it.

use crate::error::SpeechError;

/// A word-boundary-respecting slice of the document text, sized to fit one
/// synthesis call.
///
/// `index` values are contiguous from 0 in original text order; the assembler
/// uses them to restore ordering after concurrent synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in the ordered sequence.
    pub index: usize,
    /// The segment text; never empty.
    pub text: String,
}

impl Segment {
    /// Length in characters (the unit provider limits are expressed in).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into ordered segments of at most `max_chars` characters each.
///
/// Joining the returned segments' texts with single spaces reproduces the
/// input up to whitespace normalisation. No segment is empty; no segment
/// exceeds `max_chars` except a single word that is itself longer than the
/// limit.
///
/// # Errors
/// [`SpeechError::InvalidChunkLimit`] when `max_chars` is 0.
pub fn chunk(text: &str, max_chars: usize) -> Result<Vec<Segment>, SpeechError> {
    if max_chars == 0 {
        return Err(SpeechError::InvalidChunkLimit { limit: 0 });
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    let close = |current: &mut String, current_chars: &mut usize, segments: &mut Vec<Segment>| {
        if !current.is_empty() {
            segments.push(Segment {
                index: segments.len(),
                text: std::mem::take(current),
            });
            *current_chars = 0;
        }
    };

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            close(&mut current, &mut current_chars, &mut segments);
            current.push_str(word);
            current_chars = word_chars;
        }
    }
    close(&mut current, &mut current_chars, &mut segments);

    Ok(segments)
}
