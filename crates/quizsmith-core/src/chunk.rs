//! Paragraph-aware text chunker with overlap.
//!
//! Splits canonical text into [`Chunk`]s of at most `max_chars` characters,
//! preferring to cut at paragraph breaks (`\n\n`) and carrying `overlap`
//! characters of context from the end of one chunk into the start of the
//! next.
//!
//! # Algorithm
//!
//! 1. Start at character offset 0.
//! 2. The candidate end is `min(offset + max_chars, len)`.
//! 3. If the candidate end is before the end of the text, search the window
//!    `[offset, candidate_end)` backward for the last `\n\n`. When that
//!    break sits at least `min_chars` into the window, cut right after it.
//! 4. Emit `[offset, cut)`. Stop once `cut` reaches the end of the text.
//! 5. Continue from `cut - overlap`, but always at least one character past
//!    the previous offset so the loop terminates for any overlap.
//!
//! Offsets are character offsets, so multi-byte UTF-8 text is never split
//! inside a code point.
//!
//! # Example
//!
//! ```rust
//! use quizsmith_core::chunk::{chunk_text, ChunkOptions};
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", &ChunkOptions::default());
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].id, 0);
//! assert_eq!(chunks[0].end, 31);
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{word_count, Chunk};

/// Heuristic tokens-per-word ratio used for [`Chunk::token_estimate`].
///
/// Only used for progress and cost estimation, never for correctness.
const TOKENS_PER_WORD: f64 = 1.3;

const PARAGRAPH_BREAK: [char; 2] = ['\n', '\n'];

/// Size constraints for [`chunk_text`], all in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkOptions {
    /// Hard upper bound on chunk length.
    pub max_chars: usize,
    /// A paragraph break closer than this to the chunk start is ignored.
    pub min_chars: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            min_chars: 1000,
            overlap: 200,
        }
    }
}

/// Split canonical text into bounded, overlapping chunks.
///
/// # Guarantees
///
/// - Empty text yields no chunks; non-empty text yields at least one.
/// - Text of at most `max_chars` characters yields exactly one chunk equal
///   to the text.
/// - Chunk ids are contiguous: `0, 1, 2, …, N-1`.
/// - The first chunk starts at 0, the last ends at the text length, and
///   each chunk starts no later than the previous one ends, overlapping it
///   by at most `overlap` characters.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let max_chars = options.max_chars.max(1);

    // byte_at[i] is the byte offset of character i; byte_at[len] == text.len()
    let byte_at: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut chunks = Vec::new();
    let mut offset = 0usize;

    while offset < len {
        let candidate_end = (offset + max_chars).min(len);
        let cut = if candidate_end < len {
            last_paragraph_break(&chars[offset..candidate_end])
                .filter(|&p| p >= options.min_chars)
                .map(|p| (offset + p + PARAGRAPH_BREAK.len()).min(candidate_end))
                .unwrap_or(candidate_end)
        } else {
            candidate_end
        };

        chunks.push(make_chunk(
            chunks.len(),
            &text[byte_at[offset]..byte_at[cut]],
            offset,
            cut,
        ));

        if cut >= len {
            break;
        }
        offset = cut.saturating_sub(options.overlap).max(offset + 1);
    }

    chunks
}

/// Character position of the last `\n\n` inside `window`, if any.
fn last_paragraph_break(window: &[char]) -> Option<usize> {
    window
        .windows(PARAGRAPH_BREAK.len())
        .rposition(|w| w[..] == PARAGRAPH_BREAK[..])
}

fn make_chunk(id: usize, text: &str, start: usize, end: usize) -> Chunk {
    Chunk {
        id,
        text: text.to_string(),
        start,
        end,
        token_estimate: estimate_tokens(text),
    }
}

/// `round(words × 1.3)`.
pub fn estimate_tokens(text: &str) -> usize {
    (word_count(text) as f64 * TOKENS_PER_WORD).round() as usize
}
