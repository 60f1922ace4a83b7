
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::retrieval::hybrid::contains_non_prose_marker;

/// Separators tried in order, coarsest first. The empty separator splits between
/// characters and always succeeds.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Configuration for document chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next
    pub chunk_overlap: usize,
    /// Chunks shorter than this (after trimming) are discarded at ingest
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
            min_chunk_chars: 30,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into chunks of at most `max_size` characters.
///
/// Paragraph breaks are preferred over line breaks, line breaks over spaces, and
/// spaces over arbitrary character boundaries. Consecutive chunks share up to
/// `overlap` characters of whole pieces. Chunks are trimmed and blank ones dropped.
#[inline]
pub fn split_into_chunks(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    let overlap = overlap.min(max_size - 1);

    let chunks = split_recursive(text, &SEPARATORS, max_size, overlap);

    debug!(
        "Split {} characters into {} chunks (max {}, overlap {})",
        char_len(text),
        chunks.len(),
        max_size,
        overlap
    );
    chunks
}

fn split_recursive(
    text: &str,
    separators: &[&str],
    max_size: usize,
    overlap: usize,
) -> Vec<String> {
    let position = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let pieces: Vec<&str> = if separator.is_empty() {
        text.split_inclusive(|_: char| true).collect()
    } else {
        text.split(separator).filter(|p| !p.is_empty()).collect()
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for piece in pieces {
        if char_len(piece) <= max_size {
            pending.push(piece);
            continue;
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, separator, max_size, overlap));
            pending.clear();
        }
        if finer.is_empty() {
            chunks.push(piece.trim().to_string());
        } else {
            chunks.extend(split_recursive(piece, finer, max_size, overlap));
        }
    }

    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, separator, max_size, overlap));
    }

    chunks.retain(|chunk| !chunk.is_empty());
    chunks
}

/// Greedily pack pieces into chunks, keeping a tail of at most `overlap` characters
/// as the start of the next chunk.
fn merge_pieces(pieces: &[&str], separator: &str, max_size: usize, overlap: usize) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for piece in pieces {
        let length = char_len(piece);

        if !window.is_empty() && total + separator_len + length > max_size {
            push_window(&mut chunks, &window, separator);

            while let Some(front) = window.front() {
                let next_joined = if window.len() > 1 { separator_len } else { 0 };
                let still_fits = total + separator_len + length <= max_size;
                if total <= overlap && still_fits {
                    break;
                }
                total -= char_len(front) + next_joined;
                window.pop_front();
            }
        }

        let joined = if window.is_empty() { 0 } else { separator_len };
        total += joined + length;
        window.push_back(piece);
    }

    push_window(&mut chunks, &window, separator);
    chunks
}

fn push_window(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Whether a chunk is prose worth embedding: long enough and free of OCR
/// serialization markers
#[inline]
pub fn is_text_chunk(chunk: &str, min_chars: usize) -> bool {
    char_len(chunk.trim()) >= min_chars && !contains_non_prose_marker(chunk)
}
