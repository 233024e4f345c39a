//! Overlapping-window text chunker.
//!
//! Splits document body text into [`Chunk`]s of at most `chunk_size` bytes
//! of UTF-8, with consecutive windows overlapping by `overlap` bytes so
//! clause boundaries are not lost at window edges. Window ends prefer a
//! whitespace boundary when one is available, and never split a code point.
//!
//! Each chunk receives a UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Split text into overlapping windows. Returns chunks with contiguous
/// indices starting at 0; always at least one chunk.
pub fn chunk_text(document_id: &str, text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.len() <= chunk_size {
        return vec![make_chunk(document_id, 0, trimmed)];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < trimmed.len() {
        let hard_end = floor_char_boundary(trimmed, (start + chunk_size).min(trimmed.len()));
        let end = if hard_end < trimmed.len() {
            // Back off to the last whitespace inside the window, if any is
            // past the midpoint; otherwise cut at the hard boundary.
            let window = &trimmed[start..hard_end];
            match window.rfind(char::is_whitespace) {
                Some(pos) if pos > chunk_size / 2 => start + pos,
                _ => hard_end,
            }
        } else {
            hard_end
        };

        let piece = trimmed[start..end].trim();
        if !piece.is_empty() {
            chunks.push(make_chunk(document_id, index, piece));
            index += 1;
        }

        if end >= trimmed.len() {
            break;
        }
        // Next window starts `overlap` characters before this one ended,
        // but must strictly advance.
        let next = end.saturating_sub(overlap).max(start + 1);
        start = ceil_char_boundary(trimmed, next);
    }

    if chunks.is_empty() {
        chunks.push(make_chunk(document_id, 0, trimmed));
    }

    chunks
}

fn make_chunk(document_id: &str, index: usize, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
