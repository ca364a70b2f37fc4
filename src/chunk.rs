//! Overlapping word-window text chunker.
//!
//! Splits document body text into [`WordChunk`]s of a fixed word count with a
//! configurable overlap between consecutive windows, so context spanning a
//! chunk boundary is not lost to the scorer.
//!
//! Chunking is a pure function of (text, parameters): no randomness, no
//! external state. Re-chunking the same text with the same parameters yields
//! byte-identical output.

use anyhow::{bail, Result};

/// Default window size in whitespace-delimited words.
pub const DEFAULT_CHUNK_WORDS: usize = 500;

/// Default overlap between consecutive windows, in words.
pub const DEFAULT_OVERLAP_WORDS: usize = 100;

/// Validated chunking parameters.
///
/// The overlap must be strictly smaller than the window size; otherwise the
/// window start offsets would not advance. [`ChunkParams::new`] rejects such
/// values instead of iterating forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    size: usize,
    overlap: usize,
}

impl ChunkParams {
    /// Create parameters. Requires `size > 0` and `overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            bail!("chunk size must be > 0 words");
        }
        if overlap >= size {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap,
                size
            );
        }
        Ok(Self { size, overlap })
    }

    /// Window size in words.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Overlap between consecutive windows, in words.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Step between window start offsets. Always ≥ 1.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_WORDS,
            overlap: DEFAULT_OVERLAP_WORDS,
        }
    }
}

/// A chunk of a document's text: consecutive words joined with single spaces,
/// tagged with its zero-based position among the chunks of that document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordChunk {
    pub index: usize,
    pub text: String,
}

/// Split text into overlapping word windows.
///
/// Windows start at offsets `0, step, 2*step, …` over the whitespace-split
/// word sequence and cover `params.size()` words each (the final window may be
/// shorter). Iteration stops with the window that reaches or exceeds the end
/// of the sequence, so the tail is emitted exactly once. Indices are assigned
/// 0, 1, 2, … in emission order.
///
/// Empty or all-whitespace input yields no chunks. Input shorter than one
/// window yields exactly one chunk containing the whole input.
pub fn chunk_words(text: &str, params: &ChunkParams) -> Vec<WordChunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    loop {
        let end = (start + params.size()).min(words.len());
        let joined = words[start..end].join(" ");
        // Whitespace splitting never yields empty words, but an empty window
        // must not consume an index.
        if !joined.trim().is_empty() {
            chunks.push(WordChunk {
                index,
                text: joined,
            });
            index += 1;
        }
        if start + params.size() >= words.len() {
            break;
        }
        start += params.step();
    }

    chunks
}
