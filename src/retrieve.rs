//! Cross-document top-K chunk selection.
//!
//! Chunks every document in scope, scores each chunk against the question,
//! ranks the flat collection by score, and builds two views of the selection:
//!
//! - the **prompt context** handed to the completion service, each chunk
//!   labeled with its section number and source filename;
//! - the **citation grouping** for display, grouped per source document with
//!   200-character previews.
//!
//! Ordering rules differ between the two scopes and are preserved on purpose:
//! with exactly one document in scope the selected chunks are put back into
//! ascending sequence order before concatenation (coherent reading order for
//! a single source); with multiple documents the context keeps the
//! score-descending order. See DESIGN.md.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::chunk::{chunk_words, ChunkParams};
use crate::score::{question_tokens, score_chunk_with_tokens};

/// Default number of chunks selected when a single document is pinned.
pub const DEFAULT_TOP_K_SINGLE: usize = 5;

/// Default number of chunks selected across a multi-document scope.
pub const DEFAULT_TOP_K_MULTI: usize = 8;

/// Maximum preview length, in characters, for citation display.
const PREVIEW_CHARS: usize = 200;

/// A document handed to the selector: identifier, display filename, and the
/// full text content.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub id: String,
    pub filename: String,
    pub content: String,
}

/// A chunk that survived selection, tagged with its source and score.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub document_id: String,
    pub filename: String,
    /// Zero-based position among the chunks derived from the source document.
    pub chunk_index: usize,
    pub text: String,
    pub score: f64,
}

/// Per-document citation group.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub filename: String,
    pub chunks: Vec<CitedChunk>,
}

/// One cited chunk: 1-based section number and a bounded preview.
#[derive(Debug, Clone, Serialize)]
pub struct CitedChunk {
    pub index: usize,
    pub preview: String,
}

/// Selector output: the composed prompt context, the citation grouping, and
/// the selected chunks in context order.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub context: String,
    pub citations: Vec<Citation>,
    pub chunks: Vec<RankedChunk>,
}

/// Validate a question string: trimmed, at least 3 non-whitespace characters.
///
/// Called before any chunking or scoring happens.
pub fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.chars().filter(|c| !c.is_whitespace()).count() < 3 {
        bail!("question too short: need at least 3 non-whitespace characters");
    }
    Ok(trimmed)
}

/// Select the `top_k` most relevant chunks across `docs` for `question`.
///
/// Every document is chunked independently and every chunk scored; the flat
/// collection (per-document, then per-chunk-index order) is stably sorted by
/// score descending, so ties keep their insertion order and identical input
/// always produces identical output. An all-zero-score selection is still
/// returned in that stable order — callers may treat it as low-confidence,
/// the selector does not.
pub fn retrieve(
    docs: &[DocumentInput],
    question: &str,
    params: &ChunkParams,
    top_k: usize,
) -> Retrieval {
    let tokens = question_tokens(question);

    let mut ranked: Vec<RankedChunk> = Vec::new();
    for doc in docs {
        for chunk in chunk_words(&doc.content, params) {
            let score = score_chunk_with_tokens(&chunk.text, &tokens);
            ranked.push(RankedChunk {
                document_id: doc.id.clone(),
                filename: doc.filename.clone(),
                chunk_index: chunk.index,
                text: chunk.text,
                score,
            });
        }
    }

    // Stable sort: equal scores keep per-document, per-index insertion order.
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(top_k);

    let citations = group_citations(&ranked);

    // Single-document scope reads better in original order; multi-document
    // scope keeps the strongest chunks first.
    let mut context_chunks = ranked;
    if docs.len() == 1 {
        context_chunks.sort_by_key(|c| c.chunk_index);
    }

    let context = context_chunks
        .iter()
        .map(|c| format!("{}\n{}", section_label(c), c.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    Retrieval {
        context,
        citations,
        chunks: context_chunks,
    }
}

/// `[Section i from "filename"]` label, 1-based section numbering.
fn section_label(chunk: &RankedChunk) -> String {
    format!("[Section {} from \"{}\"]", chunk.chunk_index + 1, chunk.filename)
}

/// Group selected chunks by source document for citation display.
///
/// Documents appear in the order their first chunk appears in the selection;
/// within a document, chunks are listed in ascending sequence order. This is
/// a display grouping only — it never feeds back into ranking.
fn group_citations(selection: &[RankedChunk]) -> Vec<Citation> {
    let mut order: Vec<&str> = Vec::new();
    for chunk in selection {
        if !order.contains(&chunk.document_id.as_str()) {
            order.push(&chunk.document_id);
        }
    }

    order
        .iter()
        .map(|doc_id| {
            let mut members: Vec<&RankedChunk> = selection
                .iter()
                .filter(|c| c.document_id == *doc_id)
                .collect();
            members.sort_by_key(|c| c.chunk_index);
            Citation {
                filename: members[0].filename.clone(),
                chunks: members
                    .iter()
                    .map(|c| CitedChunk {
                        index: c.chunk_index + 1,
                        preview: preview(&c.text),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Truncate chunk text to a bounded preview, appending an ellipsis when
/// anything was cut.
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, filename: &str, content: &str) -> DocumentInput {
        DocumentInput {
            id: id.to_string(),
            filename: filename.to_string(),
            content: content.to_string(),
        }
    }

    fn small_params() -> ChunkParams {
        ChunkParams::new(5, 0).unwrap()
    }

    #[test]
    fn question_validation() {
        assert!(validate_question("").is_err());
        assert!(validate_question("  hi  ").is_err());
        assert!(validate_question("a b").is_err());
        assert!(validate_question("abc").is_ok());
        assert_eq!(validate_question("  why?  ").unwrap(), "why?");
    }

    #[test]
    fn returns_at_most_top_k_chunks() {
        let docs = vec![
            doc("d1", "one.txt", "alpha beta gamma delta epsilon zeta eta theta iota kappa"),
            doc("d2", "two.txt", "lambda mu nu xi omicron"),
        ];
        let r = retrieve(&docs, "alpha lambda", &small_params(), 2);
        assert_eq!(r.chunks.len(), 2);

        let r = retrieve(&docs, "alpha lambda", &small_params(), 50);
        // d1 yields 2 chunks, d2 yields 1.
        assert_eq!(r.chunks.len(), 3);
    }

    #[test]
    fn zero_score_document_ranks_below_matching_one() {
        let docs = vec![
            doc("d1", "silent.txt", "nothing relevant in here whatsoever"),
            doc("d2", "cats.txt", "The cat sat on the mat. The cat likes fish."),
        ];
        let r = retrieve(&docs, "what does the cat like", &ChunkParams::default(), 5);
        assert_eq!(r.chunks[0].document_id, "d2");
        assert!(r.chunks[0].score > 0.0);
        assert_eq!(r.chunks[1].score, 0.0);
    }

    #[test]
    fn single_document_context_is_in_ascending_sequence_order() {
        // Chunk 0 scores zero, chunk 1 scores high; context must still start
        // with chunk 0 after selection.
        let docs = vec![doc(
            "d1",
            "notes.txt",
            "alpha beta gamma delta epsilon target target target target target",
        )];
        let r = retrieve(&docs, "find the target", &small_params(), 2);
        let indices: Vec<usize> = r.chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(r.context.starts_with("[Section 1 from \"notes.txt\"]"));
    }

    #[test]
    fn multi_document_context_keeps_score_descending_order() {
        let docs = vec![
            doc("d1", "weak.txt", "target appears once here only"),
            doc("d2", "strong.txt", "target target target target target"),
        ];
        let r = retrieve(&docs, "find the target", &small_params(), 2);
        assert_eq!(r.chunks[0].document_id, "d2");
        assert_eq!(r.chunks[1].document_id, "d1");
        assert!(r.chunks[0].score >= r.chunks[1].score);
        assert!(r.context.starts_with("[Section 1 from \"strong.txt\"]"));
    }

    #[test]
    fn ties_keep_insertion_order() {
        // Identical content, identical scores: d1 chunks precede d2 chunks.
        let docs = vec![
            doc("d1", "a.txt", "same words here"),
            doc("d2", "b.txt", "same words here"),
        ];
        let a = retrieve(&docs, "same words", &small_params(), 2);
        assert_eq!(a.chunks[0].document_id, "d1");
        assert_eq!(a.chunks[1].document_id, "d2");
        let b = retrieve(&docs, "same words", &small_params(), 2);
        let ids_a: Vec<&str> = a.chunks.iter().map(|c| c.document_id.as_str()).collect();
        let ids_b: Vec<&str> = b.chunks.iter().map(|c| c.document_id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn all_zero_scores_still_return_stable_selection() {
        let docs = vec![
            doc("d1", "a.txt", "alpha beta gamma"),
            doc("d2", "b.txt", "delta epsilon zeta"),
        ];
        let r = retrieve(&docs, "the and for", &small_params(), 5);
        assert_eq!(r.chunks.len(), 2);
        assert_eq!(r.chunks[0].document_id, "d1");
        assert_eq!(r.chunks[1].document_id, "d2");
        assert!(r.chunks.iter().all(|c| c.score == 0.0));
    }

    #[test]
    fn citations_group_by_first_appearance_and_sort_by_index() {
        // d2's chunk outranks both of d1's, and d1's chunk 1 outranks its
        // chunk 0, so the selection order is [d2#0, d1#1, d1#0].
        let docs = vec![
            doc("d1", "a.txt", "target noise noise noise noise target target noise noise noise"),
            doc("d2", "b.txt", "target target target target target"),
        ];
        let r = retrieve(&docs, "find the target", &small_params(), 3);
        assert_eq!(r.citations.len(), 2);
        assert_eq!(r.citations[0].filename, "b.txt");
        assert_eq!(r.citations[1].filename, "a.txt");
        // Within a.txt, cited sections are ascending regardless of score.
        let indices: Vec<usize> = r.citations[1].chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn previews_are_truncated_with_ellipsis() {
        let long_word = "x".repeat(300);
        let docs = vec![doc("d1", "long.txt", &format!("needle {}", long_word))];
        let r = retrieve(&docs, "find the needle", &ChunkParams::default(), 1);
        let preview = &r.citations[0].chunks[0].preview;
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn empty_scope_yields_empty_retrieval() {
        let r = retrieve(&[], "anything at all", &ChunkParams::default(), 5);
        assert!(r.chunks.is_empty());
        assert!(r.citations.is_empty());
        assert!(r.context.is_empty());
    }
}
