//! Lexical overlap relevance scoring.
//!
//! Scores a chunk of document text against a question by counting
//! case-insensitive substring occurrences of the question's content-bearing
//! tokens, normalized by the square root of the chunk's word count so long
//! chunks are not favored purely by volume.
//!
//! The score is a pure function of (chunk text, question text): non-negative,
//! unbounded above, zero when the question carries no usable tokens or no
//! token occurs in the chunk.

/// Question tokens excluded from scoring. Closed list; matching is exact on
/// the lowercased token.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "has", "how", "who", "what", "when", "where", "which", "why", "this", "that",
    "with", "from", "have", "will", "does", "about",
];

/// Extract the scoring tokens from a question: lowercased, whitespace-split,
/// with tokens of ≤ 2 characters and stop words discarded.
pub fn question_tokens(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Score a chunk against a question.
///
/// Each surviving question token contributes its non-overlapping substring
/// occurrence count within the lowercased chunk (a token may match inside a
/// longer word, so "like" matches "likes"). The summed count is divided by
/// √(chunk word count).
pub fn score_chunk(chunk_text: &str, question: &str) -> f64 {
    let tokens = question_tokens(question);
    score_chunk_with_tokens(chunk_text, &tokens)
}

/// Same as [`score_chunk`], with tokens extracted once by the caller. Used by
/// the selector to avoid re-tokenizing the question for every chunk.
pub fn score_chunk_with_tokens(chunk_text: &str, tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }

    let word_count = chunk_text.split_whitespace().count();
    if word_count == 0 {
        return 0.0;
    }

    let lowered = chunk_text.to_lowercase();
    let hits: usize = tokens.iter().map(|t| lowered.matches(t.as_str()).count()).sum();

    hits as f64 / (word_count as f64).sqrt()
}
