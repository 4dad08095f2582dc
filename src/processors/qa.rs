//! Answer-span decoding for extractive question answering.
//!
//! Span-prediction models emit one start logit and one end logit per input
//! token. Decoding pairs the highest-scoring start and end positions,
//! keeps the pairs that form a well-formed span inside the context window,
//! and ranks them by the sum of both logits.

use crate::core::errors::{TaskError, TaskResult};

/// Query tokens beyond this count are dropped.
pub const MAX_QUERY_TOKENS: usize = 64;
/// Total sequence length fed to span-prediction models.
pub const MAX_SEQ_LEN: usize = 384;
/// Number of candidate answers returned per call.
pub const PREDICT_ANSWER_COUNT: usize = 5;
/// Longest admissible answer span, in tokens.
pub const MAX_ANSWER_TOKENS: usize = 32;

/// A candidate answer span in token coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCandidate {
    /// Index of the first answer token.
    pub start: usize,
    /// Index of the last answer token, inclusive.
    pub end: usize,
    /// Sum of the start and end logits.
    pub score: f32,
}

/// Returns token indices ordered by descending logit.
fn reverse_sort_indices(logits: &[f32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..logits.len()).collect();
    indices.sort_by(|&a, &b| {
        logits[b]
            .partial_cmp(&logits[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Decodes candidate answer spans from start/end logits.
///
/// # Arguments
///
/// * `start_logits`, `end_logits` - One logit per input token; must have
///   equal lengths.
/// * `context_span` - Inclusive token-index range holding context tokens;
///   spans reaching outside it (into the query or padding) are discarded.
///
/// # Returns
///
/// Up to [`PREDICT_ANSWER_COUNT`] spans, descending score.
pub fn decode_spans(
    start_logits: &[f32],
    end_logits: &[f32],
    context_span: (usize, usize),
) -> TaskResult<Vec<SpanCandidate>> {
    if start_logits.len() != end_logits.len() {
        return Err(TaskError::post_processing_message(format!(
            "start and end logits disagree in length ({} vs {})",
            start_logits.len(),
            end_logits.len()
        )));
    }
    if start_logits.is_empty() {
        return Ok(Vec::new());
    }

    let (context_start, context_end) = context_span;
    let start_indices = reverse_sort_indices(start_logits);
    let end_indices = reverse_sort_indices(end_logits);

    let mut candidates = Vec::new();
    for &start in start_indices.iter().take(PREDICT_ANSWER_COUNT) {
        for &end in end_indices.iter().take(PREDICT_ANSWER_COUNT) {
            if start < context_start || end > context_end {
                continue;
            }
            if end < start || (end - start + 1) > MAX_ANSWER_TOKENS {
                continue;
            }
            candidates.push(SpanCandidate {
                start,
                end,
                score: start_logits[start] + end_logits[end],
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(PREDICT_ANSWER_COUNT);
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_span_wins() {
        // Token 2 has the best start logit, token 3 the best end logit.
        let start = vec![0.0, 0.1, 5.0, 0.2, 0.1];
        let end = vec![0.0, 0.1, 0.2, 4.0, 0.3];
        let spans = decode_spans(&start, &end, (1, 4)).unwrap();

        assert!(!spans.is_empty());
        assert_eq!(spans[0], SpanCandidate {
            start: 2,
            end: 3,
            score: 9.0
        });
    }

    #[test]
    fn test_spans_stay_inside_context() {
        // The strongest pair sits at token 0, outside the context window.
        let start = vec![9.0, 0.1, 1.0, 0.2];
        let end = vec![9.0, 0.1, 1.5, 0.2];
        let spans = decode_spans(&start, &end, (2, 3)).unwrap();

        assert!(spans.iter().all(|s| s.start >= 2 && s.end <= 3));
    }

    #[test]
    fn test_end_before_start_discarded() {
        let start = vec![0.0, 0.0, 5.0];
        let end = vec![0.0, 5.0, 0.0];
        let spans = decode_spans(&start, &end, (0, 2)).unwrap();
        assert!(spans.iter().all(|s| s.end >= s.start));
    }

    #[test]
    fn test_overlong_spans_discarded() {
        let mut start = vec![0.0; 64];
        let mut end = vec![0.0; 64];
        start[0] = 10.0;
        end[60] = 10.0;
        // 61 tokens exceeds MAX_ANSWER_TOKENS; the span must not survive.
        let spans = decode_spans(&start, &end, (0, 63)).unwrap();
        assert!(
            spans
                .iter()
                .all(|s| s.end - s.start + 1 <= MAX_ANSWER_TOKENS)
        );
    }

    #[test]
    fn test_at_most_five_answers() {
        let start: Vec<f32> = (0..20).map(|i| i as f32).collect();
        let end: Vec<f32> = (0..20).map(|i| i as f32).collect();
        let spans = decode_spans(&start, &end, (0, 19)).unwrap();
        assert!(spans.len() <= PREDICT_ANSWER_COUNT);
        assert!(spans.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(decode_spans(&[0.0], &[0.0, 1.0], (0, 1)).is_err());
    }
}
