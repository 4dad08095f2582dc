//! Extractive question answering task.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::inference::OrtEngine;
use crate::core::options::BaseOptions;
use crate::core::results::{QaAnswer, QaResult};
use crate::processors::qa::{
    MAX_QUERY_TOKENS, MAX_SEQ_LEN, PREDICT_ANSWER_COUNT, decode_spans,
};
use crate::text::bert_tokenizer::BertTokenizer;

/// Stride between successive context windows, in tokens.
const DOC_STRIDE: usize = 128;

/// Options for [`BertQuestionAnswerer`].
#[derive(Debug, Clone, Default)]
pub struct BertQuestionAnswererOptions {
    /// Model and session options.
    pub base: BaseOptions,
    /// Path to the WordPiece vocabulary file.
    pub vocab_path: PathBuf,
}

impl BertQuestionAnswererOptions {
    /// Creates options for the given model and vocabulary paths.
    pub fn new(model_path: impl Into<PathBuf>, vocab_path: impl Into<PathBuf>) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            vocab_path: vocab_path.into(),
        }
    }
}

/// Answers questions from a context passage with a BERT-style
/// span-prediction model.
///
/// The question is truncated to 64 tokens; long contexts are covered by
/// sliding windows of stride 128 over the model's 384-token sequence, and
/// the best spans across all windows are returned.
#[derive(Debug)]
pub struct BertQuestionAnswerer {
    engine: OrtEngine,
    tokenizer: BertTokenizer,
}

impl BertQuestionAnswerer {
    /// Creates a question answerer from the given options.
    pub fn new(options: BertQuestionAnswererOptions) -> TaskResult<Self> {
        options.base.validate()?;
        let tokenizer = BertTokenizer::from_vocab_file(&options.vocab_path)?;
        let engine = OrtEngine::from_options(&options.base)?;
        tracing::debug!(model = %engine.model_name(), "question answerer ready");
        Ok(Self { engine, tokenizer })
    }

    /// Extracts candidate answers to `question` from `context`.
    ///
    /// # Returns
    ///
    /// Up to five answer spans, descending score, each carrying the byte
    /// range of the answer within `context`.
    pub fn answer(&self, context: &str, question: &str) -> TaskResult<QaResult> {
        if context.trim().is_empty() || question.trim().is_empty() {
            return Err(TaskError::invalid_argument(
                "context and question must be non-empty",
            ));
        }

        let query = self.tokenizer.tokenize(question)?;
        let query_len = query.ids.len().min(MAX_QUERY_TOKENS);
        let query_ids = &query.ids[..query_len];
        let context_tokens = self.tokenizer.tokenize(context)?;
        if context_tokens.ids.is_empty() {
            return Err(TaskError::invalid_argument(
                "context produced no tokens to answer from",
            ));
        }

        // [CLS] + query + [SEP] ... [SEP] take three slots of the sequence.
        let max_context_len = MAX_SEQ_LEN - query_len - 3;
        let context_offset = query_len + 2;

        let mut answers: Vec<QaAnswer> = Vec::new();
        let mut seen_spans: HashSet<(usize, usize)> = HashSet::new();

        for (window_start, window_len) in
            context_windows(context_tokens.ids.len(), max_context_len, DOC_STRIDE)
        {
            let window_ids = &context_tokens.ids[window_start..window_start + window_len];
            let encoded = self.tokenizer.encode_pair(query_ids, window_ids, MAX_SEQ_LEN)?;
            let type_ids = (self.engine.input_names().len() >= 3).then_some(&encoded.type_ids);
            let outputs = self.engine.run_ids(&encoded.ids, &encoded.mask, type_ids)?;

            // Without metadata the model-declared order is end logits
            // first, start logits second.
            let (Some(end_tensor), Some(start_tensor)) = (
                outputs.by_name("end_logits").or_else(|| outputs.by_index(0)),
                outputs
                    .by_name("start_logits")
                    .or_else(|| outputs.by_index(1)),
            ) else {
                return Err(TaskError::post_processing_message(
                    "span-prediction models must emit start and end logit tensors",
                ));
            };
            let start_logits: Vec<f32> = start_tensor.iter().copied().collect();
            let end_logits: Vec<f32> = end_tensor.iter().copied().collect();

            let spans = decode_spans(
                &start_logits,
                &end_logits,
                (context_offset, context_offset + window_len - 1),
            )?;
            for span in spans {
                let first_token = window_start + (span.start - context_offset);
                let last_token = window_start + (span.end - context_offset);
                let (byte_start, _) = context_tokens.offsets[first_token];
                let (_, byte_end) = context_tokens.offsets[last_token];
                if !seen_spans.insert((byte_start, byte_end)) {
                    continue;
                }
                answers.push(QaAnswer {
                    text: context[byte_start..byte_end].to_string(),
                    start: byte_start,
                    end: byte_end,
                    score: span.score,
                });
            }
        }

        answers.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        answers.truncate(PREDICT_ANSWER_COUNT);
        Ok(QaResult { answers })
    }
}

/// Splits `total` context tokens into windows of at most `window` tokens,
/// advancing by `stride`, so that every token is covered by at least one
/// window.
fn context_windows(total: usize, window: usize, stride: usize) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    if window == 0 {
        return windows;
    }
    let mut start = 0;
    loop {
        let len = window.min(total - start);
        windows.push((start, len));
        if start + len >= total {
            break;
        }
        start += stride.min(len);
    }
    windows
}
