//! Text classification task.

use std::path::PathBuf;

use crate::core::errors::TaskResult;
use crate::core::inference::OrtEngine;
use crate::core::labels::LabelMap;
use crate::core::options::{BaseOptions, ClassificationOptions};
use crate::core::results::ClassificationResult;
use crate::processors::classification::{ClassificationPostprocessor, scores_from_tensor};
use crate::text::bert_tokenizer::BertTokenizer;

/// Default sequence length fed to text classification models.
const DEFAULT_MAX_SEQ_LEN: usize = 128;

/// Options for [`TextClassifier`].
#[derive(Debug, Clone, Default)]
pub struct TextClassifierOptions {
    /// Model, labels and session options.
    pub base: BaseOptions,
    /// Score filtering and truncation options.
    pub classification: ClassificationOptions,
    /// Path to the WordPiece vocabulary file.
    pub vocab_path: PathBuf,
    /// Sequence length fed to the model.
    pub max_seq_len: usize,
}

impl TextClassifierOptions {
    /// Creates options for the given model and vocabulary paths.
    pub fn new(model_path: impl Into<PathBuf>, vocab_path: impl Into<PathBuf>) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            classification: ClassificationOptions::default(),
            vocab_path: vocab_path.into(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    /// Sets the label file path.
    pub fn with_labels(mut self, path: impl Into<PathBuf>) -> Self {
        self.base = self.base.with_labels(path);
        self
    }

    /// Sets the maximum number of returned categories.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.classification.max_results = max_results;
        self
    }

    /// Sets the score threshold.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.classification.score_threshold = Some(threshold);
        self
    }
}

/// Classifies raw text with a BERT-style model.
///
/// Input text is tokenized, wrapped in `[CLS]`/`[SEP]` markers, padded to
/// the configured sequence length and fed to the model's id, mask and
/// (when declared) segment inputs.
#[derive(Debug)]
pub struct TextClassifier {
    engine: OrtEngine,
    tokenizer: BertTokenizer,
    postprocessor: ClassificationPostprocessor,
    max_seq_len: usize,
}

impl TextClassifier {
    /// Creates a classifier from the given options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` for invalid options or an
    /// unusable vocabulary (checked before the engine is touched) and
    /// `TaskError::ModelLoad` when the model cannot be loaded.
    pub fn new(options: TextClassifierOptions) -> TaskResult<Self> {
        options.classification.validate()?;
        options.base.validate()?;
        let labels = LabelMap::from_base_options(&options.base)?;
        let postprocessor = ClassificationPostprocessor::new(&options.classification, labels)?;
        let tokenizer = BertTokenizer::from_vocab_file(&options.vocab_path)?;

        let engine = OrtEngine::from_options(&options.base)?;
        tracing::debug!(model = %engine.model_name(), "text classifier ready");

        Ok(Self {
            engine,
            tokenizer,
            postprocessor,
            max_seq_len: options.max_seq_len,
        })
    }

    /// Classifies one text.
    pub fn classify(&self, text: &str) -> TaskResult<ClassificationResult> {
        let encoded = self.tokenizer.encode_single(text, self.max_seq_len)?;
        // Models without a segment input only take ids and mask.
        let type_ids = (self.engine.input_names().len() >= 3).then_some(&encoded.type_ids);
        let outputs = self.engine.run_ids(&encoded.ids, &encoded.mask, type_ids)?;
        let scores = scores_from_tensor(outputs.primary()?)?;
        let classifications = self.postprocessor.process(&scores, 0)?;
        Ok(ClassificationResult {
            classifications: vec![classifications],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TaskError;
    use crate::text::bert_tokenizer::tests::test_vocab;

    #[test]
    fn test_zero_max_results_fails_before_model_load() {
        let vocab = test_vocab();
        let options = TextClassifierOptions::new("missing.onnx", vocab.path()).with_max_results(0);
        let err = TextClassifier::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_vocab_fails_before_model_load() {
        let options = TextClassifierOptions::new("missing.onnx", "/nonexistent/vocab.txt");
        let err = TextClassifier::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let vocab = test_vocab();
        let options = TextClassifierOptions::new("missing.onnx", vocab.path());
        let err = TextClassifier::new(options).unwrap_err();
        assert!(matches!(err, TaskError::ModelLoad { .. }));
    }
}
