//! Text similarity search task.

use std::path::PathBuf;

use crate::core::errors::TaskResult;
use crate::core::inference::OrtEngine;
use crate::core::options::{BaseOptions, EmbeddingOptions, SearchOptions};
use crate::core::results::SearchResult;
use crate::processors::embedding::EmbeddingPostprocessor;
use crate::processors::search::EmbeddingIndex;
use crate::text::bert_tokenizer::BertTokenizer;

/// Default sequence length fed to text embedding models.
const DEFAULT_MAX_SEQ_LEN: usize = 128;

/// Options for [`TextSearcher`].
#[derive(Debug, Clone)]
pub struct TextSearcherOptions {
    /// Model and session options for the embedder.
    pub base: BaseOptions,
    /// Path to the WordPiece vocabulary file.
    pub vocab_path: PathBuf,
    /// Feature-vector post-processing options.
    pub embedding: EmbeddingOptions,
    /// Index location and result count.
    pub search: SearchOptions,
    /// Sequence length fed to the model.
    pub max_seq_len: usize,
}

impl TextSearcherOptions {
    /// Creates options for the given embedder model, vocabulary and index.
    pub fn new(
        model_path: impl Into<PathBuf>,
        vocab_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            vocab_path: vocab_path.into(),
            embedding: EmbeddingOptions::default(),
            search: SearchOptions::new(index_path),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    /// Sets the number of neighbors to return.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.search.max_results = max_results;
        self
    }
}

/// Embeds a text and looks up its nearest neighbors in a pre-built
/// embedding index.
#[derive(Debug)]
pub struct TextSearcher {
    engine: OrtEngine,
    tokenizer: BertTokenizer,
    embedder: EmbeddingPostprocessor,
    index: EmbeddingIndex,
    max_results: usize,
    max_seq_len: usize,
}

impl TextSearcher {
    /// Creates a searcher from the given options.
    ///
    /// Options, vocabulary and index are validated before the engine is
    /// touched.
    pub fn new(options: TextSearcherOptions) -> TaskResult<Self> {
        options.search.validate()?;
        options.base.validate()?;
        let tokenizer = BertTokenizer::from_vocab_file(&options.vocab_path)?;
        let index = EmbeddingIndex::from_file(&options.search.index_path)?;

        let engine = OrtEngine::from_options(&options.base)?;
        tracing::debug!(
            model = %engine.model_name(),
            indexed = index.len(),
            "text searcher ready"
        );

        Ok(Self {
            engine,
            tokenizer,
            embedder: EmbeddingPostprocessor::new(options.embedding),
            index,
            max_results: options.search.max_results as usize,
            max_seq_len: options.max_seq_len,
        })
    }

    /// Searches with the given text as the query.
    pub fn search(&self, text: &str) -> TaskResult<SearchResult> {
        let encoded = self.tokenizer.encode_single(text, self.max_seq_len)?;
        let type_ids = (self.engine.input_names().len() >= 3).then_some(&encoded.type_ids);
        let outputs = self.engine.run_ids(&encoded.ids, &encoded.mask, type_ids)?;
        let embedding = self.embedder.process(outputs.primary()?)?;
        self.index
            .nearest_neighbors(&embedding.values, self.max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TaskError;
    use crate::text::bert_tokenizer::tests::test_vocab;

    #[test]
    fn test_non_positive_max_results_rejected() {
        let vocab = test_vocab();
        let options =
            TextSearcherOptions::new("m.onnx", vocab.path(), "index.json").with_max_results(-1);
        let err = TextSearcher::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_index_is_index_error() {
        let vocab = test_vocab();
        let options = TextSearcherOptions::new("m.onnx", vocab.path(), "/nonexistent/index.json");
        let err = TextSearcher::new(options).unwrap_err();
        assert!(matches!(err, TaskError::Index { .. }));
    }
}
