//! Image similarity search task.

use image::RgbImage;

use crate::core::errors::TaskResult;
use crate::core::inference::OrtEngine;
use crate::core::options::{BaseOptions, EmbeddingOptions, SearchOptions};
use crate::core::results::SearchResult;
use crate::processors::embedding::EmbeddingPostprocessor;
use crate::processors::search::EmbeddingIndex;
use crate::vision::preprocess::ImagePreprocessor;
use crate::vision::region::{Rect, crop_region};

/// Options for [`ImageSearcher`].
#[derive(Debug, Clone)]
pub struct ImageSearcherOptions {
    /// Model and session options for the embedder.
    pub base: BaseOptions,
    /// Feature-vector post-processing options.
    pub embedding: EmbeddingOptions,
    /// Index location and result count.
    pub search: SearchOptions,
}

impl ImageSearcherOptions {
    /// Creates options for the given embedder model and index file.
    pub fn new(
        model_path: impl Into<std::path::PathBuf>,
        index_path: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            embedding: EmbeddingOptions::default(),
            search: SearchOptions::new(index_path),
        }
    }

    /// Sets the number of neighbors to return.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.search.max_results = max_results;
        self
    }

    /// Enables L2-normalization of the query embedding.
    pub fn with_l2_normalize(mut self, l2_normalize: bool) -> Self {
        self.embedding.l2_normalize = l2_normalize;
        self
    }
}

/// Embeds an image and looks up its nearest neighbors in a pre-built
/// embedding index.
#[derive(Debug)]
pub struct ImageSearcher {
    engine: OrtEngine,
    preprocessor: ImagePreprocessor,
    embedder: EmbeddingPostprocessor,
    index: EmbeddingIndex,
    max_results: usize,
}

impl ImageSearcher {
    /// Creates a searcher from the given options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` for invalid options,
    /// `TaskError::Index` when the index file is unreadable or
    /// inconsistent, and `TaskError::ModelLoad` for engine failures. All
    /// option validation happens before the engine is touched.
    pub fn new(options: ImageSearcherOptions) -> TaskResult<Self> {
        options.search.validate()?;
        options.base.validate()?;
        let index = EmbeddingIndex::from_file(&options.search.index_path)?;

        let engine = OrtEngine::from_options(&options.base)?;
        let preprocessor = ImagePreprocessor::from_engine(&engine)?;
        tracing::debug!(
            model = %engine.model_name(),
            indexed = index.len(),
            "image searcher ready"
        );

        Ok(Self {
            engine,
            preprocessor,
            embedder: EmbeddingPostprocessor::new(options.embedding),
            index,
            max_results: options.search.max_results as usize,
        })
    }

    /// Searches with the full image frame as the query.
    pub fn search(&self, image: &RgbImage) -> TaskResult<SearchResult> {
        self.search_region(image, &Rect::full_frame(image.width(), image.height()))
    }

    /// Searches with a region of interest as the query.
    pub fn search_with_roi(&self, image: &RgbImage, roi: &Rect) -> TaskResult<SearchResult> {
        roi.validate_roi(image.width(), image.height())?;
        self.search_region(image, roi)
    }

    fn search_region(&self, image: &RgbImage, region: &Rect) -> TaskResult<SearchResult> {
        let crop = crop_region(image, region);
        let tensor = self.preprocessor.process(&crop)?;
        let outputs = self.engine.run_f32(&tensor)?;
        let embedding = self.embedder.process(outputs.primary()?)?;
        self.index
            .nearest_neighbors(&embedding.values, self.max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TaskError;

    #[test]
    fn test_non_positive_max_results_rejected() {
        let options = ImageSearcherOptions::new("model.onnx", "index.json").with_max_results(0);
        let err = ImageSearcher::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_index_is_index_error() {
        let options = ImageSearcherOptions::new("model.onnx", "/nonexistent/index.json");
        let err = ImageSearcher::new(options).unwrap_err();
        assert!(matches!(err, TaskError::Index { .. }));
    }
}
