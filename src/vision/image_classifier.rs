//! Image classification task.

use image::RgbImage;

use crate::core::errors::TaskResult;
use crate::core::inference::OrtEngine;
use crate::core::labels::LabelMap;
use crate::core::options::{BaseOptions, ClassificationOptions};
use crate::core::results::ClassificationResult;
use crate::processors::classification::{ClassificationPostprocessor, scores_from_tensor};
use crate::vision::preprocess::ImagePreprocessor;
use crate::vision::region::{Rect, crop_region};

/// Options for [`ImageClassifier`].
#[derive(Debug, Clone, Default)]
pub struct ImageClassifierOptions {
    /// Model, labels and session options.
    pub base: BaseOptions,
    /// Score filtering and truncation options.
    pub classification: ClassificationOptions,
}

impl ImageClassifierOptions {
    /// Creates options for the given model path.
    pub fn new(model_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            classification: ClassificationOptions::default(),
        }
    }

    /// Sets the label file path.
    pub fn with_labels(mut self, path: impl Into<std::path::PathBuf>) -> Self {
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

    /// Sets the category allowlist.
    pub fn with_category_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.classification.category_allowlist = allowlist;
        self
    }

    /// Sets the category denylist.
    pub fn with_category_denylist(mut self, denylist: Vec<String>) -> Self {
        self.classification.category_denylist = denylist;
        self
    }
}

/// Classifies images into the categories of a single-head model.
///
/// Construction loads and validates the model (expensive); `classify` calls
/// are stateless afterwards. Instances are not thread-safe for concurrent
/// calls and should be owned by one caller context at a time.
#[derive(Debug)]
pub struct ImageClassifier {
    engine: OrtEngine,
    preprocessor: ImagePreprocessor,
    postprocessor: ClassificationPostprocessor,
}

impl ImageClassifier {
    /// Creates a classifier from the given options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` for invalid options (checked
    /// before the engine is touched) and `TaskError::ModelLoad` when the
    /// model cannot be loaded.
    pub fn new(options: ImageClassifierOptions) -> TaskResult<Self> {
        options.classification.validate()?;
        options.base.validate()?;
        let labels = LabelMap::from_base_options(&options.base)?;
        let postprocessor = ClassificationPostprocessor::new(&options.classification, labels)?;

        let engine = OrtEngine::from_options(&options.base)?;
        let preprocessor = ImagePreprocessor::from_engine(&engine)?;
        tracing::debug!(model = %engine.model_name(), "image classifier ready");

        Ok(Self {
            engine,
            preprocessor,
            postprocessor,
        })
    }

    /// Classifies the full image frame.
    pub fn classify(&self, image: &RgbImage) -> TaskResult<ClassificationResult> {
        self.classify_region(image, &Rect::full_frame(image.width(), image.height()))
    }

    /// Classifies a region of interest of the image.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the region is empty or
    /// exceeds the image bounds, before any engine call.
    pub fn classify_with_roi(
        &self,
        image: &RgbImage,
        roi: &Rect,
    ) -> TaskResult<ClassificationResult> {
        roi.validate_roi(image.width(), image.height())?;
        self.classify_region(image, roi)
    }

    fn classify_region(&self, image: &RgbImage, region: &Rect) -> TaskResult<ClassificationResult> {
        let crop = crop_region(image, region);
        let tensor = self.preprocessor.process(&crop)?;
        let outputs = self.engine.run_f32(&tensor)?;
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

    #[test]
    fn test_zero_max_results_fails_before_model_load() {
        // The model path does not exist; the error must still be the
        // argument validation failure, proving validation runs first.
        let options = ImageClassifierOptions::new("missing.onnx").with_max_results(0);
        let err = ImageClassifier::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_allowlist_and_denylist_fail_before_model_load() {
        let options = ImageClassifierOptions::new("missing.onnx")
            .with_category_allowlist(vec!["cat".into()])
            .with_category_denylist(vec!["dog".into()]);
        let err = ImageClassifier::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let options = ImageClassifierOptions::new("missing.onnx");
        let err = ImageClassifier::new(options).unwrap_err();
        assert!(matches!(err, TaskError::ModelLoad { .. }));
    }
}
