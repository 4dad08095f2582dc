//! Object detection task.

use image::RgbImage;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::inference::OrtEngine;
use crate::core::labels::LabelMap;
use crate::core::options::{BaseOptions, ClassificationOptions};
use crate::core::results::DetectionResult;
use crate::processors::detection::DetectionPostprocessor;
use crate::vision::preprocess::ImagePreprocessor;
use crate::vision::region::{Rect, crop_region};

/// Options for [`ObjectDetector`].
#[derive(Debug, Clone, Default)]
pub struct ObjectDetectorOptions {
    /// Model, labels and session options.
    pub base: BaseOptions,
    /// Score filtering and truncation options applied per detection.
    pub classification: ClassificationOptions,
}

impl ObjectDetectorOptions {
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

    /// Sets the maximum number of returned detections.
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

/// Detects objects and their bounding boxes in images.
///
/// The model is expected to emit the four standard detection tensors:
/// box locations as region ratios, class indices, scores, and a valid
/// count. Returned rectangles are expressed in input-image pixel space
/// and clamped to the image bounds.
#[derive(Debug)]
pub struct ObjectDetector {
    engine: OrtEngine,
    preprocessor: ImagePreprocessor,
    postprocessor: DetectionPostprocessor,
}

impl ObjectDetector {
    /// Creates a detector from the given options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` for invalid options (checked
    /// before the engine is touched) and `TaskError::ModelLoad` when the
    /// model cannot be loaded.
    pub fn new(options: ObjectDetectorOptions) -> TaskResult<Self> {
        options.classification.validate()?;
        options.base.validate()?;
        let labels = LabelMap::from_base_options(&options.base)?;
        let postprocessor = DetectionPostprocessor::new(&options.classification, labels)?;

        let engine = OrtEngine::from_options(&options.base)?;
        let preprocessor = ImagePreprocessor::from_engine(&engine)?;
        tracing::debug!(model = %engine.model_name(), "object detector ready");

        Ok(Self {
            engine,
            preprocessor,
            postprocessor,
        })
    }

    /// Detects objects in the full image frame.
    pub fn detect(&self, image: &RgbImage) -> TaskResult<DetectionResult> {
        self.detect_region(image, &Rect::full_frame(image.width(), image.height()))
    }

    /// Detects objects within a region of interest.
    ///
    /// Returned boxes are mapped back to full-image coordinates.
    pub fn detect_with_roi(&self, image: &RgbImage, roi: &Rect) -> TaskResult<DetectionResult> {
        roi.validate_roi(image.width(), image.height())?;
        self.detect_region(image, roi)
    }

    fn detect_region(&self, image: &RgbImage, region: &Rect) -> TaskResult<DetectionResult> {
        let crop = crop_region(image, region);
        let tensor = self.preprocessor.process(&crop)?;
        let outputs = self.engine.run_f32(&tensor)?;
        let (Some(locations), Some(classes), Some(scores), Some(count)) = (
            outputs.by_index(0),
            outputs.by_index(1),
            outputs.by_index(2),
            outputs.by_index(3),
        ) else {
            return Err(TaskError::post_processing_message(format!(
                "detection models must emit 4 output tensors \
                 (locations, classes, scores, count), got {}",
                outputs.len()
            )));
        };

        self.postprocessor.process(
            locations,
            classes,
            scores,
            count,
            region,
            image.width(),
            image.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_max_results_fails_before_model_load() {
        let options = ObjectDetectorOptions::new("missing.onnx").with_max_results(0);
        let err = ObjectDetector::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_exclusive_lists_fail_before_model_load() {
        let options = ObjectDetectorOptions::new("missing.onnx")
            .with_category_allowlist(vec!["person".into()])
            .with_category_denylist(vec!["cat".into()]);
        let err = ObjectDetector::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let err = ObjectDetector::new(ObjectDetectorOptions::new("missing.onnx")).unwrap_err();
        assert!(matches!(err, TaskError::ModelLoad { .. }));
    }
}
