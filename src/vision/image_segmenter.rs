//! Image segmentation task.

use image::RgbImage;

use crate::core::errors::TaskResult;
use crate::core::inference::OrtEngine;
use crate::core::labels::LabelMap;
use crate::core::options::BaseOptions;
use crate::core::results::SegmentationResult;
use crate::processors::segmentation::{SegmentationOutput, SegmentationPostprocessor};
use crate::vision::preprocess::ImagePreprocessor;
use crate::vision::region::{Rect, crop_region};

/// Options for [`ImageSegmenter`].
#[derive(Debug, Clone, Default)]
pub struct ImageSegmenterOptions {
    /// Model, labels and session options.
    pub base: BaseOptions,
    /// Which mask representation to produce.
    pub output: SegmentationOutput,
}

impl ImageSegmenterOptions {
    /// Creates options for the given model path.
    pub fn new(model_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            output: SegmentationOutput::default(),
        }
    }

    /// Sets the label file path.
    pub fn with_labels(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base = self.base.with_labels(path);
        self
    }

    /// Selects the mask representation.
    pub fn with_output(mut self, output: SegmentationOutput) -> Self {
        self.output = output;
        self
    }
}

/// Segments images into per-pixel class masks.
///
/// Masks come back at the model's native output resolution, which may
/// differ from the input resolution; the covered image-space region is
/// recorded on each result so callers can map mask coordinates back to
/// pixel space, in particular when a region of interest was supplied.
#[derive(Debug)]
pub struct ImageSegmenter {
    engine: OrtEngine,
    preprocessor: ImagePreprocessor,
    postprocessor: SegmentationPostprocessor,
}

impl ImageSegmenter {
    /// Creates a segmenter from the given options.
    pub fn new(options: ImageSegmenterOptions) -> TaskResult<Self> {
        options.base.validate()?;
        let labels = LabelMap::from_base_options(&options.base)?;
        let postprocessor = SegmentationPostprocessor::new(labels, options.output);

        let engine = OrtEngine::from_options(&options.base)?;
        let preprocessor = ImagePreprocessor::from_engine(&engine)?;
        tracing::debug!(model = %engine.model_name(), "image segmenter ready");

        Ok(Self {
            engine,
            preprocessor,
            postprocessor,
        })
    }

    /// Segments the full image frame.
    pub fn segment(&self, image: &RgbImage) -> TaskResult<SegmentationResult> {
        self.segment_region(image, &Rect::full_frame(image.width(), image.height()))
    }

    /// Segments a region of interest of the image.
    pub fn segment_with_roi(&self, image: &RgbImage, roi: &Rect) -> TaskResult<SegmentationResult> {
        roi.validate_roi(image.width(), image.height())?;
        self.segment_region(image, roi)
    }

    fn segment_region(&self, image: &RgbImage, region: &Rect) -> TaskResult<SegmentationResult> {
        let crop = crop_region(image, region);
        let tensor = self.preprocessor.process(&crop)?;
        let outputs = self.engine.run_f32(&tensor)?;
        let segmentation = self.postprocessor.process(outputs.primary()?, region)?;
        Ok(SegmentationResult {
            segmentations: vec![segmentation],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TaskError;

    #[test]
    fn test_missing_model_is_load_error() {
        let err = ImageSegmenter::new(ImageSegmenterOptions::new("missing.onnx")).unwrap_err();
        assert!(matches!(err, TaskError::ModelLoad { .. }));
    }

    #[test]
    fn test_empty_model_path_is_invalid_argument() {
        let err = ImageSegmenter::new(ImageSegmenterOptions::default()).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
