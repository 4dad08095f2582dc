//! Segmentation result mapping.
//!
//! Segmentation models emit one tensor of per-pixel per-class confidences
//! at the model's native mask resolution, which may differ from the input
//! image resolution. The mapper derives a discrete category mask (winning
//! class index per pixel) and/or passes the per-class confidence planes
//! through untouched.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::core::errors::{TaskError, TaskResult};
use crate::core::labels::LabelMap;
use crate::core::results::Segmentation;
use crate::vision::Rect;

/// Which mask representation a segmentation call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentationOutput {
    /// One winning class index per pixel.
    #[default]
    CategoryMask,
    /// One confidence plane per class, engine values passed through.
    ConfidenceMasks,
}

/// Maps raw segmentation tensors to [`Segmentation`] results.
#[derive(Debug, Clone)]
pub struct SegmentationPostprocessor {
    labels: LabelMap,
    output: SegmentationOutput,
}

impl SegmentationPostprocessor {
    /// Creates a postprocessor with the given label map and output kind.
    pub fn new(labels: LabelMap, output: SegmentationOutput) -> Self {
        Self { labels, output }
    }

    /// Maps one call's confidence tensor to a segmentation.
    ///
    /// # Arguments
    ///
    /// * `confidences` - `[1, C, H, W]` (or `[C, H, W]`) per-class
    ///   confidences at the model's native mask resolution.
    /// * `region` - Image-space rectangle the mask covers; recorded on the
    ///   result so callers can map mask coordinates back to pixel space.
    pub fn process(&self, confidences: &ArrayD<f32>, region: &Rect) -> TaskResult<Segmentation> {
        let (classes, height, width) = Self::mask_dimensions(confidences)?;
        if !self.labels.is_empty() && self.labels.len() != classes {
            return Err(TaskError::post_processing_message(format!(
                "got {} segmentation class(es), expected {} according to the label map",
                classes,
                self.labels.len()
            )));
        }

        let data: Vec<f32> = confidences.iter().copied().collect();
        let plane = height * width;

        let category_mask = match self.output {
            SegmentationOutput::CategoryMask => {
                if classes > u8::MAX as usize + 1 {
                    return Err(TaskError::post_processing_message(format!(
                        "category mask supports at most 256 classes, model has {classes}"
                    )));
                }
                let mut mask = vec![0u8; plane];
                for (pixel, value) in mask.iter_mut().enumerate() {
                    let mut best_class = 0usize;
                    let mut best_score = f32::MIN;
                    for class in 0..classes {
                        let score = data[class * plane + pixel];
                        if score > best_score {
                            best_score = score;
                            best_class = class;
                        }
                    }
                    *value = best_class as u8;
                }
                Some(mask)
            }
            SegmentationOutput::ConfidenceMasks => None,
        };

        let confidence_masks = match self.output {
            SegmentationOutput::ConfidenceMasks => Some(
                (0..classes)
                    .map(|class| data[class * plane..(class + 1) * plane].to_vec())
                    .collect(),
            ),
            SegmentationOutput::CategoryMask => None,
        };

        Ok(Segmentation {
            width,
            height,
            labels: self.labels.iter().map(|item| item.name.clone()).collect(),
            category_mask,
            confidence_masks,
            region: *region,
        })
    }

    fn mask_dimensions(confidences: &ArrayD<f32>) -> TaskResult<(usize, usize, usize)> {
        match confidences.shape() {
            [1, c, h, w] | [c, h, w] => Ok((*c, *h, *w)),
            shape => Err(TaskError::post_processing_message(format!(
                "expected a [1, C, H, W] confidence tensor, got shape {shape:?}"
            ))),
        }
    }
}
