//! Detection result mapping.
//!
//! Detection models emit four tensors: box locations as `[top, left,
//! bottom, right]` ratios of the inference region, class indices, scores,
//! and a valid-result count. This mapper pairs each surviving box with its
//! category, scales ratios to pixel space, offsets by the region of
//! interest origin and clamps every rectangle to the image bounds.

use ndarray::ArrayD;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::labels::LabelMap;
use crate::core::options::ClassificationOptions;
use crate::core::results::{Category, Detection, DetectionResult};
use crate::processors::classification::ClassNameSet;
use crate::vision::Rect;

/// Maps raw detection tensors to [`DetectionResult`]s.
#[derive(Debug, Clone)]
pub struct DetectionPostprocessor {
    labels: LabelMap,
    max_results: usize,
    score_threshold: f32,
    class_name_set: Option<ClassNameSet>,
}

impl DetectionPostprocessor {
    /// Creates a postprocessor from validated options and a label map.
    ///
    /// The same option set as classification applies: `max_results` of zero
    /// and combined allow/deny lists are rejected before any engine call.
    pub fn new(options: &ClassificationOptions, labels: LabelMap) -> TaskResult<Self> {
        options.validate()?;
        let class_name_set = ClassNameSet::from_options(options, &labels)?;
        let max_results = if options.max_results < 0 {
            usize::MAX
        } else {
            options.max_results as usize
        };
        Ok(Self {
            labels,
            max_results,
            score_threshold: options.effective_threshold(),
            class_name_set,
        })
    }

    /// Maps one call's raw tensors to detections.
    ///
    /// # Arguments
    ///
    /// * `locations` - `[1, N, 4]` ratios `[top, left, bottom, right]` of
    ///   the inference region.
    /// * `classes` - `[1, N]` class indices (as floats, per the engine).
    /// * `scores` - `[1, N]` scores, one per box.
    /// * `count` - `[1]` number of valid boxes.
    /// * `region` - Image-space rectangle inference ran on (the full frame,
    ///   or the region of interest).
    /// * `image_width`, `image_height` - Input image dimensions used for
    ///   clamping.
    pub fn process(
        &self,
        locations: &ArrayD<f32>,
        classes: &ArrayD<f32>,
        scores: &ArrayD<f32>,
        count: &ArrayD<f32>,
        region: &Rect,
        image_width: u32,
        image_height: u32,
    ) -> TaskResult<DetectionResult> {
        let num_boxes = Self::box_count(locations)?;
        if classes.len() < num_boxes || scores.len() < num_boxes {
            return Err(TaskError::post_processing_message(format!(
                "detection tensors disagree: {} box(es) but {} class(es) and {} score(s)",
                num_boxes,
                classes.len(),
                scores.len()
            )));
        }
        let valid = count
            .iter()
            .next()
            .map(|&c| c.max(0.0) as usize)
            .unwrap_or(num_boxes)
            .min(num_boxes);

        let location_data: Vec<f32> = locations.iter().copied().collect();
        let class_data: Vec<f32> = classes.iter().copied().collect();
        let score_data: Vec<f32> = scores.iter().copied().collect();

        let mut detections = Vec::new();
        for i in 0..valid {
            let score = score_data[i];
            if score < self.score_threshold {
                continue;
            }
            let class_index = class_data[i].max(0.0) as usize;
            if let Some(set) = &self.class_name_set {
                if !set.allows(&self.labels, class_index) {
                    continue;
                }
            }

            let top = location_data[i * 4];
            let left = location_data[i * 4 + 1];
            let bottom = location_data[i * 4 + 2];
            let right = location_data[i * 4 + 3];

            let rect = Rect::new(
                region.x + left * region.width,
                region.y + top * region.height,
                (right - left) * region.width,
                (bottom - top) * region.height,
            )
            .clamp_to(image_width as f32, image_height as f32);

            detections.push(Detection {
                rect,
                categories: vec![self.category(class_index, score)],
            });
        }

        // The engine emits boxes in descending score order already, but the
        // contract is ordering by top score, so enforce it after filtering.
        detections.sort_by(|a, b| {
            let a_score = a.categories.first().map(|c| c.score).unwrap_or(f32::MIN);
            let b_score = b.categories.first().map(|c| c.score).unwrap_or(f32::MIN);
            b_score
                .partial_cmp(&a_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        detections.truncate(self.max_results);

        Ok(DetectionResult { detections })
    }

    fn box_count(locations: &ArrayD<f32>) -> TaskResult<usize> {
        let shape = locations.shape();
        match shape.last() {
            Some(4) => Ok(locations.len() / 4),
            _ => Err(TaskError::post_processing_message(format!(
                "location tensor must have 4 coordinates per box, got shape {shape:?}"
            ))),
        }
    }

    fn category(&self, index: usize, score: f32) -> Category {
        match self.labels.get(index) {
            Some(item) => Category {
                index,
                score,
                label: item.name.clone(),
                display_name: item.display_name.clone(),
            },
            None => Category::unlabeled(index, score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn tensor(shape: &[usize], data: Vec<f32>) -> ArrayD<f32> {
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }

    fn labels() -> LabelMap {
        LabelMap::from_names(vec!["person".into(), "cat".into(), "dog".into()])
    }

    /// Two valid boxes out of a 3-slot tensor.
    fn raw() -> (ArrayD<f32>, ArrayD<f32>, ArrayD<f32>, ArrayD<f32>) {
        let locations = tensor(
            &[1, 3, 4],
            vec![
                0.1, 0.2, 0.5, 0.6, // box 0
                0.0, 0.0, 1.0, 1.0, // box 1
                0.9, 0.9, 1.0, 1.0, // box 2 (beyond count)
            ],
        );
        let classes = tensor(&[1, 3], vec![1.0, 2.0, 0.0]);
        let scores = tensor(&[1, 3], vec![0.9, 0.4, 0.3]);
        let count = tensor(&[1], vec![2.0]);
        (locations, classes, scores, count)
    }

    #[test]
    fn test_boxes_scaled_to_pixel_space() {
        let post =
            DetectionPostprocessor::new(&ClassificationOptions::default(), labels()).unwrap();
        let (locations, classes, scores, count) = raw();
        let region = Rect::full_frame(100, 200);
        let result = post
            .process(&locations, &classes, &scores, &count, &region, 100, 200)
            .unwrap();

        assert_eq!(result.detections.len(), 2);
        let first = &result.detections[0];
        assert_eq!(first.rect, Rect::new(20.0, 20.0, 40.0, 80.0));
        assert_eq!(first.categories[0].label, "cat");
        assert_eq!(first.categories[0].score, 0.9);
    }

    #[test]
    fn test_boxes_lie_within_image_bounds() {
        let post =
            DetectionPostprocessor::new(&ClassificationOptions::default(), labels()).unwrap();
        let locations = tensor(&[1, 1, 4], vec![-0.2, -0.1, 1.3, 1.4]);
        let classes = tensor(&[1, 1], vec![0.0]);
        let scores = tensor(&[1, 1], vec![0.8]);
        let count = tensor(&[1], vec![1.0]);
        let region = Rect::full_frame(64, 48);

        let result = post
            .process(&locations, &classes, &scores, &count, &region, 64, 48)
            .unwrap();
        let rect = result.detections[0].rect;
        assert!(rect.x >= 0.0 && rect.y >= 0.0);
        assert!(rect.right() <= 64.0 && rect.bottom() <= 48.0);
    }

    #[test]
    fn test_roi_offsets_boxes_back_to_image_space() {
        let post =
            DetectionPostprocessor::new(&ClassificationOptions::default(), labels()).unwrap();
        let locations = tensor(&[1, 1, 4], vec![0.0, 0.0, 1.0, 1.0]);
        let classes = tensor(&[1, 1], vec![0.0]);
        let scores = tensor(&[1, 1], vec![0.8]);
        let count = tensor(&[1], vec![1.0]);
        let roi = Rect::new(10.0, 20.0, 30.0, 40.0);

        let result = post
            .process(&locations, &classes, &scores, &count, &roi, 640, 480)
            .unwrap();
        assert_eq!(result.detections[0].rect, Rect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_score_threshold_and_max_results() {
        let options = ClassificationOptions {
            max_results: 1,
            score_threshold: Some(0.35),
            ..Default::default()
        };
        let post = DetectionPostprocessor::new(&options, labels()).unwrap();
        let (locations, classes, scores, count) = raw();
        let region = Rect::full_frame(100, 100);

        let result = post
            .process(&locations, &classes, &scores, &count, &region, 100, 100)
            .unwrap();
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].categories[0].score, 0.9);
    }

    #[test]
    fn test_denylist_filters_detections() {
        let options = ClassificationOptions {
            category_denylist: vec!["cat".into()],
            ..Default::default()
        };
        let post = DetectionPostprocessor::new(&options, labels()).unwrap();
        let (locations, classes, scores, count) = raw();
        let region = Rect::full_frame(100, 100);

        let result = post
            .process(&locations, &classes, &scores, &count, &region, 100, 100)
            .unwrap();
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].categories[0].label, "dog");
    }

    #[test]
    fn test_malformed_location_tensor() {
        let post =
            DetectionPostprocessor::new(&ClassificationOptions::default(), labels()).unwrap();
        let locations = tensor(&[1, 2, 3], vec![0.0; 6]);
        let classes = tensor(&[1, 2], vec![0.0, 1.0]);
        let scores = tensor(&[1, 2], vec![0.5, 0.4]);
        let count = tensor(&[1], vec![2.0]);
        let region = Rect::full_frame(10, 10);

        let err = post
            .process(&locations, &classes, &scores, &count, &region, 10, 10)
            .unwrap_err();
        assert!(matches!(err, TaskError::Processing { .. }));
    }
}
