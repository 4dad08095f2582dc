//! Typed result structures produced by the result mappers.
//!
//! All results are created per inference call, immutable, and owned by the
//! caller after being returned.

use serde::{Deserialize, Serialize};

use crate::vision::Rect;

/// A single labeled score produced by a classification head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Index of the class in the model's output tensor.
    pub index: usize,
    /// Confidence score reported by the engine for this class.
    pub score: f32,
    /// Class name from the label map. Empty when the model ships no labels.
    pub label: String,
    /// Optional human-readable name, from the display-name file if provided.
    pub display_name: Option<String>,
}

impl Category {
    /// Creates a category with no label.
    pub fn unlabeled(index: usize, score: f32) -> Self {
        Self {
            index,
            score,
            label: String::new(),
            display_name: None,
        }
    }
}

/// Ordered categories produced by a single classification head.
///
/// Categories are sorted by descending score and truncated to the configured
/// `max_results` when it is non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifications {
    /// Index of the output head that produced these categories.
    pub head_index: usize,
    /// Categories in descending score order.
    pub categories: Vec<Category>,
}

/// Result of a classification call, one entry per output head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Classifications for each head, in head order.
    pub classifications: Vec<Classifications>,
}

impl ClassificationResult {
    /// Returns the categories of the first head, if any.
    pub fn head(&self) -> Option<&Classifications> {
        self.classifications.first()
    }
}

/// A bounding box paired with its categories.
///
/// The rectangle is expressed in input-image pixel space and is guaranteed
/// to lie within the image bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in input-image pixel coordinates.
    pub rect: Rect,
    /// Categories for this box, descending score.
    pub categories: Vec<Category>,
}

/// Result of a detection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Detections ordered by descending top-category score.
    pub detections: Vec<Detection>,
}

/// A segmentation mask at the engine's native output resolution.
///
/// `width` and `height` are intrinsic to the model and may differ from the
/// input image dimensions. `region` records the image-space rectangle the
/// mask covers (the full frame, or the region of interest when one was
/// supplied), which is the information needed to map mask coordinates back
/// to image pixel space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    /// Mask width in mask pixels.
    pub width: usize,
    /// Mask height in mask pixels.
    pub height: usize,
    /// Label per class index, empty when the model ships no labels.
    pub labels: Vec<String>,
    /// Row-major per-pixel winning class index, when requested.
    pub category_mask: Option<Vec<u8>>,
    /// Row-major per-pixel confidence per class, when requested. Outer
    /// vector is indexed by class.
    pub confidence_masks: Option<Vec<Vec<f32>>>,
    /// Image-space rectangle covered by this mask.
    pub region: Rect,
}

/// Result of a segmentation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationResult {
    /// Segmentations, one per output head (single-head for bundled models).
    pub segmentations: Vec<Segmentation>,
}

/// A single nearest-neighbor match from an embedding index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbor {
    /// User-supplied metadata attached to the indexed embedding.
    pub metadata: String,
    /// Squared L2 distance to the query embedding. Lower is closer.
    pub distance: f32,
}

/// Result of a search call, ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Nearest neighbors, closest first.
    pub nearest_neighbors: Vec<NearestNeighbor>,
}

/// An answer span extracted from a question-answering context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    /// Answer text, sliced out of the context string.
    pub text: String,
    /// Byte offset of the answer start within the context.
    pub start: usize,
    /// Byte offset one past the answer end within the context.
    pub end: usize,
    /// Sum of the start and end logits for this span.
    pub score: f32,
}

/// Result of a question-answering call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResult {
    /// Candidate answers, descending score.
    pub answers: Vec<QaAnswer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlabeled_category() {
        let category = Category::unlabeled(3, 0.75);
        assert_eq!(category.index, 3);
        assert_eq!(category.score, 0.75);
        assert!(category.label.is_empty());
        assert!(category.display_name.is_none());
    }

    #[test]
    fn test_classification_result_head() {
        let result = ClassificationResult {
            classifications: vec![Classifications {
                head_index: 0,
                categories: vec![Category::unlabeled(1, 0.9)],
            }],
        };
        assert_eq!(result.head().unwrap().categories.len(), 1);

        let empty = ClassificationResult {
            classifications: vec![],
        };
        assert!(empty.head().is_none());
    }
}
