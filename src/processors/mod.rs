//! Result mappers: raw engine output tensors to typed results.
//!
//! Each mapper is a pure function of its input tensors and the options it
//! was built with, so results are deterministic for a fixed model and
//! input.

pub mod classification;
pub mod detection;
pub mod embedding;
pub mod qa;
pub mod search;
pub mod segmentation;

pub use classification::ClassificationPostprocessor;
pub use detection::DetectionPostprocessor;
pub use embedding::{EmbeddingPostprocessor, FeatureVector};
pub use search::EmbeddingIndex;
pub use segmentation::{SegmentationOutput, SegmentationPostprocessor};
