//! Core building blocks shared by every task type.
//!
//! This module contains:
//! - Error handling
//! - Task options and their validation
//! - Label map loading
//! - Typed result structures
//! - Inference engine integration

pub mod errors;
pub mod inference;
pub mod labels;
pub mod options;
pub mod results;

pub use errors::{TaskError, TaskResult};
pub use inference::{EngineOutputs, OrtEngine, OrtSessionConfig};
pub use labels::{LabelMap, LabelMapItem};
pub use options::{BaseOptions, ClassificationOptions, EmbeddingOptions, SearchOptions};
pub use results::{
    Category, ClassificationResult, Classifications, Detection, DetectionResult, NearestNeighbor,
    QaAnswer, QaResult, SearchResult, Segmentation, SegmentationResult,
};
