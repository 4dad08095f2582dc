//! # odml-tasks
//!
//! Task-oriented on-device inference on top of ONNX Runtime.
//!
//! Each task wraps the same three steps: validate an options struct, load
//! a model into the external inference engine, and map the engine's raw
//! output tensors into typed results. Construction is the expensive step;
//! inference calls afterwards are synchronous, stateless and
//! deterministic for a fixed model and input.
//!
//! ## Modules
//!
//! * [`core`] - Errors, options, label maps, result types and the engine
//!   wrapper
//! * [`processors`] - Result mappers from raw tensors to typed results
//! * [`vision`] - Image classification, detection, segmentation and search
//! * [`text`] - Text classification, search, question answering and
//!   tokenization
//! * [`audio`] - Audio classification
//!
//! ## Example
//!
//! ```rust,no_run
//! use odml_tasks::prelude::*;
//!
//! # fn main() -> Result<(), TaskError> {
//! let classifier = ImageClassifier::new(
//!     ImageClassifierOptions::new("mobilenet.onnx")
//!         .with_labels("labels.txt")
//!         .with_max_results(3),
//! )?;
//! let image = image::open("bird.jpg").map_err(|e| {
//!     TaskError::invalid_argument(e.to_string())
//! })?.to_rgb8();
//! let result = classifier.classify(&image)?;
//! for category in &result.head().unwrap().categories {
//!     println!("{}: {:.3}", category.label, category.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod core;
pub mod processors;
pub mod text;
pub mod vision;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{TaskError, TaskResult};

    // Options
    pub use crate::core::{BaseOptions, ClassificationOptions, EmbeddingOptions, SearchOptions};

    // Results
    pub use crate::core::{
        Category, ClassificationResult, Classifications, Detection, DetectionResult,
        NearestNeighbor, QaAnswer, QaResult, SearchResult, Segmentation, SegmentationResult,
    };

    // Vision tasks
    pub use crate::vision::{
        ImageClassifier, ImageClassifierOptions, ImageSearcher, ImageSearcherOptions,
        ImageSegmenter, ImageSegmenterOptions, ObjectDetector, ObjectDetectorOptions, Rect,
    };

    // Text tasks
    pub use crate::text::{
        BertQuestionAnswerer, BertQuestionAnswererOptions, BertTokenizer, TextClassifier,
        TextClassifierOptions, TextSearcher, TextSearcherOptions,
    };

    // Audio tasks
    pub use crate::audio::{AudioBuffer, AudioClassifier, AudioClassifierOptions, AudioFormat};

    // Index building and mask options
    pub use crate::processors::{EmbeddingIndex, SegmentationOutput};
}

/// Initializes the tracing subscriber for logging.
///
/// Sets up the tracing subscriber with an environment filter and a
/// formatting layer. Typically called once at application start.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
