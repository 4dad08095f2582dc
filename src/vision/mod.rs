//! Vision tasks: classification, detection, segmentation and search over
//! RGB image frames.

pub mod image_classifier;
pub mod image_searcher;
pub mod image_segmenter;
pub mod object_detector;
pub mod preprocess;
pub mod region;

pub use image_classifier::{ImageClassifier, ImageClassifierOptions};
pub use image_searcher::{ImageSearcher, ImageSearcherOptions};
pub use image_segmenter::{ImageSegmenter, ImageSegmenterOptions};
pub use object_detector::{ObjectDetector, ObjectDetectorOptions};
pub use preprocess::ImagePreprocessor;
pub use region::Rect;
