//! Task configuration types.
//!
//! Options are validated once, at task construction time, and are immutable
//! afterwards. Validation failures are reported as
//! [`TaskError::InvalidArgument`](crate::core::errors::TaskError) before any
//! engine call is made.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{TaskError, TaskResult};
use crate::core::inference::OrtSessionConfig;

/// Options shared by every task type: which model to load and how to
/// configure the engine session for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseOptions {
    /// Path to the model file. Required.
    pub model_path: PathBuf,
    /// Path to a label file with one class name per line. Optional; when
    /// absent, results carry only class indices.
    pub labels_path: Option<PathBuf>,
    /// Path to a display-name file matching the label file line for line.
    pub display_names_path: Option<PathBuf>,
    /// Engine session configuration.
    pub session: OrtSessionConfig,
}

impl BaseOptions {
    /// Creates base options for the given model path.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Sets the label file path.
    pub fn with_labels(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    /// Sets the display-name file path.
    pub fn with_display_names(mut self, path: impl Into<PathBuf>) -> Self {
        self.display_names_path = Some(path.into());
        self
    }

    /// Sets the engine session configuration.
    pub fn with_session(mut self, session: OrtSessionConfig) -> Self {
        self.session = session;
        self
    }

    pub(crate) fn validate(&self) -> TaskResult<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(TaskError::invalid_argument(
                "`model_path` is required and must not be empty",
            ));
        }
        Ok(())
    }
}

/// Options controlling how classification scores are turned into categories.
///
/// Shared by the image, text and audio classifiers as well as the object
/// detector's per-box categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOptions {
    /// Maximum number of categories to return. Negative means unlimited;
    /// zero is rejected as an invalid argument.
    pub max_results: i32,
    /// Categories with a score strictly below this value are dropped.
    /// When unset, all scores pass.
    pub score_threshold: Option<f32>,
    /// If non-empty, only categories whose label is in this list are
    /// returned. Mutually exclusive with `category_denylist`.
    pub category_allowlist: Vec<String>,
    /// If non-empty, categories whose label is in this list are dropped.
    /// Mutually exclusive with `category_allowlist`.
    pub category_denylist: Vec<String>,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            max_results: -1,
            score_threshold: None,
            category_allowlist: Vec::new(),
            category_denylist: Vec::new(),
        }
    }
}

impl ClassificationOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` citing the violated constraint
    /// when `max_results` is zero or when both the allowlist and the
    /// denylist are non-empty.
    pub fn validate(&self) -> TaskResult<()> {
        if self.max_results == 0 {
            return Err(TaskError::invalid_argument(
                "invalid `max_results` option: value must be != 0",
            ));
        }
        if !self.category_allowlist.is_empty() && !self.category_denylist.is_empty() {
            return Err(TaskError::invalid_argument(
                "`category_allowlist` and `category_denylist` are mutually exclusive options",
            ));
        }
        Ok(())
    }

    /// Returns the effective score threshold; scores below it are dropped.
    pub fn effective_threshold(&self) -> f32 {
        self.score_threshold.unwrap_or(f32::MIN)
    }
}

/// Options controlling how a feature-vector head is post-processed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    /// L2-normalize the feature vector before returning or searching.
    pub l2_normalize: bool,
    /// Scalar-quantize the feature vector values to signed bytes.
    pub quantize: bool,
}

/// Options for nearest-neighbor search tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Path to the pre-built embedding index file.
    pub index_path: PathBuf,
    /// Number of nearest neighbors to return. Must be positive.
    pub max_results: i32,
}

impl SearchOptions {
    /// Creates search options for the given index file, returning the
    /// default five nearest neighbors.
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            max_results: 5,
        }
    }

    /// Sets the number of neighbors to return.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when `max_results` is not
    /// strictly positive or the index path is empty.
    pub fn validate(&self) -> TaskResult<()> {
        if self.max_results <= 0 {
            return Err(TaskError::invalid_argument(
                "invalid `max_results` option: search requires a positive result count",
            ));
        }
        if self.index_path.as_os_str().is_empty() {
            return Err(TaskError::invalid_argument(
                "`index_path` is required and must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_defaults_are_valid() {
        let options = ClassificationOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.max_results, -1);
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let options = ClassificationOptions {
            max_results: 0,
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn test_negative_max_results_means_unlimited() {
        let options = ClassificationOptions {
            max_results: -3,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_allowlist_and_denylist_are_mutually_exclusive() {
        let options = ClassificationOptions {
            category_allowlist: vec!["cat".into()],
            category_denylist: vec!["dog".into()],
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_search_options_validation() {
        assert!(SearchOptions::new("index.json").validate().is_ok());
        assert!(
            SearchOptions::new("index.json")
                .with_max_results(0)
                .validate()
                .is_err()
        );
        assert!(
            SearchOptions::new("index.json")
                .with_max_results(-1)
                .validate()
                .is_err()
        );
        assert!(SearchOptions::new("").validate().is_err());
    }

    #[test]
    fn test_base_options_require_model_path() {
        assert!(BaseOptions::default().validate().is_err());
        assert!(BaseOptions::new("model.onnx").validate().is_ok());
    }
}
