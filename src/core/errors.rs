//! Error types for the task library.
//!
//! Two kinds of failures are surfaced to callers: invalid arguments
//! (options or input validation, always reported before the engine is
//! invoked) and engine-originated failures (model loading, inference,
//! tensor extraction), which are propagated with context and never
//! retried.

use thiserror::Error;

/// Convenient result alias for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors produced by task construction and inference.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Options or input validation failed. Raised synchronously, before
    /// any inference engine call.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violated constraint.
        message: String,
    },

    /// The model file could not be loaded into the engine.
    #[error("failed to load model '{model_path}': {reason}")]
    ModelLoad {
        /// Path of the model file.
        model_path: String,
        /// Short reason description.
        reason: String,
        /// The underlying engine error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The engine reported a failure while running inference.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model that failed.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Raw engine output could not be mapped into a result structure.
    #[error("post-processing failed: {context}")]
    Processing {
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The embedding index file is missing, malformed or inconsistent.
    #[error("embedding index: {message}")]
    Index {
        /// Description of the problem.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Plain-message error used as a source when no richer error exists.
#[derive(Debug)]
pub struct OpaqueError(pub String);

impl std::fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for OpaqueError {}

impl TaskError {
    /// Creates a TaskError for an invalid argument.
    ///
    /// # Arguments
    ///
    /// * `message` - A message citing the violated constraint.
    ///
    /// # Returns
    ///
    /// A TaskError instance.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a TaskError for a model load failure.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path of the model file.
    /// * `reason` - Short reason description.
    /// * `source` - Optional underlying engine error.
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates a TaskError for an inference failure with model context.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The name of the model where inference failed.
    /// * `context` - Additional context about the failure.
    /// * `error` - The underlying error that caused this error.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a TaskError for a post-processing failure.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the failure.
    /// * `error` - The underlying error that caused this error.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a TaskError for a post-processing failure with a plain message.
    pub fn post_processing_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Processing {
            context: message.clone(),
            source: Box::new(OpaqueError(message)),
        }
    }

    /// Creates a TaskError for an inconsistent or unreadable embedding index.
    pub fn index_error(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Returns true if this error is an argument validation failure.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = TaskError::invalid_argument("`max_results` must be != 0");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "invalid argument: `max_results` must be != 0"
        );
    }

    #[test]
    fn test_model_load_error_formats_path() {
        let err = TaskError::model_load_error(
            "models/mobilenet.onnx",
            "file not found",
            None::<std::io::Error>,
        );
        let message = err.to_string();
        assert!(message.contains("models/mobilenet.onnx"));
        assert!(message.contains("file not found"));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_inference_error_keeps_source() {
        let underlying = std::io::Error::other("engine exploded");
        let err = TaskError::inference_error("mobilenet", "forward pass", underlying);
        match &err {
            TaskError::Inference { model_name, .. } => assert_eq!(model_name, "mobilenet"),
            other => panic!("expected Inference error, got {:?}", other),
        }
        assert!(std::error::Error::source(&err).is_some());
    }
}
