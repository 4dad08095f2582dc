//! Audio classification task.

use ndarray::Array2;

use crate::audio::buffer::{AudioBuffer, AudioFormat};
use crate::core::errors::{TaskError, TaskResult};
use crate::core::inference::OrtEngine;
use crate::core::labels::LabelMap;
use crate::core::options::{BaseOptions, ClassificationOptions};
use crate::core::results::ClassificationResult;
use crate::processors::classification::{ClassificationPostprocessor, scores_from_tensor};

/// Options for [`AudioClassifier`].
#[derive(Debug, Clone)]
pub struct AudioClassifierOptions {
    /// Model, labels and session options.
    pub base: BaseOptions,
    /// Score filtering and truncation options.
    pub classification: ClassificationOptions,
    /// Sample format the model was trained for. Input buffers must match
    /// it exactly.
    pub audio_format: AudioFormat,
}

impl AudioClassifierOptions {
    /// Creates options for the given model path and required sample format.
    pub fn new(model_path: impl Into<std::path::PathBuf>, audio_format: AudioFormat) -> Self {
        Self {
            base: BaseOptions::new(model_path),
            classification: ClassificationOptions::default(),
            audio_format,
        }
    }

    /// Sets the label file path.
    pub fn with_labels(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base = self.base.with_labels(path);
        self
    }

    /// Sets the maximum number of returned categories.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.classification.max_results = max_results;
        self
    }

    /// Sets the score threshold.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.classification.score_threshold = Some(threshold);
        self
    }
}

/// Classifies fixed-size audio clips.
///
/// The model's first input determines the required buffer size; callers
/// query it via [`required_input_buffer_size`](Self::required_input_buffer_size)
/// and [`required_audio_format`](Self::required_audio_format), then pass
/// buffers of exactly that shape.
#[derive(Debug)]
pub struct AudioClassifier {
    engine: OrtEngine,
    postprocessor: ClassificationPostprocessor,
    audio_format: AudioFormat,
    input_samples: usize,
}

impl AudioClassifier {
    /// Creates a classifier from the given options.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` for invalid options (checked
    /// before the engine is touched), or when the model does not declare a
    /// static `[1, N]` waveform input.
    pub fn new(options: AudioClassifierOptions) -> TaskResult<Self> {
        options.classification.validate()?;
        options.base.validate()?;
        let labels = LabelMap::from_base_options(&options.base)?;
        let postprocessor = ClassificationPostprocessor::new(&options.classification, labels)?;

        let engine = OrtEngine::from_options(&options.base)?;
        let input_samples = match engine.input_shape(0) {
            Some([1, n]) if *n > 0 => *n as usize,
            Some(shape) => {
                return Err(TaskError::invalid_argument(format!(
                    "expected a static [1, N] waveform input, model declares {shape:?}"
                )));
            }
            None => {
                return Err(TaskError::invalid_argument(
                    "model declares no input tensor to size the audio buffer",
                ));
            }
        };
        tracing::debug!(
            model = %engine.model_name(),
            samples = input_samples,
            "audio classifier ready"
        );

        Ok(Self {
            engine,
            postprocessor,
            audio_format: options.audio_format,
            input_samples,
        })
    }

    /// Sample format input buffers must match.
    pub fn required_audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    /// Exact number of interleaved samples an input buffer must hold.
    pub fn required_input_buffer_size(&self) -> usize {
        self.input_samples
    }

    /// Classifies one audio clip.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the buffer's format or
    /// size does not match the model requirements, before any engine call.
    pub fn classify(&self, buffer: &AudioBuffer<'_>) -> TaskResult<ClassificationResult> {
        if buffer.format() != self.audio_format {
            return Err(TaskError::invalid_argument(format!(
                "buffer format {:?} does not match the required format {:?}",
                buffer.format(),
                self.audio_format
            )));
        }
        if buffer.samples().len() != self.input_samples {
            return Err(TaskError::invalid_argument(format!(
                "buffer holds {} sample(s), model requires exactly {}",
                buffer.samples().len(),
                self.input_samples
            )));
        }

        let tensor = Array2::from_shape_vec((1, self.input_samples), buffer.samples().to_vec())?
            .into_dyn();
        let outputs = self.engine.run_f32(&tensor)?;
        let scores = scores_from_tensor(outputs.primary()?)?;
        let classifications = self.postprocessor.process(&scores, 0)?;
        Ok(ClassificationResult {
            classifications: vec![classifications],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TaskError;

    #[test]
    fn test_zero_max_results_fails_before_model_load() {
        let options = AudioClassifierOptions::new("missing.onnx", AudioFormat::mono(16000))
            .with_max_results(0);
        let err = AudioClassifier::new(options).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let options = AudioClassifierOptions::new("missing.onnx", AudioFormat::mono(16000));
        let err = AudioClassifier::new(options).unwrap_err();
        assert!(matches!(err, TaskError::ModelLoad { .. }));
    }
}
