//! Feature-vector result mapping.
//!
//! Embedding heads emit one tensor of `N` components per call. The mapper
//! optionally L2-normalizes the vector and optionally scalar-quantizes it
//! to signed bytes (round(value * 128), clamped to the i8 range).

use ndarray::ArrayD;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::options::EmbeddingOptions;

/// A feature vector extracted from an embedding head.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Float components, after optional L2-normalization.
    pub values: Vec<f32>,
    /// Scalar-quantized components, present when quantization was requested.
    pub quantized: Option<Vec<i8>>,
}

impl FeatureVector {
    /// Number of components.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Computes cosine similarity with another feature vector.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the vectors are empty,
    /// have different sizes, or either has a zero norm.
    pub fn cosine_similarity(&self, other: &FeatureVector) -> TaskResult<f64> {
        if self.values.is_empty() || other.values.is_empty() {
            return Err(TaskError::invalid_argument(
                "cannot compute cosine similarity on empty feature vectors",
            ));
        }
        if self.values.len() != other.values.len() {
            return Err(TaskError::invalid_argument(format!(
                "cannot compute cosine similarity on feature vectors of different sizes ({} vs {})",
                self.values.len(),
                other.values.len()
            )));
        }
        let mut dot = 0.0f64;
        let mut norm_u = 0.0f64;
        let mut norm_v = 0.0f64;
        for (&u, &v) in self.values.iter().zip(&other.values) {
            dot += u as f64 * v as f64;
            norm_u += (u as f64).powi(2);
            norm_v += (v as f64).powi(2);
        }
        if norm_u <= 0.0 || norm_v <= 0.0 {
            return Err(TaskError::invalid_argument(
                "cannot compute cosine similarity on feature vectors with zero norm",
            ));
        }
        Ok(dot / (norm_u * norm_v).sqrt())
    }

    /// Computes the squared L2 distance to another feature vector of the
    /// same size.
    pub fn squared_l2_distance(&self, other: &[f32]) -> f32 {
        self.values
            .iter()
            .zip(other)
            .map(|(u, v)| (u - v) * (u - v))
            .sum()
    }
}

/// Maps raw embedding tensors to [`FeatureVector`]s.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingPostprocessor {
    options: EmbeddingOptions,
}

impl EmbeddingPostprocessor {
    /// Creates a postprocessor with the given options.
    pub fn new(options: EmbeddingOptions) -> Self {
        Self { options }
    }

    /// Maps one head's output tensor (`[1, N]`, `[1, 1, 1, N]` or `[N]`)
    /// to a feature vector.
    pub fn process(&self, tensor: &ArrayD<f32>) -> TaskResult<FeatureVector> {
        match tensor.shape() {
            [_] | [1, _] | [1, 1, 1, _] => {}
            shape => {
                return Err(TaskError::post_processing_message(format!(
                    "expected a [1, N] embedding tensor, got shape {shape:?}"
                )));
            }
        }

        let mut values: Vec<f32> = tensor.iter().copied().collect();
        if values.is_empty() {
            return Err(TaskError::post_processing_message(
                "embedding head produced an empty tensor",
            ));
        }

        if self.options.l2_normalize {
            let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in values.iter_mut() {
                    *value /= norm;
                }
            }
        }

        let quantized = self.options.quantize.then(|| {
            values
                .iter()
                .map(|&v| (v * 128.0).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8)
                .collect()
        });

        Ok(FeatureVector { values, quantized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn tensor(shape: &[usize], data: Vec<f32>) -> ArrayD<f32> {
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }

    #[test]
    fn test_passthrough_without_options() {
        let post = EmbeddingPostprocessor::new(EmbeddingOptions::default());
        let vector = post.process(&tensor(&[1, 3], vec![3.0, 0.0, 4.0])).unwrap();
        assert_eq!(vector.values, vec![3.0, 0.0, 4.0]);
        assert!(vector.quantized.is_none());
    }

    #[test]
    fn test_l2_normalization() {
        let post = EmbeddingPostprocessor::new(EmbeddingOptions {
            l2_normalize: true,
            quantize: false,
        });
        let vector = post.process(&tensor(&[1, 2], vec![3.0, 4.0])).unwrap();
        assert!((vector.values[0] - 0.6).abs() < 1e-6);
        assert!((vector.values[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_quantization_clamps_to_i8() {
        let post = EmbeddingPostprocessor::new(EmbeddingOptions {
            l2_normalize: false,
            quantize: true,
        });
        let vector = post
            .process(&tensor(&[3], vec![0.5, 1.5, -1.5]))
            .unwrap();
        assert_eq!(vector.quantized, Some(vec![64, 127, -128]));
    }

    #[test]
    fn test_rejects_batched_shapes() {
        let post = EmbeddingPostprocessor::new(EmbeddingOptions::default());
        assert!(post.process(&tensor(&[2, 3], vec![0.0; 6])).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        let u = FeatureVector {
            values: vec![1.0, 0.0],
            quantized: None,
        };
        let v = FeatureVector {
            values: vec![0.0, 1.0],
            quantized: None,
        };
        assert!((u.cosine_similarity(&u).unwrap() - 1.0).abs() < 1e-9);
        assert!(u.cosine_similarity(&v).unwrap().abs() < 1e-9);

        let zero = FeatureVector {
            values: vec![0.0, 0.0],
            quantized: None,
        };
        assert!(u.cosine_similarity(&zero).is_err());
    }

    #[test]
    fn test_squared_l2_distance() {
        let u = FeatureVector {
            values: vec![1.0, 2.0],
            quantized: None,
        };
        assert_eq!(u.squared_l2_distance(&[1.0, 2.0]), 0.0);
        assert_eq!(u.squared_l2_distance(&[0.0, 0.0]), 5.0);
    }
}
