//! Image preprocessing for vision tasks.
//!
//! Inputs of any size are resized (bilinear, aspect ratio not preserved)
//! to the model's input dimensions, normalized per channel and laid out as
//! a `[1, 3, H, W]` f32 tensor.

use image::RgbImage;
use image::imageops::FilterType;
use ndarray::{Array4, ArrayD};

use crate::core::errors::{TaskError, TaskResult};
use crate::core::inference::OrtEngine;

/// Resizes and normalizes images into model input tensors.
///
/// Normalization applies `value * alpha + beta` per channel, where
/// `alpha = scale / std` and `beta = -mean / std`, matching the usual
/// preprocessing attached to image models.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    target_width: u32,
    target_height: u32,
    alpha: [f32; 3],
    beta: [f32; 3],
}

impl ImagePreprocessor {
    /// Creates a preprocessor that only rescales pixel values to `[0, 1]`.
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            alpha: [1.0 / 255.0; 3],
            beta: [0.0; 3],
        }
    }

    /// Creates a preprocessor with per-channel mean/std normalization.
    ///
    /// # Arguments
    ///
    /// * `scale` - Applied to raw pixel values before mean subtraction,
    ///   typically `1/255`.
    /// * `mean`, `std` - Per-channel normalization parameters.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when `scale` or any `std`
    /// entry is not strictly positive.
    pub fn with_normalization(
        target_width: u32,
        target_height: u32,
        scale: f32,
        mean: [f32; 3],
        std: [f32; 3],
    ) -> TaskResult<Self> {
        if scale <= 0.0 {
            return Err(TaskError::invalid_argument(
                "normalization scale must be greater than 0",
            ));
        }
        if std.iter().any(|&s| s <= 0.0) {
            return Err(TaskError::invalid_argument(
                "normalization std values must be greater than 0",
            ));
        }
        let mut alpha = [0.0; 3];
        let mut beta = [0.0; 3];
        for channel in 0..3 {
            alpha[channel] = scale / std[channel];
            beta[channel] = -mean[channel] / std[channel];
        }
        Ok(Self {
            target_width,
            target_height,
            alpha,
            beta,
        })
    }

    /// Creates a preprocessor sized from the engine's first input.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the model does not declare
    /// a static `[1, 3, H, W]` input.
    pub fn from_engine(engine: &OrtEngine) -> TaskResult<Self> {
        let shape = engine.input_shape(0).ok_or_else(|| {
            TaskError::invalid_argument("model declares no input tensor to size the preprocessor")
        })?;
        match shape {
            [1, 3, h, w] if *h > 0 && *w > 0 => Ok(Self::new(*w as u32, *h as u32)),
            _ => Err(TaskError::invalid_argument(format!(
                "expected a static [1, 3, H, W] image input, model declares {shape:?}"
            ))),
        }
    }

    /// Target width of the produced tensor.
    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Target height of the produced tensor.
    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Resizes and normalizes one image into a `[1, 3, H, W]` tensor.
    pub fn process(&self, image: &RgbImage) -> TaskResult<ArrayD<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(TaskError::invalid_argument(
                "input image must have a positive width and height",
            ));
        }
        let resized = if image.width() == self.target_width && image.height() == self.target_height
        {
            image.clone()
        } else {
            image::imageops::resize(
                image,
                self.target_width,
                self.target_height,
                FilterType::Triangle,
            )
        };

        let (width, height) = (self.target_width as usize, self.target_height as usize);
        let mut tensor = Array4::<f32>::zeros((1, 3, height, width));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] =
                    pixel.0[channel] as f32 * self.alpha[channel] + self.beta[channel];
            }
        }
        Ok(tensor.into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_shape_is_nchw() {
        let pre = ImagePreprocessor::new(8, 4);
        let image = RgbImage::new(32, 32);
        let tensor = pre.process(&image).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 4, 8]);
    }

    #[test]
    fn test_default_scaling_to_unit_range() {
        let pre = ImagePreprocessor::new(1, 1);
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 127]));
        let tensor = pre.process(&image).unwrap();
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 127.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_std_normalization() {
        let pre =
            ImagePreprocessor::with_normalization(1, 1, 1.0 / 255.0, [0.5, 0.5, 0.5], [0.5, 0.5, 0.5])
                .unwrap();
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([255, 255, 255]));
        let tensor = pre.process(&image).unwrap();
        // (1.0 - 0.5) / 0.5 == 1.0
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_normalization_rejected() {
        assert!(
            ImagePreprocessor::with_normalization(1, 1, 0.0, [0.0; 3], [1.0; 3]).is_err()
        );
        assert!(
            ImagePreprocessor::with_normalization(1, 1, 1.0, [0.0; 3], [0.0; 3]).is_err()
        );
    }

    #[test]
    fn test_empty_image_rejected() {
        let pre = ImagePreprocessor::new(8, 8);
        let image = RgbImage::new(0, 0);
        assert!(pre.process(&image).is_err());
    }
}
