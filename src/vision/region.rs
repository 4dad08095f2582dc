//! Axis-aligned rectangles and region-of-interest handling.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::core::errors::{TaskError, TaskResult};

/// An axis-aligned rectangle in input-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    /// Rectangle width.
    pub width: f32,
    /// Rectangle height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle covering a full frame of the given dimensions.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// X coordinate one past the right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Y coordinate one past the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns true when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Clamps the rectangle to lie within `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        let x1 = self.x.clamp(0.0, width);
        let y1 = self.y.clamp(0.0, height);
        let x2 = self.right().clamp(0.0, width);
        let y2 = self.bottom().clamp(0.0, height);
        Self::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }

    /// Validates this rectangle as a region of interest for an image.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the region is empty or
    /// does not lie fully within the image bounds. Checked before any
    /// inference call.
    pub fn validate_roi(&self, image_width: u32, image_height: u32) -> TaskResult<()> {
        if self.is_empty() {
            return Err(TaskError::invalid_argument(
                "region of interest must have a positive width and height",
            ));
        }
        if self.x < 0.0
            || self.y < 0.0
            || self.right() > image_width as f32
            || self.bottom() > image_height as f32
        {
            return Err(TaskError::invalid_argument(format!(
                "region of interest ({}, {}, {}x{}) exceeds image bounds {}x{}",
                self.x, self.y, self.width, self.height, image_width, image_height
            )));
        }
        Ok(())
    }
}

/// Crops the region of interest out of an image.
///
/// The region must have been validated against the image beforehand.
pub fn crop_region(image: &RgbImage, region: &Rect) -> RgbImage {
    let x = region.x.max(0.0) as u32;
    let y = region.y.max(0.0) as u32;
    let width = (region.width as u32).clamp(1, image.width().saturating_sub(x).max(1));
    let height = (region.height as u32).clamp(1, image.height().saturating_sub(y).max(1));
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame() {
        let rect = Rect::full_frame(640, 480);
        assert_eq!(rect.right(), 640.0);
        assert_eq!(rect.bottom(), 480.0);
        assert!(!rect.is_empty());
    }

    #[test]
    fn test_clamp_to_bounds() {
        let rect = Rect::new(-10.0, 20.0, 700.0, 500.0).clamp_to(640.0, 480.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.right(), 640.0);
        assert_eq!(rect.bottom(), 480.0);
    }

    #[test]
    fn test_roi_validation() {
        assert!(Rect::new(0.0, 0.0, 100.0, 100.0).validate_roi(640, 480).is_ok());
        assert!(
            Rect::new(600.0, 0.0, 100.0, 100.0)
                .validate_roi(640, 480)
                .is_err()
        );
        assert!(Rect::new(0.0, 0.0, 0.0, 100.0).validate_roi(640, 480).is_err());
        assert!(
            Rect::new(-1.0, 0.0, 100.0, 100.0)
                .validate_roi(640, 480)
                .is_err()
        );
    }

    #[test]
    fn test_crop_region_size() {
        let image = RgbImage::new(64, 48);
        let crop = crop_region(&image, &Rect::new(8.0, 8.0, 16.0, 24.0));
        assert_eq!(crop.width(), 16);
        assert_eq!(crop.height(), 24);
    }
}
