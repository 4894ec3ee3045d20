//! Upscaling by an exact integer factor.

use crate::catalog::{AvailableScales, ModelCatalog};
use crate::error::{ImageError, Result};
use image::imageops::FilterType;
use image::DynamicImage;

/// Enlarges an image by an exact integer factor.
///
/// Implementations may hold per-thread state (a loaded model, scratch
/// buffers), hence `&mut self`. Batch processing builds one per worker.
pub trait Upscaler {
    /// Return `image` enlarged `scale` times in both dimensions.
    fn upscale(&mut self, image: &DynamicImage, scale: u32) -> Result<DynamicImage>;
}

impl<U: Upscaler + ?Sized> Upscaler for Box<U> {
    fn upscale(&mut self, image: &DynamicImage, scale: u32) -> Result<DynamicImage> {
        (**self).upscale(image, scale)
    }
}

/// Resampling upscaler restricted to the scales of a model catalog.
#[derive(Debug, Clone)]
pub struct ResampleUpscaler {
    scales: AvailableScales,
    filter: FilterType,
}

impl ResampleUpscaler {
    /// Upscaler accepting the given scales, resampling with Lanczos3.
    pub fn new(scales: AvailableScales) -> Self {
        Self {
            scales,
            filter: FilterType::Lanczos3,
        }
    }

    /// Upscaler accepting the scales found in `catalog`.
    pub fn from_catalog(catalog: &ModelCatalog) -> Self {
        Self::new(catalog.available_scales())
    }

    /// Use another resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Upscaler for ResampleUpscaler {
    fn upscale(&mut self, image: &DynamicImage, scale: u32) -> Result<DynamicImage> {
        if !self.scales.contains(scale) {
            return Err(ImageError::InvalidScale(format!(
                "no model for scale {} (available: {:?})",
                scale,
                self.scales.as_slice()
            )));
        }

        let (width, height) = (image.width(), image.height());
        match (width.checked_mul(scale), height.checked_mul(scale)) {
            (Some(w), Some(h)) => Ok(image.resize_exact(w, h, self.filter)),
            _ => Err(ImageError::InvalidScale(format!(
                "x{scale} overflows {width}x{height}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn upscaler() -> ResampleUpscaler {
        ResampleUpscaler::new(AvailableScales::new([2, 3]).unwrap())
    }

    #[test]
    fn test_upscale_exact_factor() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(7, 5));
        let out = upscaler().upscale(&image, 3).unwrap();
        assert_eq!((out.width(), out.height()), (21, 15));
    }

    #[test]
    fn test_upscale_unknown_scale() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(7, 5));
        assert!(matches!(
            upscaler().upscale(&image, 4),
            Err(ImageError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_boxed_upscaler() {
        let mut boxed: Box<dyn Upscaler> = Box::new(upscaler().with_filter(FilterType::Nearest));
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let out = boxed.upscale(&image, 2).unwrap();
        assert_eq!(out.width(), 4);
    }
}
