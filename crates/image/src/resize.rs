//! Downscaling to output bounds.

use crate::demand::SizeBounds;
use image::imageops::FilterType;
use image::DynamicImage;
use std::borrow::Cow;

fn shrink_to_width(width: u32, height: u32, target: u32) -> (u32, u32) {
    if target >= width {
        return (width, height);
    }
    let ratio = f64::from(target) / f64::from(width);
    let new_height = (f64::from(height) * ratio).round() as u32;
    (target, new_height.max(1))
}

fn shrink_to_height(width: u32, height: u32, target: u32) -> (u32, u32) {
    let (new_height, new_width) = shrink_to_width(height, width, target);
    (new_width, new_height)
}

/// Dimensions `(width, height)` after shrinking to the bounds, aspect ratio kept.
///
/// With both bounds the smaller shrink wins, so the result covers both bounds
/// and hits one of them exactly. The side is chosen by the ratios to the
/// image, never by comparing the bounds with each other: 1600x800 with
/// width 1000 and height 300 gives 1000x500, not 600x300. Never enlarges.
///
/// # Example
/// ```
/// use imgtools_image::{fit_dimensions, SizeBounds};
///
/// let bounds = SizeBounds { height: None, width: Some(800) };
/// assert_eq!(fit_dimensions(4000, 3000, bounds), (800, 600));
/// ```
pub fn fit_dimensions(width: u32, height: u32, bounds: SizeBounds) -> (u32, u32) {
    match (bounds.width, bounds.height) {
        // fw / width >= fh / height, compared without rounding
        (Some(fw), Some(fh)) if u64::from(fw) * u64::from(height) >= u64::from(fh) * u64::from(width) => {
            shrink_to_width(width, height, fw)
        }
        (Some(fw), None) => shrink_to_width(width, height, fw),
        (_, Some(fh)) => shrink_to_height(width, height, fh),
        (None, None) => (width, height),
    }
}

/// Shrink `image` to the bounds with Lanczos3, borrowing it when already small enough.
pub fn downscale_to_bounds(image: &DynamicImage, bounds: SizeBounds) -> Cow<'_, DynamicImage> {
    let (width, height) = fit_dimensions(image.width(), image.height(), bounds);
    if (width, height) == (image.width(), image.height()) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// Output file name: `{stem}_{width}x{height}.{ext}`.
pub fn output_file_name(stem: &str, width: u32, height: u32, ext: &str) -> String {
    format!("{stem}_{width}x{height}.{ext}")
}
