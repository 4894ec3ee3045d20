//! Encoding to the configured output codecs.

use crate::error::{ImageError, Result};
use crate::resize::output_file_name;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageOutputFormat, Rgb, RgbImage};
use imgtools_core::config::{EncodeConfig, EncodeFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// JPEG quality when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Background transparent pixels are composited over for JPEG output.
pub const JPEG_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Map a 0-9 compression level onto the PNG encoder presets.
pub fn png_compression(level: Option<u32>) -> CompressionType {
    match level {
        None => CompressionType::Default,
        Some(0..=3) => CompressionType::Fast,
        Some(4..=6) => CompressionType::Default,
        Some(_) => CompressionType::Best,
    }
}

/// Whether the image carries an alpha channel.
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Composite the image over an opaque background, dropping alpha.
pub fn flatten_alpha(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |channel: u8, bg: u8| {
            ((u32::from(channel) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

/// Encode `img` with the codec and options of `encoding`.
///
/// JPEG `progressive` and `optimize` flags are accepted by the configuration
/// but have no encoder counterpart; WebP output is lossless.
pub fn encode_image(img: &DynamicImage, encoding: &EncodeConfig) -> Result<Vec<u8>> {
    let format = encoding.format().ok_or_else(|| {
        ImageError::InvalidOutputFormat(format!("unsupported extension: {}", encoding.ext))
    })?;

    let mut buffer = Cursor::new(Vec::new());

    match format {
        EncodeFormat::Jpeg => {
            let quality = encoding
                .quality
                .map_or(DEFAULT_JPEG_QUALITY, |q| q.clamp(1, 100) as u8);
            let rgb = if has_alpha_channel(img) {
                flatten_alpha(img, JPEG_BACKGROUND)
            } else {
                img.to_rgb8()
            };
            DynamicImage::ImageRgb8(rgb).write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;
        }
        EncodeFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buffer,
                png_compression(encoding.compression),
                PngFilter::Adaptive,
            );
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
        }
        EncodeFormat::WebP => img.write_to(&mut buffer, ImageOutputFormat::WebP)?,
        EncodeFormat::Gif => img.write_to(&mut buffer, ImageOutputFormat::Gif)?,
    }

    Ok(buffer.into_inner())
}

/// Encode `img` and write it to `dir` as `{stem}_{width}x{height}.{ext}`.
pub fn write_encoded(
    img: &DynamicImage,
    dir: &Path,
    stem: &str,
    encoding: &EncodeConfig,
) -> Result<PathBuf> {
    let bytes = encode_image(img, encoding)
        .map_err(|e| ImageError::EncodeError(format!("{}: {e}", encoding.extension())))?;
    let path = dir.join(output_file_name(
        stem,
        img.width(),
        img.height(),
        &encoding.extension(),
    ));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 128])
        }))
    }

    #[test]
    fn test_png_compression_mapping() {
        assert!(matches!(png_compression(None), CompressionType::Default));
        assert!(matches!(png_compression(Some(0)), CompressionType::Fast));
        assert!(matches!(png_compression(Some(5)), CompressionType::Default));
        assert!(matches!(png_compression(Some(9)), CompressionType::Best));
    }

    #[test]
    fn test_flatten_alpha_white_background() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 255, 0, 128]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 0]));
        img.put_pixel(1, 1, Rgba([255, 255, 0, 255]));

        let flat = flatten_alpha(&DynamicImage::ImageRgba8(img), [255, 255, 255]);

        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(flat.get_pixel(0, 1), &Rgb([127, 255, 127]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 0]));
    }

    #[test]
    fn test_encode_round_trips_through_decoder() {
        let img = gradient(16, 8);
        for ext in ["jpg", "png", "gif"] {
            let bytes = encode_image(&img, &EncodeConfig::new(ext)).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 8), "{ext}");
        }
    }

    #[test]
    fn test_encode_webp_container() {
        let bytes = encode_image(&gradient(16, 8), &EncodeConfig::new("webp")).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_encode_jpeg_with_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let encoding = EncodeConfig {
            quality: Some(80),
            ..EncodeConfig::new("jpeg")
        };
        assert!(!encode_image(&img, &encoding).unwrap().is_empty());
    }

    #[test]
    fn test_encode_unknown_extension() {
        assert!(matches!(
            encode_image(&gradient(2, 2), &EncodeConfig::new("tiff")),
            Err(ImageError::InvalidOutputFormat(_))
        ));
    }

    #[test]
    fn test_write_encoded_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_encoded(&gradient(12, 6), dir.path(), "photo", &EncodeConfig::new(".PNG")).unwrap();
        assert_eq!(path, dir.path().join("photo_12x6.png"));
        assert!(path.exists());
    }
}
