//! Size demand analysis.
//!
//! For every output format, how far the source must be enlarged: the smallest
//! integer multiplier meeting the format's bounds (`x_scale`) and, for a fixed
//! model scale, the number of discrete upscale passes (`nb_upscale`).

use crate::error::{ImageError, Result};
use imgtools_core::config::OutputFormatConfig;
use serde::{Deserialize, Serialize};

/// Image dimensions, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Height in pixels
    pub height: u32,
    /// Width in pixels
    pub width: u32,
}

impl ImageSize {
    /// Create a size, rejecting zero dimensions.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        check_dimensions(height, width)?;
        Ok(Self { height, width })
    }
}

/// Target bounds of an output format, resolved against a source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeBounds {
    /// Height bound
    pub height: Option<u32>,
    /// Width bound
    pub width: Option<u32>,
}

impl SizeBounds {
    /// Resolve `fixed_size` to both bounds and `fixed_scale` to `(h·k, w·k)`.
    pub fn for_format(format: &OutputFormatConfig, size: ImageSize) -> Self {
        if let Some(scale) = format.fixed_scale {
            return Self {
                height: Some(size.height.saturating_mul(scale)),
                width: Some(size.width.saturating_mul(scale)),
            };
        }
        Self {
            height: format.bound_height(),
            width: format.bound_width(),
        }
    }

    /// No bound at all: the format keeps the source size.
    pub fn is_unbounded(&self) -> bool {
        self.height.is_none() && self.width.is_none()
    }
}

/// Enlargement needed by one output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpscaleDemand {
    /// Index into the output format list
    pub key: usize,
    /// Smallest integer multiplier meeting the bounds, 0 when none is needed
    pub x_scale: u32,
    /// Passes of the fixed model scale, 0 outside the fixed strategy
    pub nb_upscale: u32,
}

/// Demands of every output format, sorted by `x_scale`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemandTable {
    /// Largest `nb_upscale`
    pub max_upscale: u32,
    /// Largest `x_scale`
    pub max_x_scale: u32,
    /// Per-format demands
    pub stats: Vec<UpscaleDemand>,
}

impl DemandTable {
    fn from_stats(mut stats: Vec<UpscaleDemand>) -> Self {
        stats.sort_by_key(|d| d.x_scale);
        Self {
            max_upscale: stats.iter().map(|d| d.nb_upscale).max().unwrap_or(0),
            max_x_scale: stats.iter().map(|d| d.x_scale).max().unwrap_or(0),
            stats,
        }
    }

    /// `x_scale` column, in table order.
    pub fn x_scales(&self) -> Vec<u32> {
        self.stats.iter().map(|d| d.x_scale).collect()
    }
}

fn check_dimensions(height: u32, width: u32) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(ImageError::InvalidDimension { height, width });
    }
    Ok(())
}

fn exceeds(height: u64, width: u64, fixed_height: Option<u32>, fixed_width: Option<u32>) -> bool {
    fixed_width.is_some_and(|fw| u64::from(fw) > width)
        || fixed_height.is_some_and(|fh| u64::from(fh) > height)
}

/// Whether any present bound is larger than the matching dimension.
pub fn needs_enlargement(
    height: u32,
    width: u32,
    fixed_height: Option<u32>,
    fixed_width: Option<u32>,
) -> Result<bool> {
    check_dimensions(height, width)?;
    Ok(exceeds(
        u64::from(height),
        u64::from(width),
        fixed_height,
        fixed_width,
    ))
}

/// Smallest integer multiplier making the image meet its bounds, 0 if it already does.
///
/// When both bounds exceed the image the smaller ratio wins: the result is then
/// downscaled to fit, so meeting one bound is enough.
///
/// # Example
/// ```
/// use imgtools_image::required_multiplier;
///
/// assert_eq!(required_multiplier(200, 400, None, Some(1900)).unwrap(), 5);
/// assert_eq!(required_multiplier(200, 400, None, Some(200)).unwrap(), 0);
/// ```
pub fn required_multiplier(
    height: u32,
    width: u32,
    fixed_height: Option<u32>,
    fixed_width: Option<u32>,
) -> Result<u32> {
    check_dimensions(height, width)?;

    let by_width = fixed_width.filter(|&fw| fw > width).map(|fw| fw.div_ceil(width));
    let by_height = fixed_height
        .filter(|&fh| fh > height)
        .map(|fh| fh.div_ceil(height));

    Ok(match (by_width, by_height) {
        (Some(w), Some(h)) => w.min(h),
        (Some(w), None) => w,
        (None, Some(h)) => h,
        (None, None) => 0,
    })
}

/// Passes of `model_scale` needed before the image meets its bounds.
pub fn count_discrete_upscales(
    height: u32,
    width: u32,
    model_scale: u32,
    fixed_height: Option<u32>,
    fixed_width: Option<u32>,
) -> Result<u32> {
    check_dimensions(height, width)?;
    if model_scale < 2 {
        return Err(ImageError::InvalidScale(format!(
            "model scale must be at least 2, got {model_scale}"
        )));
    }

    // Bounds fit in u32, so a factor >= 2 ends this within 32 passes.
    let (mut h, mut w) = (u64::from(height), u64::from(width));
    let mut passes = 0;
    while exceeds(h, w, fixed_height, fixed_width) {
        h *= u64::from(model_scale);
        w *= u64::from(model_scale);
        passes += 1;
    }
    Ok(passes)
}

fn ensure_formats(formats: &[OutputFormatConfig]) -> Result<()> {
    if formats.is_empty() {
        return Err(ImageError::InvalidOutputFormat(
            "at least one output format is required".to_string(),
        ));
    }
    Ok(())
}

/// Demand table for the fixed strategy: multiplier and pass count per format.
pub fn demand_table(
    size: ImageSize,
    formats: &[OutputFormatConfig],
    model_scale: u32,
) -> Result<DemandTable> {
    ensure_formats(formats)?;

    let stats = formats
        .iter()
        .enumerate()
        .map(|(key, format)| {
            let bounds = SizeBounds::for_format(format, size);
            Ok(UpscaleDemand {
                key,
                x_scale: required_multiplier(size.height, size.width, bounds.height, bounds.width)?,
                nb_upscale: count_discrete_upscales(
                    size.height,
                    size.width,
                    model_scale,
                    bounds.height,
                    bounds.width,
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DemandTable::from_stats(stats))
}

/// Demand table for the automatic strategy: multipliers only.
pub fn scale_demand(size: ImageSize, formats: &[OutputFormatConfig]) -> Result<DemandTable> {
    ensure_formats(formats)?;

    let stats = formats
        .iter()
        .enumerate()
        .map(|(key, format)| {
            let bounds = SizeBounds::for_format(format, size);
            Ok(UpscaleDemand {
                key,
                x_scale: required_multiplier(size.height, size.width, bounds.height, bounds.width)?,
                nb_upscale: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DemandTable::from_stats(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn widths(values: &[u32]) -> Vec<OutputFormatConfig> {
        values.iter().map(|&w| OutputFormatConfig::width(w)).collect()
    }

    #[test]
    fn test_needs_enlargement() {
        assert!(needs_enlargement(23, 22, None, Some(25)).unwrap());
        assert!(needs_enlargement(23, 22, Some(25), None).unwrap());
        assert!(needs_enlargement(23, 22, Some(25), Some(25)).unwrap());

        assert!(!needs_enlargement(23, 22, None, None).unwrap());
        assert!(!needs_enlargement(23, 22, None, Some(18)).unwrap());
        assert!(!needs_enlargement(23, 22, Some(18), None).unwrap());
        assert!(!needs_enlargement(23, 22, Some(18), Some(15)).unwrap());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            needs_enlargement(0, 22, None, Some(25)),
            Err(ImageError::InvalidDimension { height: 0, width: 22 })
        ));
        assert!(required_multiplier(10, 0, None, None).is_err());
        assert!(ImageSize::new(0, 0).is_err());
    }

    #[test]
    fn test_required_multiplier() {
        assert_eq!(required_multiplier(200, 400, None, Some(1900)).unwrap(), 5);
        assert_eq!(required_multiplier(200, 500, Some(1600), Some(1600)).unwrap(), 4);
        assert_eq!(required_multiplier(200, 300, Some(800), Some(1200)).unwrap(), 4);
        assert_eq!(required_multiplier(200, 300, Some(350), Some(200)).unwrap(), 2);
        assert_eq!(required_multiplier(200, 500, Some(600), None).unwrap(), 3);
        assert_eq!(required_multiplier(200, 400, None, Some(200)).unwrap(), 0);
    }

    #[test]
    fn test_count_discrete_upscales() {
        assert_eq!(count_discrete_upscales(200, 400, 3, None, Some(1900)).unwrap(), 2);
        assert_eq!(count_discrete_upscales(200, 500, 2, Some(1600), None).unwrap(), 3);
        assert_eq!(count_discrete_upscales(200, 300, 4, Some(800), Some(1200)).unwrap(), 1);
        assert_eq!(count_discrete_upscales(200, 300, 2, Some(350), Some(200)).unwrap(), 1);
        assert_eq!(count_discrete_upscales(200, 500, 2, Some(600), None).unwrap(), 2);
        assert_eq!(count_discrete_upscales(200, 400, 2, None, Some(200)).unwrap(), 0);
    }

    #[test]
    fn test_count_discrete_upscales_invalid_scale() {
        for scale in [0, 1] {
            assert!(matches!(
                count_discrete_upscales(200, 400, scale, None, Some(1900)),
                Err(ImageError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_count_discrete_upscales_huge_bound() {
        let passes = count_discrete_upscales(1, 1, 2, Some(u32::MAX), Some(u32::MAX)).unwrap();
        assert_eq!(passes, 32);
    }

    #[test]
    fn test_demand_table_fixed() {
        let size = ImageSize::new(200, 400).unwrap();
        let table = demand_table(size, &widths(&[1900, 1600, 1200, 900, 600, 200]), 2).unwrap();

        assert_eq!(table.max_upscale, 3);
        assert_eq!(table.max_x_scale, 5);
        assert_eq!(table.stats.len(), 6);
        assert_eq!(table.x_scales(), vec![0, 2, 3, 3, 4, 5]);

        let widest = table.stats.iter().find(|d| d.key == 0).unwrap();
        assert_eq!((widest.x_scale, widest.nb_upscale), (5, 3));
        let smallest = table.stats.iter().find(|d| d.key == 5).unwrap();
        assert_eq!((smallest.x_scale, smallest.nb_upscale), (0, 0));
    }

    #[test]
    fn test_demand_table_no_enlargement() {
        let size = ImageSize::new(200, 400).unwrap();
        let mut formats = widths(&[350, 200]);
        formats.push(OutputFormatConfig::height(150));
        formats.push(OutputFormatConfig {
            fixed_size: Some(100),
            ..OutputFormatConfig::default()
        });

        let table = demand_table(size, &formats, 2).unwrap();
        assert_eq!(table.max_upscale, 0);
        assert_eq!(table.max_x_scale, 0);
        assert_eq!(table.stats.iter().map(|d| d.key).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fixed_scale_bounds() {
        let size = ImageSize::new(200, 400).unwrap();
        let format = OutputFormatConfig {
            fixed_scale: Some(3),
            ..OutputFormatConfig::default()
        };
        assert_eq!(
            SizeBounds::for_format(&format, size),
            SizeBounds { height: Some(600), width: Some(1200) }
        );

        let table = demand_table(size, &[format], 2).unwrap();
        assert_eq!(table.stats[0].x_scale, 3);
        assert_eq!(table.stats[0].nb_upscale, 2);
    }

    #[test]
    fn test_scale_demand_has_no_passes() {
        let size = ImageSize::new(200, 400).unwrap();
        let table = scale_demand(size, &widths(&[1900, 200])).unwrap();
        assert_eq!(table.max_upscale, 0);
        assert_eq!(table.max_x_scale, 5);
        assert_eq!(table.stats[0], UpscaleDemand { key: 1, x_scale: 0, nb_upscale: 0 });
        assert_eq!(table.stats[1], UpscaleDemand { key: 0, x_scale: 5, nb_upscale: 0 });
    }

    #[test]
    fn test_empty_formats_rejected() {
        let size = ImageSize::new(200, 400).unwrap();
        assert!(matches!(
            scale_demand(size, &[]),
            Err(ImageError::InvalidOutputFormat(_))
        ));
    }

    proptest! {
        #[test]
        fn enlargement_iff_positive_multiplier(
            height in 1u32..5000,
            width in 1u32..5000,
            fixed_height in prop::option::of(1u32..20000),
            fixed_width in prop::option::of(1u32..20000),
        ) {
            let needed = needs_enlargement(height, width, fixed_height, fixed_width).unwrap();
            let multiplier = required_multiplier(height, width, fixed_height, fixed_width).unwrap();
            prop_assert_eq!(needed, multiplier > 0);
        }

        #[test]
        fn passes_meet_the_bounds(
            height in 1u32..2000,
            width in 1u32..2000,
            scale in 2u32..5,
            fixed_width in 1u32..20000,
        ) {
            let passes = count_discrete_upscales(height, width, scale, None, Some(fixed_width)).unwrap();
            let reached = u64::from(width) * u64::from(scale).pow(passes);
            prop_assert!(reached >= u64::from(fixed_width));
            if passes > 0 {
                prop_assert!(reached / u64::from(scale) < u64::from(fixed_width));
            }
        }
    }
}
