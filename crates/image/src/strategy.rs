//! Upscale strategies and the per-image plan.

use crate::catalog::AvailableScales;
use crate::demand::{demand_table, scale_demand, DemandTable, ImageSize};
use crate::error::Result;
use crate::planner::{plan_for_demand, AutoPlan};
use imgtools_core::config::OutputFormatConfig;
use serde::{Deserialize, Serialize};

/// How upscale passes are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleStrategy {
    /// Repeat one model scale
    Fixed(u32),
    /// Compose passes from the available scales
    Auto(AvailableScales),
}

/// Upscale plan of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum UpscalePlan {
    /// Demands ordered by pass count, served by repeated passes of `model_scale`
    Fixed {
        /// Scale of every pass
        model_scale: u32,
        /// Demands sorted by `nb_upscale`
        table: DemandTable,
    },
    /// Annotated combination of scales
    Auto(AutoPlan),
}

impl UpscalePlan {
    /// Upscale passes executed for the image.
    pub fn passes(&self) -> u32 {
        match self {
            Self::Fixed { table, .. } => table.max_upscale,
            Self::Auto(plan) => plan.passes(),
        }
    }

    /// Whether any pass runs.
    pub fn needs_upscale(&self) -> bool {
        self.passes() > 0
    }
}

/// Demand table of the fixed strategy, in execution order (ascending `nb_upscale`).
pub fn count_discrete_upscales_for(
    size: ImageSize,
    formats: &[OutputFormatConfig],
    fixed_scale: u32,
) -> Result<DemandTable> {
    let mut table = demand_table(size, formats, fixed_scale)?;
    table.stats.sort_by_key(|d| d.nb_upscale);
    Ok(table)
}

/// Plan the passes for an image of `size`. Pure: no image is read.
pub fn compute_plan(
    size: ImageSize,
    formats: &[OutputFormatConfig],
    strategy: &ScaleStrategy,
) -> Result<UpscalePlan> {
    match strategy {
        ScaleStrategy::Fixed(model_scale) => Ok(UpscalePlan::Fixed {
            model_scale: *model_scale,
            table: count_discrete_upscales_for(size, formats, *model_scale)?,
        }),
        ScaleStrategy::Auto(available) => {
            let table = scale_demand(size, formats)?;
            plan_for_demand(&table, available).map(UpscalePlan::Auto)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;

    fn formats() -> Vec<OutputFormatConfig> {
        [1900, 200, 900]
            .into_iter()
            .map(OutputFormatConfig::width)
            .collect()
    }

    #[test]
    fn test_compute_plan_fixed() {
        let size = ImageSize::new(200, 400).unwrap();
        let plan = compute_plan(size, &formats(), &ScaleStrategy::Fixed(2)).unwrap();

        let UpscalePlan::Fixed { model_scale, table } = &plan else {
            panic!("expected a fixed plan");
        };
        assert_eq!(*model_scale, 2);
        let order: Vec<_> = table.stats.iter().map(|d| (d.key, d.nb_upscale)).collect();
        assert_eq!(order, vec![(1, 0), (2, 2), (0, 3)]);
        assert_eq!(plan.passes(), 3);
    }

    #[test]
    fn test_compute_plan_auto() {
        let size = ImageSize::new(200, 400).unwrap();
        let available = AvailableScales::new([2, 3, 4]).unwrap();
        let plan = compute_plan(size, &formats(), &ScaleStrategy::Auto(available)).unwrap();

        let UpscalePlan::Auto(auto) = &plan else {
            panic!("expected an auto plan");
        };
        assert_eq!(auto.max_x_scale, 5);
        assert_eq!(auto.used_scales.iter().sum::<u32>(), 5);
        assert!(plan.needs_upscale());
    }

    #[test]
    fn test_compute_plan_invalid_fixed_scale() {
        let size = ImageSize::new(200, 400).unwrap();
        assert!(matches!(
            compute_plan(size, &formats(), &ScaleStrategy::Fixed(1)),
            Err(ImageError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_plan_serializes_with_tag() {
        let size = ImageSize::new(200, 400).unwrap();
        let plan = compute_plan(size, &formats(), &ScaleStrategy::Fixed(2)).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["strategy"], "fixed");
        assert_eq!(json["model_scale"], 2);
    }
}
