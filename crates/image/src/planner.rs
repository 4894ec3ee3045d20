//! Scale combination planning for the automatic strategy.
//!
//! The planner picks an ordered sequence of model scales whose running total
//! reaches every format's `x_scale`, then annotates the demand table with the
//! pass that serves each format. Scales accumulate additively, which stays
//! below the true (multiplicative) enlargement for factors >= 2, so every
//! format is at least as large as requested and the overshoot is downscaled.

use crate::catalog::AvailableScales;
use crate::combination::all_minimal_compositions;
use crate::demand::{DemandTable, UpscaleDemand};
use crate::error::{ImageError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Most passes allowed between two consecutive demands.
pub const MAX_STEPS_BETWEEN_DEMANDS: u32 = 20;

/// One record of a plan trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Scale applied by this step, 0 for a reuse of the current image
    pub scale: u32,
    /// 1 if a pass runs, 0 otherwise
    pub nb_upscale: u32,
    /// Running total after the step
    pub actual_scale: u32,
    /// `actual_scale` minus the demanded `x_scale`
    pub dif_scale: i64,
}

/// Aggregate score of a plan trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Largest overshoot over a demand
    pub max_overshoot: i64,
    /// Final running total
    pub max_actual_scale: u32,
    /// Passes executed
    pub total_steps: u32,
}

impl PlanSummary {
    /// Sum of the components, lower is better.
    ///
    /// Heuristic ranking: the lowest score is not guaranteed to be the
    /// globally best plan, only the one this crate has always chosen.
    pub fn score(&self) -> i64 {
        self.max_overshoot + i64::from(self.max_actual_scale) + i64::from(self.total_steps)
    }
}

/// Candidate chosen by [`select_best_combination`] with its trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCombination {
    /// Ordered scales
    pub combination: Vec<u32>,
    /// Trace against the demands
    pub steps: Vec<PlanStep>,
    /// Score components
    pub summary: PlanSummary,
}

/// A demand table row annotated with the pass that serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Output format index, `None` for an intermediate checkpoint
    pub key: Option<usize>,
    /// Demanded multiplier
    pub x_scale: u32,
    /// 1 if a pass runs at this entry
    pub nb_upscale: u32,
    /// Scale of that pass
    pub scale: u32,
    /// Running total once the entry is reached
    pub actual_scale: u32,
    /// `actual_scale - x_scale`
    pub dif_scale: i64,
}

impl PlanEntry {
    fn annotated(demand: &UpscaleDemand, step: &PlanStep) -> Self {
        Self {
            key: Some(demand.key),
            x_scale: demand.x_scale,
            nb_upscale: step.nb_upscale,
            scale: step.scale,
            actual_scale: step.actual_scale,
            dif_scale: step.dif_scale,
        }
    }

    fn checkpoint(step: &PlanStep) -> Self {
        Self {
            key: None,
            x_scale: step.actual_scale,
            nb_upscale: step.nb_upscale,
            scale: step.scale,
            actual_scale: step.actual_scale,
            dif_scale: step.dif_scale,
        }
    }

    /// Intermediate pass with no output format attached.
    pub fn is_checkpoint(&self) -> bool {
        self.key.is_none()
    }
}

/// Plan of the automatic strategy for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPlan {
    /// Largest demanded multiplier
    pub max_x_scale: u32,
    /// Total the combination was composed for, above `max_x_scale` when that is unreachable
    pub target_scale: u32,
    /// Scales of the executed passes, in order
    pub used_scales: Vec<u32>,
    /// Score of the chosen combination, `None` when nothing is enlarged
    pub summary: Option<PlanSummary>,
    /// Annotated demand table, checkpoints included
    pub entries: Vec<PlanEntry>,
}

impl AutoPlan {
    fn passthrough(table: &DemandTable) -> Self {
        Self {
            max_x_scale: 0,
            target_scale: 0,
            used_scales: Vec::new(),
            summary: None,
            entries: table
                .stats
                .iter()
                .map(|d| PlanEntry {
                    key: Some(d.key),
                    x_scale: d.x_scale,
                    nb_upscale: 0,
                    scale: 0,
                    actual_scale: 0,
                    dif_scale: 0,
                })
                .collect(),
        }
    }

    /// Number of upscale passes the plan runs.
    pub fn passes(&self) -> u32 {
        self.entries.iter().map(|e| e.nb_upscale).sum()
    }
}

/// Minimal compositions of `max_x_scale` from the available scales.
///
/// `None` when nothing is enlarged or no scale is available, `Some(vec![])`
/// when the total cannot be composed.
pub fn best_combinations(max_x_scale: u32, available: &[u32]) -> Result<Option<Vec<Vec<u32>>>> {
    if max_x_scale == 0 || available.is_empty() {
        return Ok(None);
    }
    all_minimal_compositions(max_x_scale, available).map(Some)
}

fn next_step(
    cursor: &mut std::slice::Iter<'_, u32>,
    actual_scale: &mut u32,
    x_scale: u32,
    combination: &[u32],
) -> Result<PlanStep> {
    let scale = *cursor.next().ok_or_else(|| {
        ImageError::CombinationExhausted(format!(
            "combination {combination:?} stops at {actual_scale} before reaching x{x_scale}"
        ))
    })?;
    *actual_scale += scale;
    Ok(PlanStep {
        scale,
        nb_upscale: 1,
        actual_scale: *actual_scale,
        dif_scale: i64::from(*actual_scale) - i64::from(x_scale),
    })
}

/// Walk the demands in order, consuming scales until each one is reached.
///
/// A demand already covered by the running total yields a zero-step record.
pub fn evaluate_combination(
    x_scales: &[u32],
    combination: &[u32],
) -> Result<(Vec<PlanStep>, PlanSummary)> {
    let mut steps = Vec::with_capacity(x_scales.len().max(combination.len()));
    let mut cursor = combination.iter();
    let mut actual_scale = 0;

    for &x_scale in x_scales {
        if x_scale > actual_scale {
            steps.push(next_step(&mut cursor, &mut actual_scale, x_scale, combination)?);
            let mut extra = 0;
            while actual_scale < x_scale {
                steps.push(next_step(&mut cursor, &mut actual_scale, x_scale, combination)?);
                extra += 1;
                if extra > MAX_STEPS_BETWEEN_DEMANDS {
                    return Err(ImageError::CombinationExhausted(format!(
                        "more than {MAX_STEPS_BETWEEN_DEMANDS} passes needed to reach x{x_scale}"
                    )));
                }
            }
        } else {
            steps.push(PlanStep {
                scale: 0,
                nb_upscale: 0,
                actual_scale,
                dif_scale: i64::from(actual_scale) - i64::from(x_scale),
            });
        }
    }

    let summary = PlanSummary {
        max_overshoot: steps.iter().map(|s| s.dif_scale).max().unwrap_or(0),
        max_actual_scale: steps.iter().map(|s| s.actual_scale).max().unwrap_or(0),
        total_steps: steps.iter().map(|s| s.nb_upscale).sum(),
    };
    Ok((steps, summary))
}

/// Candidate with the lowest [`PlanSummary::score`]; the first one wins ties.
pub fn select_best_combination(
    x_scales: &[u32],
    candidates: &[Vec<u32>],
) -> Result<SelectedCombination> {
    let mut best: Option<SelectedCombination> = None;

    for candidate in candidates {
        let (steps, summary) = evaluate_combination(x_scales, candidate)?;
        if best.as_ref().is_none_or(|b| summary.score() < b.summary.score()) {
            best = Some(SelectedCombination {
                combination: candidate.clone(),
                steps,
                summary,
            });
        }
    }

    best.ok_or_else(|| {
        ImageError::CombinationExhausted(format!("no candidate combination for {x_scales:?}"))
    })
}

/// Attach each trace record to the demand it serves.
///
/// Traces with extra records get a synthetic checkpoint entry for every pass
/// that falls short of the next demand.
pub fn annotate_demand_table(
    stats: &[UpscaleDemand],
    steps: &[PlanStep],
) -> Result<Vec<PlanEntry>> {
    if stats.is_empty() || steps.len() < stats.len() {
        return Err(ImageError::PlanMismatch(format!(
            "{} trace records for {} demands",
            steps.len(),
            stats.len()
        )));
    }

    if steps.len() == stats.len() {
        return Ok(stats
            .iter()
            .zip(steps)
            .map(|(demand, step)| PlanEntry::annotated(demand, step))
            .collect());
    }

    let mut entries = Vec::with_capacity(steps.len());
    let mut pending = stats.iter().peekable();

    for step in steps {
        match pending.peek() {
            Some(demand) if demand.x_scale <= step.actual_scale => {
                entries.push(PlanEntry::annotated(demand, step));
                pending.next();
            }
            Some(_) => entries.push(PlanEntry::checkpoint(step)),
            None => {
                return Err(ImageError::PlanMismatch(format!(
                    "trace continues past the last demand at x{}",
                    step.actual_scale
                )));
            }
        }
    }

    if let Some(demand) = pending.next() {
        return Err(ImageError::PlanMismatch(format!(
            "demand x{} of format {} is never reached",
            demand.x_scale, demand.key
        )));
    }

    Ok(entries)
}

/// Most passes a trace may run over `demands` distinct non-zero demands: each
/// one gets a step plus [`MAX_STEPS_BETWEEN_DEMANDS`] extra ones.
fn max_plan_passes(demands: usize) -> u64 {
    (u64::from(MAX_STEPS_BETWEEN_DEMANDS) + 1) * demands as u64
}

/// Plan the passes serving every demand of `table`.
///
/// When `max_x_scale` cannot be composed from the available scales the target
/// is raised one unit at a time, up to `max_x_scale + max(scales)`.
///
/// Demands that need more passes than evaluation allows, even with the
/// largest scale only, fail with [`ImageError::CombinationExhausted`]
/// without enumerating any combination.
pub fn plan_for_demand(table: &DemandTable, available: &AvailableScales) -> Result<AutoPlan> {
    if table.max_x_scale == 0 {
        return Ok(AutoPlan::passthrough(table));
    }

    let scales = available.as_slice();
    let Some(&largest) = scales.last() else {
        return Err(ImageError::InvalidScale(
            "no model scale available".to_string(),
        ));
    };

    let mut stats = table.stats.clone();
    stats.sort_by_key(|d| d.x_scale);
    let x_scales: Vec<u32> = stats.iter().map(|d| d.x_scale).collect();

    // Reject before composing: the minimal compositions of a large total
    // grow combinatorially, while evaluation would refuse the plan anyway.
    let min_passes = table.max_x_scale.div_ceil(largest);
    let mut reached = x_scales.clone();
    reached.retain(|&x| x > 0);
    reached.dedup();
    let max_passes = max_plan_passes(reached.len());
    if u64::from(min_passes) > max_passes {
        return Err(ImageError::CombinationExhausted(format!(
            "x{} needs at least {} passes of {:?}, at most {} allowed for {} demands",
            table.max_x_scale,
            min_passes,
            scales,
            max_passes,
            reached.len()
        )));
    }

    for target in table.max_x_scale..=table.max_x_scale.saturating_add(largest) {
        let candidates = best_combinations(target, scales)?.unwrap_or_default();
        if candidates.is_empty() {
            debug!(target, ?scales, "target not composable, raising it");
            continue;
        }

        let selected = select_best_combination(&x_scales, &candidates)?;
        let entries = annotate_demand_table(&stats, &selected.steps)?;
        let used = selected.summary.total_steps as usize;

        debug!(
            max_x_scale = table.max_x_scale,
            target,
            candidates = candidates.len(),
            combination = ?selected.combination,
            score = selected.summary.score(),
            "selected scale combination"
        );

        return Ok(AutoPlan {
            max_x_scale: table.max_x_scale,
            target_scale: target,
            used_scales: selected.combination[..used].to_vec(),
            summary: Some(selected.summary),
            entries,
        });
    }

    Err(ImageError::CombinationExhausted(format!(
        "no combination of {:?} reaches x{}",
        scales, table.max_x_scale
    )))
}
