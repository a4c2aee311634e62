//! Before/after comparison for replay experiments.

use crate::error::{CoreError, CoreResult};
use crate::models::ExperimentDetail;
use serde::{Deserialize, Serialize};

/// Reduction from `before` to `after` as an integer percentage in [0, 100].
///
/// The denominator is floored at 1 so a zero baseline cannot divide by zero.
/// An increase reports 0, and a drop past zero caps at 100. Non-finite
/// inputs count as 0.
pub fn reduction_pct(before: f64, after: f64) -> u8 {
    let before = finite_or_zero(before);
    let after = finite_or_zero(after);
    let ratio = (before - after) / before.max(1.0);
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// One tracked metric on both sides of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub before: f64,
    pub after: f64,
    pub reduction_pct: u8,
}

impl MetricComparison {
    pub fn new(before: f64, after: f64) -> Self {
        Self {
            before,
            after,
            reduction_pct: reduction_pct(before, after),
        }
    }
}

/// Reduction metrics for a selected experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentComparison {
    pub experiment_id: String,
    /// Tickets created (CREATE_TICKET + ESCALATE).
    pub tickets: MetricComparison,
    /// Share of cases auto-closed, in percent.
    pub auto_close_rate: MetricComparison,
    pub total_cases_before: u64,
    pub total_cases_after: u64,
}

impl ExperimentComparison {
    /// Compares the before/after blocks of an experiment.
    pub fn from_detail(detail: &ExperimentDetail) -> CoreResult<Self> {
        if detail.missing {
            return Err(CoreError::not_found("experiment", detail.id()));
        }
        Ok(Self {
            experiment_id: detail.id().to_string(),
            tickets: MetricComparison::new(detail.before.tickets, detail.after.tickets),
            auto_close_rate: MetricComparison::new(
                detail.before.auto_close_rate_pct,
                detail.after.auto_close_rate_pct,
            ),
            total_cases_before: detail.before.total_cases,
            total_cases_after: detail.after.total_cases,
        })
    }
}
