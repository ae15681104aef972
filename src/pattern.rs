//! Phase-level quick allocation: shape a target percentage across weeks.

use serde::{Deserialize, Serialize};

use crate::allocation::{clamp_percent, WeeklyAllocationMap};
use crate::config::PlanningPolicy;

/// Shape of a phase-level allocation over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationPattern {
    /// Constant load every week
    #[default]
    Steady,
    /// Linear build-up over the first `ramp_weeks`, then constant
    RampUp,
    /// Constant, then linear wind-down over the last `ramp_weeks`
    RampDown,
    /// Gaussian peak at the middle of the span
    BellCurve,
}

/// Produce one percentage per week for `total_weeks` weeks.
///
/// `ramp_weeks` only matters for the ramp patterns and is clamped to
/// `[1, total_weeks]`. Every value is clamped to the policy's percent bounds.
pub fn allocate_pattern(
    target_percent: f64,
    pattern: AllocationPattern,
    total_weeks: usize,
    ramp_weeks: usize,
    policy: &PlanningPolicy,
) -> WeeklyAllocationMap {
    tracing::debug!(target_percent, ?pattern, total_weeks, ramp_weeks, "allocating pattern");

    if total_weeks == 0 {
        return WeeklyAllocationMap::new();
    }

    let capacity = &policy.capacity;
    let target = clamp_percent(target_percent, capacity);
    if target != target_percent {
        tracing::warn!(target_percent, clamped = target, "target percent clamped");
    }
    let ramp = ramp_weeks.clamp(1, total_weeks);

    let values = (0..total_weeks).map(|week| {
        let raw = match pattern {
            AllocationPattern::Steady => target,
            AllocationPattern::RampUp => ramp_up_value(target, week, ramp),
            AllocationPattern::RampDown => {
                // Mirror of ramp-up, counted back from the final week.
                ramp_up_value(target, total_weeks - 1 - week, ramp)
            }
            AllocationPattern::BellCurve => {
                bell_value(target, week, total_weeks, policy.pattern.bell_spread_divisor)
            }
        };
        clamp_percent(raw, capacity)
    });

    WeeklyAllocationMap::from_values(values)
}

fn ramp_up_value(target: f64, week: usize, ramp: usize) -> f64 {
    if week >= ramp {
        return target;
    }
    (target * (week + 1) as f64 / ramp as f64).round()
}

fn bell_value(target: f64, week: usize, total_weeks: usize, spread_divisor: f64) -> f64 {
    let spread = total_weeks as f64 / spread_divisor;
    if spread <= 0.0 || !spread.is_finite() {
        return target;
    }
    let midpoint = (total_weeks - 1) as f64 / 2.0;
    let distance = (week as f64 - midpoint).abs();
    (target * (-(distance * distance) / (2.0 * spread * spread)).exp()).round()
}
