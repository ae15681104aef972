//! Completion forecast from a baseline comparison.
//!
//! The current projected end is the project's actual end, which is the
//! baseline project end shifted by the schedule variance. When the project
//! runs slower than planned (SPI < 1) the work remaining until that end is
//! stretched by `1 / SPI`.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::allocation::round_percent;
use crate::config::{ForecastPolicy, PlanningPolicy};
use crate::variance::{BaselineComparison, NoDataReason, ScheduleVariance};

/// Caveats attached to every forecast
pub const DEFAULT_ASSUMPTIONS: &[&str] = &[
    "Assumes current velocity continues",
    "Does not account for resource changes",
    "Does not account for scope added after the baseline",
    "Counts weekends as non-working days; holidays are not modelled",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_end_date: NaiveDate,
    pub variance_from_baseline_days: i64,
    pub confidence: Confidence,
    pub schedule_performance_index: f64,
    pub assumptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Forecast {
    NoData { reason: NoDataReason },
    Projected(ForecastResult),
}

impl Forecast {
    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            Forecast::Projected(result) => Some(result),
            Forecast::NoData { .. } => None,
        }
    }
}

/// Confidence from SPI stability and the number of completed tasks.
pub fn forecast_confidence(
    spi: f64,
    completed_tasks: usize,
    policy: &ForecastPolicy,
) -> Confidence {
    let extreme = spi < policy.unstable_spi_low || spi > policy.unstable_spi_high;
    if extreme || completed_tasks < policy.min_sample_tasks {
        Confidence::Low
    } else if completed_tasks >= policy.high_confidence_sample_tasks
        && (spi - 1.0).abs() <= policy.stable_spi_band
    {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = date.checked_add_signed(Duration::days(days));
    shifted.unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn project(variance: &ScheduleVariance, policy: &ForecastPolicy) -> ForecastResult {
    let overall = &variance.overall;
    let baseline_end = overall.record.baseline.end_date;
    let spi = overall.schedule_performance_index;

    let projected_end = overall.record.actual.end_date;
    let remaining = projected_end
        .signed_duration_since(variance.as_of)
        .num_days()
        .max(0);

    let inflation = if spi < 1.0 {
        let effective = if spi < policy.spi_floor {
            tracing::warn!(spi, floor = policy.spi_floor, "SPI below floor, using floor");
            policy.spi_floor
        } else {
            spi
        };
        let stretched = round_percent(remaining as f64 / effective, 6);
        (stretched - remaining as f64).ceil() as i64
    } else {
        0
    };

    let forecast_end_date = shift(projected_end, inflation);
    let confidence = forecast_confidence(spi, variance.completed_tasks, policy);

    tracing::debug!(
        %forecast_end_date,
        remaining,
        inflation,
        ?confidence,
        "forecast projected"
    );

    ForecastResult {
        forecast_end_date,
        variance_from_baseline_days: forecast_end_date
            .signed_duration_since(baseline_end)
            .num_days(),
        confidence,
        schedule_performance_index: spi,
        assumptions: DEFAULT_ASSUMPTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Forecast the completion date for a comparison.
pub fn forecast_completion(comparison: &BaselineComparison, policy: &PlanningPolicy) -> Forecast {
    match comparison {
        BaselineComparison::NoData { reason } => Forecast::NoData { reason: *reason },
        BaselineComparison::Compared(variance) => {
            Forecast::Projected(project(variance, &policy.forecast))
        }
    }
}
