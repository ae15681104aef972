//! Recurring-cadence allocation ("2 days a week", "1 day a month").
//!
//! A cadence converts to a uniform weekly percentage:
//! - per week: `days / 5 * 100`
//! - per month: `days / 4.33 / 5 * 100`, using a fixed average of weeks per
//!   month rather than calendar data.

use serde::{Deserialize, Serialize};

use crate::allocation::{clamp_percent, round_percent, WeeklyAllocationMap};
use crate::config::PlanningPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadencePeriod {
    Week,
    Month,
}

/// A fixed number of days per period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecurringCommitment {
    pub days: f64,
    pub period: CadencePeriod,
}

/// Commonly offered cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringPreset {
    OneDayPerWeek,
    TwoDaysPerWeek,
    ThreeDaysPerWeek,
    FourDaysPerWeek,
    FullTime,
    OneDayPerMonth,
    TwoDaysPerMonth,
    OneWeekPerMonth,
}

impl RecurringPreset {
    pub fn all() -> &'static [RecurringPreset] {
        &[
            RecurringPreset::OneDayPerWeek,
            RecurringPreset::TwoDaysPerWeek,
            RecurringPreset::ThreeDaysPerWeek,
            RecurringPreset::FourDaysPerWeek,
            RecurringPreset::FullTime,
            RecurringPreset::OneDayPerMonth,
            RecurringPreset::TwoDaysPerMonth,
            RecurringPreset::OneWeekPerMonth,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecurringPreset::OneDayPerWeek => "1 day/week",
            RecurringPreset::TwoDaysPerWeek => "2 days/week",
            RecurringPreset::ThreeDaysPerWeek => "3 days/week",
            RecurringPreset::FourDaysPerWeek => "4 days/week",
            RecurringPreset::FullTime => "5 days/week",
            RecurringPreset::OneDayPerMonth => "1 day/month",
            RecurringPreset::TwoDaysPerMonth => "2 days/month",
            RecurringPreset::OneWeekPerMonth => "5 days/month",
        }
    }

    pub fn commitment(&self) -> RecurringCommitment {
        let (days, period) = match self {
            RecurringPreset::OneDayPerWeek => (1.0, CadencePeriod::Week),
            RecurringPreset::TwoDaysPerWeek => (2.0, CadencePeriod::Week),
            RecurringPreset::ThreeDaysPerWeek => (3.0, CadencePeriod::Week),
            RecurringPreset::FourDaysPerWeek => (4.0, CadencePeriod::Week),
            RecurringPreset::FullTime => (5.0, CadencePeriod::Week),
            RecurringPreset::OneDayPerMonth => (1.0, CadencePeriod::Month),
            RecurringPreset::TwoDaysPerMonth => (2.0, CadencePeriod::Month),
            RecurringPreset::OneWeekPerMonth => (5.0, CadencePeriod::Month),
        };
        RecurringCommitment { days, period }
    }
}

/// Either a named preset or a custom cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringSpec {
    Preset(RecurringPreset),
    Custom { days: f64, period: CadencePeriod },
}

impl RecurringSpec {
    pub fn commitment(&self) -> RecurringCommitment {
        match self {
            RecurringSpec::Preset(preset) => preset.commitment(),
            RecurringSpec::Custom { days, period } => RecurringCommitment {
                days: *days,
                period: *period,
            },
        }
    }
}

impl From<RecurringPreset> for RecurringSpec {
    fn from(preset: RecurringPreset) -> Self {
        RecurringSpec::Preset(preset)
    }
}

/// Result of a recurring-cadence allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringAllocation {
    pub percent_per_week: f64,
    /// Days committed over the whole project
    pub total_days: f64,
    pub weekly: WeeklyAllocationMap,
}

fn cadence_days(commitment: &RecurringCommitment) -> f64 {
    if commitment.days.is_nan() || commitment.days < 0.0 {
        tracing::warn!(days = commitment.days, "negative cadence treated as zero");
        return 0.0;
    }
    commitment.days
}

fn weekly_share(commitment: &RecurringCommitment, policy: &PlanningPolicy) -> f64 {
    let days = cadence_days(commitment);
    let week_days = policy.capacity.work_week_days as f64;
    let raw = match commitment.period {
        CadencePeriod::Week => days * 100.0 / week_days,
        CadencePeriod::Month => days / policy.recurring.weeks_per_month / week_days * 100.0,
    };
    clamp_percent(raw, &policy.capacity)
}

/// Uniform weekly percentage for a cadence, clamped to the policy bounds.
pub fn percent_per_week(commitment: &RecurringCommitment, policy: &PlanningPolicy) -> f64 {
    round_percent(weekly_share(commitment, policy), policy.capacity.percent_decimals)
}

/// Weekly percentage, total days, and a uniform map over `total_weeks` weeks.
pub fn calculate_recurring(
    spec: &RecurringSpec,
    total_weeks: usize,
    policy: &PlanningPolicy,
) -> RecurringAllocation {
    let commitment = spec.commitment();
    tracing::debug!(?commitment, total_weeks, "calculating recurring allocation");

    let share = weekly_share(&commitment, policy);
    let percent = round_percent(share, policy.capacity.percent_decimals);
    // From the clamped share, so it agrees with `percent_per_week`.
    let week_days = policy.capacity.work_week_days as f64;
    let total_days = share * week_days * total_weeks as f64 / 100.0;

    RecurringAllocation {
        percent_per_week: percent,
        total_days: round_percent(total_days, policy.capacity.percent_decimals),
        weekly: WeeklyAllocationMap::from_values(std::iter::repeat(percent).take(total_weeks)),
    }
}
