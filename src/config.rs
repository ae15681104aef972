//! Planning policy.
//!
//! Thresholds and conversion factors used by the allocation and variance
//! computations are business policy rather than derived quantities. They are
//! collected here so they can be tuned (or loaded from YAML) without touching
//! the algorithms that consume them.
//!
//! ```rust
//! use capacity_core::config::PlanningPolicy;
//!
//! let policy = PlanningPolicy::from_yaml("capacity:\n  high_threshold: 75\n").unwrap();
//! assert_eq!(policy.capacity.high_threshold, 75.0);
//! assert_eq!(policy.capacity.over_threshold, 100.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const HIGH_LOAD_THRESHOLD: f64 = 80.0;
pub const OVERALLOCATION_THRESHOLD: f64 = 100.0;
pub const MIN_PERCENT: f64 = 0.0;
pub const MAX_PERCENT: f64 = 200.0;
pub const WORK_WEEK_DAYS: u32 = 5;
pub const PERCENT_DECIMALS: u32 = 2;

/// Average weeks per month. Fixed, not recomputed from calendar data.
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// Bell curve spread is `total_weeks / BELL_SPREAD_DIVISOR`.
pub const BELL_SPREAD_DIVISOR: f64 = 4.0;

pub const BEHIND_TOLERANCE_DAYS: i64 = 0;
pub const AT_RISK_SPI: f64 = 0.8;

pub const UNSTABLE_SPI_LOW: f64 = 0.5;
pub const UNSTABLE_SPI_HIGH: f64 = 1.5;
pub const STABLE_SPI_BAND: f64 = 0.1;
pub const MIN_SAMPLE_TASKS: usize = 3;
pub const HIGH_CONFIDENCE_SAMPLE_TASKS: usize = 10;
pub const SPI_FLOOR: f64 = 0.1;

/// Capacity classification and percentage handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityPolicy {
    /// Weeks above this are flagged as high load (amber)
    pub high_threshold: f64,
    /// Weeks above this are overallocated (red)
    pub over_threshold: f64,
    pub min_percent: f64,
    pub max_percent: f64,
    /// Days in the reference work week a percentage is relative to
    pub work_week_days: u32,
    /// Decimal places kept on computed percentages
    pub percent_decimals: u32,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            high_threshold: HIGH_LOAD_THRESHOLD,
            over_threshold: OVERALLOCATION_THRESHOLD,
            min_percent: MIN_PERCENT,
            max_percent: MAX_PERCENT,
            work_week_days: WORK_WEEK_DAYS,
            percent_decimals: PERCENT_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringPolicy {
    pub weeks_per_month: f64,
}

impl Default for RecurringPolicy {
    fn default() -> Self {
        Self {
            weeks_per_month: WEEKS_PER_MONTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternPolicy {
    pub bell_spread_divisor: f64,
}

impl Default for PatternPolicy {
    fn default() -> Self {
        Self {
            bell_spread_divisor: BELL_SPREAD_DIVISOR,
        }
    }
}

/// Status classification for baseline comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePolicy {
    /// End-date slip (in days) tolerated before a task counts as behind
    pub behind_tolerance_days: i64,
    /// A late project with SPI below this is at risk rather than behind
    pub at_risk_spi: f64,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            behind_tolerance_days: BEHIND_TOLERANCE_DAYS,
            at_risk_spi: AT_RISK_SPI,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    pub unstable_spi_low: f64,
    pub unstable_spi_high: f64,
    /// |SPI - 1| within this band counts as stable
    pub stable_spi_band: f64,
    /// Fewer completed tasks than this gives low confidence
    pub min_sample_tasks: usize,
    pub high_confidence_sample_tasks: usize,
    /// SPI used in place of anything lower when inflating remaining work
    pub spi_floor: f64,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            unstable_spi_low: UNSTABLE_SPI_LOW,
            unstable_spi_high: UNSTABLE_SPI_HIGH,
            stable_spi_band: STABLE_SPI_BAND,
            min_sample_tasks: MIN_SAMPLE_TASKS,
            high_confidence_sample_tasks: HIGH_CONFIDENCE_SAMPLE_TASKS,
            spi_floor: SPI_FLOOR,
        }
    }
}

/// All tunable policy for the engine.
///
/// Every section defaults independently, so a YAML document only needs to
/// name the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningPolicy {
    pub capacity: CapacityPolicy,
    pub recurring: RecurringPolicy,
    pub pattern: PatternPolicy,
    pub schedule: SchedulePolicy,
    pub forecast: ForecastPolicy,
}

impl PlanningPolicy {
    /// Parse a (possibly partial) policy document and validate it.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let policy: PlanningPolicy = serde_yml::from_str(content)?;
        policy.validate()?;
        tracing::debug!(?policy, "loaded planning policy");
        Ok(policy)
    }

    /// Reject policies whose values contradict each other.
    pub fn validate(&self) -> Result<()> {
        let capacity = &self.capacity;
        if capacity.high_threshold >= capacity.over_threshold {
            return Err(EngineError::InvalidPolicy(format!(
                "high_threshold ({}) must be below over_threshold ({})",
                capacity.high_threshold, capacity.over_threshold
            )));
        }
        if capacity.min_percent < 0.0 || capacity.min_percent > capacity.max_percent {
            return Err(EngineError::InvalidPolicy(format!(
                "percent bounds [{}, {}] are invalid",
                capacity.min_percent, capacity.max_percent
            )));
        }
        if !(1..=7).contains(&capacity.work_week_days) {
            return Err(EngineError::InvalidPolicy(format!(
                "work_week_days must be between 1 and 7, got {}",
                capacity.work_week_days
            )));
        }
        if self.recurring.weeks_per_month <= 0.0 {
            return Err(EngineError::InvalidPolicy(
                "weeks_per_month must be positive".to_string(),
            ));
        }
        if self.pattern.bell_spread_divisor <= 0.0 {
            return Err(EngineError::InvalidPolicy(
                "bell_spread_divisor must be positive".to_string(),
            ));
        }
        let forecast = &self.forecast;
        if forecast.unstable_spi_low >= forecast.unstable_spi_high {
            return Err(EngineError::InvalidPolicy(format!(
                "unstable SPI band [{}, {}] is inverted",
                forecast.unstable_spi_low, forecast.unstable_spi_high
            )));
        }
        if forecast.spi_floor <= 0.0 {
            return Err(EngineError::InvalidPolicy(
                "spi_floor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
