//! Capacity Core Library
//!
//! Stateless resource-capacity and schedule-variance engine. It turns project
//! snapshots, task assignments, recurring commitments and saved baselines
//! into weekly allocation percentages, load flags, variance reports and
//! completion forecasts. Persistence and presentation live elsewhere; every
//! function here is a pure computation over the values it is given.
//!
//! # Modules
//!
//! - `calendar`: Date intervals, week buckets and business-day counting
//! - `allocation`: The week-keyed percentage map shared by every allocator
//! - `pattern`: STEADY / RAMP_UP / RAMP_DOWN / BELL_CURVE allocation
//! - `distribute`: Task-overlap distribution across week buckets
//! - `recurring`: Recurring cadences ("2 days/week") as weekly percentages
//! - `aggregate`: Merging sources and classifying weekly load
//! - `domain`: Project, phase and task snapshots
//! - `baseline`: Saved schedule baselines
//! - `variance`: Baseline comparison and schedule performance
//! - `forecast`: Completion forecast from a comparison
//! - `plan`: Request/response boundary with JSON entry points
//! - `config`: Planning policy (thresholds and constants)

pub mod error;
pub use error::{EngineError, Result};

pub mod config;
pub use config::PlanningPolicy;

pub mod calendar;
pub use calendar::{business_days, week_buckets, DateInterval, WeekBucket, WeekId};

pub mod allocation;
pub use allocation::WeeklyAllocationMap;

pub mod pattern;
pub use pattern::{allocate_pattern, AllocationPattern};

pub mod distribute;
pub use distribute::{distribute_task_overlap, TaskCommitment};

pub mod recurring;
pub use recurring::{calculate_recurring, RecurringPreset, RecurringSpec};

pub mod aggregate;
pub use aggregate::{aggregate, AggregatedAllocation, LoadLevel};

pub mod domain;
pub use domain::{Phase, ProjectSnapshot, ResourceAssignment, Task};

pub mod baseline;
pub use baseline::BaselineSnapshot;

pub mod variance;
pub use variance::{compare_to_baseline, BaselineComparison, ScheduleStatus, ScheduleVariance};

pub mod forecast;
pub use forecast::{forecast_completion, Confidence, Forecast};

pub mod plan;
pub use plan::{
    evaluate_schedule, evaluate_schedule_json, plan_resource, plan_resources,
    plan_resources_json, AllocationRequest, ResourcePlanRequest, ScheduleRequest,
};
