//! Request/response boundary for the presentation and persistence layers.
//!
//! This module wires the individual algorithms into the two pipelines the
//! callers actually run:
//!
//! 1. Resource planning: pattern / task / recurring sources → merged weekly
//!    allocation with load classification ([`plan_resource`]).
//! 2. Schedule evaluation: snapshot + baseline → variance → forecast
//!    ([`evaluate_schedule`]).
//!
//! Both have a JSON entry point so a caller can hand over the payload it
//! received without touching the engine's types.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate, AggregatedAllocation};
use crate::allocation::WeeklyAllocationMap;
use crate::baseline::BaselineSnapshot;
use crate::calendar::{week_buckets, DateInterval};
use crate::config::PlanningPolicy;
use crate::distribute::{distribute_task_overlap, TaskCommitment};
use crate::domain::ProjectSnapshot;
use crate::error::Result;
use crate::forecast::{forecast_completion, Forecast};
use crate::pattern::{allocate_pattern, AllocationPattern};
use crate::recurring::{calculate_recurring, RecurringSpec};
use crate::variance::{compare_to_baseline, BaselineComparison};

/// One source of a resource's commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationRequest {
    /// Phase-level quick allocation across every project week
    Pattern {
        target_percent: f64,
        pattern: AllocationPattern,
        #[serde(default)]
        ramp_weeks: usize,
    },
    /// Task-level allocation over the selected tasks
    Tasks { tasks: Vec<TaskCommitment> },
    /// Recurring cadence across every project week
    Recurring { cadence: RecurringSpec },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePlanRequest {
    pub resource_id: Uuid,
    /// Defines the week axis
    pub project: DateInterval,
    pub sources: Vec<AllocationRequest>,
}

fn source_allocation(
    source: &AllocationRequest,
    project: &DateInterval,
    total_weeks: usize,
    policy: &PlanningPolicy,
) -> WeeklyAllocationMap {
    match source {
        AllocationRequest::Pattern {
            target_percent,
            pattern,
            ramp_weeks,
        } => allocate_pattern(*target_percent, *pattern, total_weeks, *ramp_weeks, policy),
        AllocationRequest::Tasks { tasks } => distribute_task_overlap(tasks, project, policy),
        AllocationRequest::Recurring { cadence } => {
            calculate_recurring(cadence, total_weeks, policy).weekly
        }
    }
}

/// Merged, classified allocation for one resource.
pub fn plan_resource(
    request: &ResourcePlanRequest,
    policy: &PlanningPolicy,
) -> AggregatedAllocation {
    let total_weeks = week_buckets(&request.project).len();
    let sources: Vec<WeeklyAllocationMap> = request
        .sources
        .iter()
        .map(|source| source_allocation(source, &request.project, total_weeks, policy))
        .collect();

    aggregate(request.resource_id, &sources, policy)
}

/// Plan many resources at once. Requests are independent and evaluated in
/// parallel; the output keeps the input order.
pub fn plan_resources(
    requests: &[ResourcePlanRequest],
    policy: &PlanningPolicy,
) -> Vec<AggregatedAllocation> {
    tracing::debug!(resources = requests.len(), "planning resources");
    requests
        .par_iter()
        .map(|request| plan_resource(request, policy))
        .collect()
}

/// JSON form of [`plan_resources`]: an array of requests in, an array of
/// aggregated allocations out.
pub fn plan_resources_json(input: &str, policy: &PlanningPolicy) -> Result<String> {
    let requests: Vec<ResourcePlanRequest> = serde_json::from_str(input)?;
    let plans = plan_resources(&requests, policy);
    Ok(serde_json::to_string(&plans)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub project: ProjectSnapshot,
    #[serde(default)]
    pub baseline: Option<BaselineSnapshot>,
    /// Status date progress is measured against
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvaluation {
    pub comparison: BaselineComparison,
    pub forecast: Forecast,
}

/// Compare against the baseline and forecast completion.
pub fn evaluate_schedule(request: &ScheduleRequest, policy: &PlanningPolicy) -> ScheduleEvaluation {
    let comparison = compare_to_baseline(
        &request.project,
        request.baseline.as_ref(),
        request.as_of,
        policy,
    );
    let forecast = forecast_completion(&comparison, policy);
    ScheduleEvaluation {
        comparison,
        forecast,
    }
}

pub fn evaluate_schedule_json(input: &str, policy: &PlanningPolicy) -> Result<String> {
    let request: ScheduleRequest = serde_json::from_str(input)?;
    Ok(serde_json::to_string(&evaluate_schedule(&request, policy))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::LoadLevel;
    use crate::calendar::WeekId;
    use crate::error::EngineError;
    use crate::recurring::RecurringPreset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Mon 2024-04-01 .. Fri 2024-04-26: four weeks
    fn project() -> DateInterval {
        DateInterval::new(date(2024, 4, 1), date(2024, 4, 26))
    }

    #[test]
    fn test_plan_resource_merges_all_source_kinds() {
        let policy = PlanningPolicy::default();
        let request = ResourcePlanRequest {
            resource_id: Uuid::new_v4(),
            project: project(),
            sources: vec![
                AllocationRequest::Pattern {
                    target_percent: 50.0,
                    pattern: AllocationPattern::Steady,
                    ramp_weeks: 0,
                },
                AllocationRequest::Recurring {
                    cadence: RecurringPreset::OneDayPerWeek.into(),
                },
                AllocationRequest::Tasks {
                    tasks: vec![TaskCommitment::new(
                        Uuid::new_v4(),
                        Uuid::new_v4(),
                        DateInterval::new(date(2024, 4, 8), date(2024, 4, 12)),
                        60.0,
                    )],
                },
            ],
        };

        let plan = plan_resource(&request, &policy);

        assert_eq!(plan.weekly.len(), 4);
        assert_eq!(plan.weekly.get(WeekId(1)), Some(70.0));
        assert_eq!(plan.weekly.get(WeekId(2)), Some(130.0));
        assert_eq!(plan.weeks[1].level, LoadLevel::Overallocated);
        assert_eq!(plan.summary.overallocated_weeks, 1);
    }

    #[test]
    fn test_plan_resources_keeps_order() {
        let policy = PlanningPolicy::default();
        let requests: Vec<ResourcePlanRequest> = (0..8)
            .map(|i| ResourcePlanRequest {
                resource_id: Uuid::new_v4(),
                project: project(),
                sources: vec![AllocationRequest::Pattern {
                    target_percent: 10.0 * i as f64,
                    pattern: AllocationPattern::Steady,
                    ramp_weeks: 0,
                }],
            })
            .collect();

        let plans = plan_resources(&requests, &policy);

        assert_eq!(plans.len(), 8);
        for (request, plan) in requests.iter().zip(&plans) {
            assert_eq!(plan.resource_id, request.resource_id);
        }
        assert_eq!(plans[7].summary.average, 70.0);
    }

    #[test]
    fn test_plan_resources_json() {
        let policy = PlanningPolicy::default();
        let input = r#"[{
            "resource_id": "00000000-0000-0000-0000-000000000001",
            "project": {"start": "2024-04-01", "end": "2024-04-14"},
            "sources": [
                {"kind": "pattern", "target_percent": 100, "pattern": "RAMP_UP", "ramp_weeks": 2},
                {"kind": "recurring", "cadence": {"custom": {"days": 1, "period": "week"}}}
            ]
        }]"#;

        let output = plan_resources_json(input, &policy).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value[0]["weekly"]["W01"], 70.0);
        assert_eq!(value[0]["weekly"]["W02"], 120.0);
        assert_eq!(value[0]["weeks"][1]["level"], "overallocated");
    }

    #[test]
    fn test_plan_resources_json_rejects_garbage() {
        let policy = PlanningPolicy::default();
        let err = plan_resources_json("{not json", &policy).unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    fn test_inverted_project_plans_nothing() {
        let policy = PlanningPolicy::default();
        let request = ResourcePlanRequest {
            resource_id: Uuid::new_v4(),
            project: DateInterval::new(date(2024, 5, 1), date(2024, 4, 1)),
            sources: vec![AllocationRequest::Pattern {
                target_percent: 100.0,
                pattern: AllocationPattern::Steady,
                ramp_weeks: 0,
            }],
        };

        let plan = plan_resource(&request, &policy);
        assert!(plan.weekly.is_empty());
        assert_eq!(plan.summary.total_weeks, 0);
    }

    #[test]
    fn test_evaluate_schedule_without_baseline() {
        let policy = PlanningPolicy::default();
        let input = r#"{
            "project": {
                "id": "00000000-0000-0000-0000-000000000002",
                "name": "Empty",
                "phases": []
            },
            "as_of": "2024-04-10"
        }"#;

        let output = evaluate_schedule_json(input, &policy).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["comparison"]["kind"], "no_data");
        assert_eq!(value["forecast"]["kind"], "no_data");
        assert_eq!(value["forecast"]["reason"], "missing_baseline");
    }
}
