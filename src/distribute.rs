//! Task-level precise allocation.
//!
//! Each selected task contributes `allocation_percent * overlap_days / 5` to
//! every week it overlaps, where `overlap_days` are the business days shared
//! by the task and the week. A percentage is relative to a five-day work week,
//! so two overlapping days at 100% add 40% to that week. Contributions from
//! different tasks add up and may exceed 100%.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::{clamp_percent, WeeklyAllocationMap};
use crate::calendar::{business_days, week_buckets, DateInterval, WeekBucket};
use crate::config::PlanningPolicy;

/// A resource's commitment to one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCommitment {
    pub task_id: Uuid,
    pub phase_id: Uuid,
    pub interval: DateInterval,
    /// Business days in `interval`
    pub working_days: u32,
    /// Share of a full work week, 0-200
    pub allocation_percent: f64,
}

impl TaskCommitment {
    /// Build a commitment, deriving `working_days` from the interval.
    pub fn new(
        task_id: Uuid,
        phase_id: Uuid,
        interval: DateInterval,
        allocation_percent: f64,
    ) -> Self {
        Self {
            task_id,
            phase_id,
            interval,
            working_days: business_days(&interval),
            allocation_percent,
        }
    }
}

/// The weekly load a single task adds on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContribution {
    pub task_id: Uuid,
    pub phase_id: Uuid,
    pub weekly: WeeklyAllocationMap,
}

fn contribution_for(
    task: &TaskCommitment,
    buckets: &[WeekBucket],
    policy: &PlanningPolicy,
) -> WeeklyAllocationMap {
    let capacity = &policy.capacity;
    let percent = clamp_percent(task.allocation_percent, capacity);
    if percent != task.allocation_percent {
        tracing::warn!(
            task_id = %task.task_id,
            requested = task.allocation_percent,
            clamped = percent,
            "task allocation clamped"
        );
    }
    let week_days = capacity.work_week_days as f64;

    buckets
        .iter()
        .filter_map(|bucket| {
            let overlap = task.interval.intersection(&bucket.interval())?;
            let days = business_days(&overlap);
            tracing::trace!(task_id = %task.task_id, week = %bucket.id, days, "task overlaps week");
            Some((bucket.id, percent * days as f64 / week_days))
        })
        .collect()
}

/// Per-task weekly contributions on the project's week axis, in input order.
pub fn task_contributions(
    tasks: &[TaskCommitment],
    project: &DateInterval,
    policy: &PlanningPolicy,
) -> Vec<TaskContribution> {
    let buckets = week_buckets(project);

    tasks
        .iter()
        .map(|task| TaskContribution {
            task_id: task.task_id,
            phase_id: task.phase_id,
            weekly: contribution_for(task, &buckets, policy)
                .rounded(policy.capacity.percent_decimals),
        })
        .collect()
}

/// Sum every task's contribution per week.
///
/// Every project week is present in the result, zero where no task overlaps.
/// An inverted project interval yields an empty map.
pub fn distribute_task_overlap(
    tasks: &[TaskCommitment],
    project: &DateInterval,
    policy: &PlanningPolicy,
) -> WeeklyAllocationMap {
    tracing::debug!(
        tasks = tasks.len(),
        start = %project.start,
        end = %project.end,
        "distributing task overlap"
    );

    let buckets = week_buckets(project);
    let empty: WeeklyAllocationMap = buckets.iter().map(|b| (b.id, 0.0)).collect();

    tasks
        .iter()
        .flat_map(|task| contribution_for(task, &buckets, policy))
        .fold(empty, |acc, (week, percent)| acc.add(week, percent))
        .rounded(policy.capacity.percent_decimals)
}
