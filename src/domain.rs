//! Project snapshot handed to the engine by the persistence layer.
//!
//! A snapshot is an immutable, ordered view of a project's phases and tasks:
//! - `ProjectSnapshot` - the project, owning its phases in display order
//! - `Phase` - a group of tasks, owning them in display order
//! - `Task` - dated work with progress and resource assignments
//!
//! The engine never mutates a snapshot; every computation derives fresh
//! results from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{business_days, DateInterval};
use crate::distribute::TaskCommitment;

/// A resource assigned to a task at some share of a work week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub resource_id: Uuid,
    pub allocation_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Completion, 0-100
    pub progress: f64,
    /// On the critical path; a late critical task is at risk
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub resource_assignments: Vec<ResourceAssignment>,
}

impl Task {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(self.start_date, self.end_date)
    }

    pub fn working_days(&self) -> u32 {
        business_days(&self.interval())
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Phase {
    /// Earliest task start to latest task end. None for an empty phase.
    pub fn span(&self) -> Option<DateInterval> {
        span_of(self.tasks.iter().map(Task::interval))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl ProjectSnapshot {
    /// All tasks with their phase, in phase then task order.
    pub fn all_tasks(&self) -> Vec<(&Phase, &Task)> {
        self.phases
            .iter()
            .flat_map(|phase| phase.tasks.iter().map(move |task| (phase, task)))
            .collect()
    }

    /// Find a task by ID
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.phases
            .iter()
            .flat_map(|phase| phase.tasks.iter())
            .find(|task| task.id == id)
    }

    /// Earliest task start to latest task end across all phases.
    pub fn span(&self) -> Option<DateInterval> {
        span_of(
            self.phases
                .iter()
                .flat_map(|phase| phase.tasks.iter().map(Task::interval)),
        )
    }

    /// Every assignment of `resource_id`, as commitments for the distributor.
    pub fn commitments_for_resource(&self, resource_id: Uuid) -> Vec<TaskCommitment> {
        self.all_tasks()
            .into_iter()
            .flat_map(|(phase, task)| {
                task.resource_assignments
                    .iter()
                    .filter(move |a| a.resource_id == resource_id)
                    .map(move |a| {
                        TaskCommitment::new(
                            task.id,
                            phase.id,
                            task.interval(),
                            a.allocation_percent,
                        )
                    })
            })
            .collect()
    }
}

/// Bounding interval of valid intervals. Inverted intervals are ignored.
pub(crate) fn span_of<I>(intervals: I) -> Option<DateInterval>
where
    I: IntoIterator<Item = DateInterval>,
{
    intervals
        .into_iter()
        .filter(DateInterval::is_valid)
        .reduce(|acc, next| DateInterval::new(acc.start.min(next.start), acc.end.max(next.end)))
}
