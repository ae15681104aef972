//! Saved schedule baselines.
//!
//! A baseline is an immutable copy of the schedule-relevant fields of a
//! project snapshot (task dates and progress), captured when a user saves it
//! and persisted outside the engine. The engine only reads baselines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::DateInterval;
use crate::domain::{span_of, ProjectSnapshot};

/// Namespace UUID for deterministic baseline IDs (v5).
#[rustfmt::skip]
const BASELINE_NS: Uuid = Uuid::from_bytes([
    0x62, 0x61, 0x73, 0x65, 0x6c, 0x69, 0x6e, 0x65,
    0x2d, 0x6e, 0x73, 0x2d, 0x75, 0x75, 0x69, 0x64,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineTask {
    pub task_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Progress at capture time (not assumed to be zero)
    pub progress: f64,
}

impl BaselineTask {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePhase {
    pub phase_id: Uuid,
    pub name: String,
    pub tasks: Vec<BaselineTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub project_id: Uuid,
    pub phases: Vec<BaselinePhase>,
}

impl BaselineSnapshot {
    /// Copy the planned schedule of `project`.
    ///
    /// The ID is a v5 UUID of the project ID, name and timestamp, so the same
    /// capture always yields the same baseline.
    pub fn capture(project: &ProjectSnapshot, name: &str, created_at: DateTime<Utc>) -> Self {
        let seed = format!("{}:{}:{}", project.id, name, created_at.to_rfc3339());
        let phases = project
            .phases
            .iter()
            .map(|phase| BaselinePhase {
                phase_id: phase.id,
                name: phase.name.clone(),
                tasks: phase
                    .tasks
                    .iter()
                    .map(|task| BaselineTask {
                        task_id: task.id,
                        start_date: task.start_date,
                        end_date: task.end_date,
                        progress: task.progress,
                    })
                    .collect(),
            })
            .collect();

        tracing::debug!(project_id = %project.id, name, "captured baseline");

        Self {
            id: Uuid::new_v5(&BASELINE_NS, seed.as_bytes()),
            name: name.to_string(),
            created_at,
            project_id: project.id,
            phases,
        }
    }

    /// Find a baselined task by ID
    pub fn task(&self, task_id: Uuid) -> Option<&BaselineTask> {
        self.all_tasks().into_iter().find(|t| t.task_id == task_id)
    }

    pub fn all_tasks(&self) -> Vec<&BaselineTask> {
        self.phases.iter().flat_map(|p| p.tasks.iter()).collect()
    }

    /// Planned project span
    pub fn span(&self) -> Option<DateInterval> {
        span_of(self.all_tasks().into_iter().map(BaselineTask::interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, Task};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project() -> ProjectSnapshot {
        ProjectSnapshot {
            id: Uuid::new_v4(),
            name: "Migration".to_string(),
            phases: vec![Phase {
                id: Uuid::new_v4(),
                name: "Prepare".to_string(),
                tasks: vec![Task {
                    id: Uuid::new_v4(),
                    name: "Inventory".to_string(),
                    start_date: date(2024, 3, 4),
                    end_date: date(2024, 3, 15),
                    progress: 30.0,
                    critical: true,
                    resource_assignments: vec![],
                }],
            }],
        }
    }

    #[test]
    fn test_capture_copies_schedule() {
        let project = project();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let baseline = BaselineSnapshot::capture(&project, "Kickoff", at);

        assert_eq!(baseline.name, "Kickoff");
        assert_eq!(baseline.project_id, project.id);
        assert_eq!(baseline.phases.len(), 1);
        let task = baseline.task(project.phases[0].tasks[0].id).unwrap();
        assert_eq!(task.end_date, date(2024, 3, 15));
        assert_eq!(task.progress, 30.0);
        assert_eq!(
            baseline.span(),
            Some(DateInterval::new(date(2024, 3, 4), date(2024, 3, 15)))
        );
    }

    #[test]
    fn test_capture_id_is_deterministic() {
        let project = project();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let a = BaselineSnapshot::capture(&project, "Kickoff", at);
        let b = BaselineSnapshot::capture(&project, "Kickoff", at);
        let c = BaselineSnapshot::capture(&project, "Replan", at);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_baseline_is_independent_of_later_edits() {
        let mut project = project();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let baseline = BaselineSnapshot::capture(&project, "Kickoff", at);

        project.phases[0].tasks[0].end_date = date(2024, 3, 29);

        let task = baseline.task(project.phases[0].tasks[0].id).unwrap();
        assert_eq!(task.end_date, date(2024, 3, 15));
    }
}
