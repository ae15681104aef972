//! Baseline comparison: schedule variance per task, per phase, and overall.
//!
//! Tasks are matched to the baseline by task ID. For each match:
//! - `duration_days` = actual working days - baseline working days
//! - `end_date_days` = actual end - baseline end (negative = ahead)
//! - `completion_percentage` = actual progress - progress expected at the
//!   status date had the task followed its baseline dates
//!
//! Overall schedule performance index (SPI) is actual completion over expected
//! completion, defined as 1 when nothing is expected yet.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::allocation::round_percent;
use crate::baseline::{BaselineSnapshot, BaselineTask};
use crate::calendar::{business_days, DateInterval};
use crate::config::{PlanningPolicy, SchedulePolicy};
use crate::domain::{span_of, Phase, ProjectSnapshot, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    Ahead,
    OnTrack,
    Behind,
    AtRisk,
}

/// Duration, end date and completion of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMeasure {
    /// Working days
    pub duration: u32,
    pub end_date: NaiveDate,
    /// Percent complete, 0-100
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceDelta {
    pub duration_days: i64,
    pub end_date_days: i64,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    pub baseline: ScheduleMeasure,
    pub actual: ScheduleMeasure,
    pub variance: VarianceDelta,
    pub status: ScheduleStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVariance {
    pub task_id: Uuid,
    pub phase_id: Uuid,
    pub name: String,
    pub critical: bool,
    #[serde(flatten)]
    pub record: Variance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseVariance {
    pub phase_id: Uuid,
    pub name: String,
    pub critical: bool,
    #[serde(flatten)]
    pub record: Variance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallVariance {
    #[serde(flatten)]
    pub record: Variance,
    pub schedule_performance_index: f64,
    /// Slip of the project end: the latest actual end against the latest
    /// baseline end
    pub schedule_variance_days: i64,
    /// Phase whose actual end is the project end
    pub critical_phase_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ahead: usize,
    pub on_track: usize,
    pub behind: usize,
    pub at_risk: usize,
}

impl StatusCounts {
    fn record(mut self, status: ScheduleStatus) -> Self {
        match status {
            ScheduleStatus::Ahead => self.ahead += 1,
            ScheduleStatus::OnTrack => self.on_track += 1,
            ScheduleStatus::Behind => self.behind += 1,
            ScheduleStatus::AtRisk => self.at_risk += 1,
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVariance {
    pub baseline_id: Uuid,
    pub baseline_name: String,
    pub as_of: NaiveDate,
    pub tasks: Vec<TaskVariance>,
    pub phases: Vec<PhaseVariance>,
    pub overall: OverallVariance,
    pub status_counts: StatusCounts,
    /// Compared tasks at 100% progress
    pub completed_tasks: usize,
    /// Tasks added since the baseline was saved
    pub unbaselined_tasks: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    MissingBaseline,
    NoComparableTasks,
}

/// Outcome of a baseline comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineComparison {
    /// Nothing to compare; the caller should render an empty state
    NoData { reason: NoDataReason },
    Compared(ScheduleVariance),
}

impl BaselineComparison {
    pub fn variance(&self) -> Option<&ScheduleVariance> {
        match self {
            BaselineComparison::Compared(variance) => Some(variance),
            BaselineComparison::NoData { .. } => None,
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self, BaselineComparison::Compared(_))
    }
}

/// Status of a task or phase from its end-date slip.
///
/// A late critical item is at risk, a late one behind. Only non-critical
/// items are reported ahead; an early critical item stays on track.
pub fn classify_status(
    end_date_days: i64,
    critical: bool,
    policy: &SchedulePolicy,
) -> ScheduleStatus {
    let late = end_date_days > policy.behind_tolerance_days;
    if late && critical {
        ScheduleStatus::AtRisk
    } else if late {
        ScheduleStatus::Behind
    } else if end_date_days < 0 && !critical {
        ScheduleStatus::Ahead
    } else {
        ScheduleStatus::OnTrack
    }
}

/// Progress expected on `as_of` if work follows `planned` linearly in
/// working days. 0 before the planned start, 100 from the planned end on.
pub fn expected_progress(planned: &DateInterval, as_of: NaiveDate) -> f64 {
    if !planned.is_valid() || as_of < planned.start {
        return 0.0;
    }
    if as_of >= planned.end {
        return 100.0;
    }

    let elapsed = DateInterval::new(planned.start, as_of);
    let total = business_days(planned);
    if total == 0 {
        // Weekend-only plan: fall back to calendar days.
        return 100.0 * elapsed.calendar_days() as f64 / planned.calendar_days() as f64;
    }
    100.0 * business_days(&elapsed) as f64 / total as f64
}

/// Actual over expected completion; 1 when nothing is expected yet.
///
/// Group completions fed in here are both weighted by baseline working
/// days, the earned-value convention.
pub fn schedule_performance_index(actual_completion: f64, expected_completion: f64) -> f64 {
    if expected_completion <= 0.0 || !expected_completion.is_finite() {
        return 1.0;
    }
    actual_completion / expected_completion
}

/// A task present in both the snapshot and the baseline.
struct Matched<'a> {
    phase: &'a Phase,
    task: &'a Task,
    planned: &'a BaselineTask,
}

impl Matched<'_> {
    fn actual_progress(&self) -> f64 {
        self.task.progress.clamp(0.0, 100.0)
    }

    fn expected(&self, as_of: NaiveDate) -> f64 {
        expected_progress(&self.planned.interval(), as_of)
    }

    fn planned_days(&self) -> u32 {
        business_days(&self.planned.interval())
    }
}

fn weighted_average<I>(values: I) -> f64
where
    I: IntoIterator<Item = (f64, u32)>,
{
    let (sum, weight, plain, count) = values.into_iter().fold(
        (0.0, 0u64, 0.0, 0usize),
        |(sum, weight, plain, count), (value, w)| {
            (sum + value * w as f64, weight + w as u64, plain + value, count + 1)
        },
    );
    if weight > 0 {
        sum / weight as f64
    } else if count > 0 {
        plain / count as f64
    } else {
        0.0
    }
}

/// Build a variance record for a group of matched tasks.
fn group_record(
    matched: &[&Matched<'_>],
    as_of: NaiveDate,
    policy: &PlanningPolicy,
) -> Option<(ScheduleMeasure, ScheduleMeasure)> {
    let actual_span = span_of(matched.iter().map(|m| m.task.interval()))?;
    let planned_span = span_of(matched.iter().map(|m| m.planned.interval()))?;
    let decimals = policy.capacity.percent_decimals;

    // Both sides weighted by baseline working days, so re-dating a task
    // without reporting progress leaves completion unchanged.
    let actual_completion = weighted_average(
        matched
            .iter()
            .map(|m| (m.actual_progress(), m.planned_days())),
    );
    let expected_completion =
        weighted_average(matched.iter().map(|m| (m.expected(as_of), m.planned_days())));

    Some((
        ScheduleMeasure {
            duration: business_days(&planned_span),
            end_date: planned_span.end,
            completion: round_percent(expected_completion, decimals),
        },
        ScheduleMeasure {
            duration: business_days(&actual_span),
            end_date: actual_span.end,
            completion: round_percent(actual_completion, decimals),
        },
    ))
}

fn delta(baseline: &ScheduleMeasure, actual: &ScheduleMeasure, decimals: u32) -> VarianceDelta {
    VarianceDelta {
        duration_days: actual.duration as i64 - baseline.duration as i64,
        end_date_days: actual.end_date.signed_duration_since(baseline.end_date).num_days(),
        completion_percentage: round_percent(actual.completion - baseline.completion, decimals),
    }
}

fn task_variance(m: &Matched<'_>, as_of: NaiveDate, policy: &PlanningPolicy) -> TaskVariance {
    let decimals = policy.capacity.percent_decimals;
    let baseline = ScheduleMeasure {
        duration: business_days(&m.planned.interval()),
        end_date: m.planned.end_date,
        completion: round_percent(m.expected(as_of), decimals),
    };
    let actual = ScheduleMeasure {
        duration: m.task.working_days(),
        end_date: m.task.end_date,
        completion: round_percent(m.actual_progress(), decimals),
    };
    let variance = delta(&baseline, &actual, decimals);
    let status = classify_status(variance.end_date_days, m.task.critical, &policy.schedule);

    TaskVariance {
        task_id: m.task.id,
        phase_id: m.phase.id,
        name: m.task.name.clone(),
        critical: m.task.critical,
        record: Variance {
            baseline,
            actual,
            variance,
            status,
        },
    }
}

fn overall_status(
    schedule_variance_days: i64,
    spi: f64,
    policy: &SchedulePolicy,
) -> ScheduleStatus {
    let late = schedule_variance_days > policy.behind_tolerance_days;
    if late && spi < policy.at_risk_spi {
        ScheduleStatus::AtRisk
    } else if late {
        ScheduleStatus::Behind
    } else if schedule_variance_days < 0 {
        ScheduleStatus::Ahead
    } else {
        ScheduleStatus::OnTrack
    }
}

/// Compare the current snapshot against a saved baseline as of `as_of`.
///
/// A missing baseline, or a baseline sharing no tasks with the snapshot,
/// yields [`BaselineComparison::NoData`].
pub fn compare_to_baseline(
    project: &ProjectSnapshot,
    baseline: Option<&BaselineSnapshot>,
    as_of: NaiveDate,
    policy: &PlanningPolicy,
) -> BaselineComparison {
    let Some(baseline) = baseline else {
        tracing::warn!(project_id = %project.id, "no baseline to compare against");
        return BaselineComparison::NoData {
            reason: NoDataReason::MissingBaseline,
        };
    };
    tracing::debug!(
        project_id = %project.id,
        baseline_id = %baseline.id,
        %as_of,
        "comparing to baseline"
    );

    let planned_by_id: HashMap<Uuid, &BaselineTask> = baseline
        .all_tasks()
        .into_iter()
        .map(|t| (t.task_id, t))
        .collect();

    let (matched, unbaselined): (Vec<_>, Vec<_>) = project
        .all_tasks()
        .into_iter()
        .map(|(phase, task)| match planned_by_id.get(&task.id).copied() {
            Some(planned) => Ok(Matched {
                phase,
                task,
                planned,
            }),
            None => Err(task.id),
        })
        .partition(Result::is_ok);
    let matched: Vec<Matched<'_>> = matched.into_iter().filter_map(Result::ok).collect();
    let unbaselined_tasks: Vec<Uuid> = unbaselined.into_iter().filter_map(Result::err).collect();

    if matched.is_empty() {
        tracing::warn!(baseline_id = %baseline.id, "baseline shares no tasks with the project");
        return BaselineComparison::NoData {
            reason: NoDataReason::NoComparableTasks,
        };
    }

    let decimals = policy.capacity.percent_decimals;
    let tasks: Vec<TaskVariance> = matched
        .iter()
        .map(|m| task_variance(m, as_of, policy))
        .collect();

    let phases: Vec<PhaseVariance> = project
        .phases
        .iter()
        .filter_map(|phase| {
            let members: Vec<&Matched<'_>> =
                matched.iter().filter(|m| m.phase.id == phase.id).collect();
            let (baseline, actual) = group_record(&members, as_of, policy)?;
            let critical = members.iter().any(|m| m.task.critical);
            let variance = delta(&baseline, &actual, decimals);
            let status = classify_status(variance.end_date_days, critical, &policy.schedule);
            Some(PhaseVariance {
                phase_id: phase.id,
                name: phase.name.clone(),
                critical,
                record: Variance {
                    baseline,
                    actual,
                    variance,
                    status,
                },
            })
        })
        .collect();

    let all: Vec<&Matched<'_>> = matched.iter().collect();
    let Some((overall_baseline, overall_actual)) = group_record(&all, as_of, policy) else {
        // Every matched task has an inverted interval on one side.
        return BaselineComparison::NoData {
            reason: NoDataReason::NoComparableTasks,
        };
    };
    let overall_delta = delta(&overall_baseline, &overall_actual, decimals);
    let spi = round_percent(
        schedule_performance_index(overall_actual.completion, overall_baseline.completion),
        decimals,
    );

    // The phase finishing last determines the project end; ties go to the
    // earliest phase.
    let critical_phase = phases.iter().reduce(|best, p| {
        if p.record.actual.end_date > best.record.actual.end_date {
            p
        } else {
            best
        }
    });
    let schedule_variance_days = overall_delta.end_date_days;

    let overall = OverallVariance {
        record: Variance {
            status: overall_status(schedule_variance_days, spi, &policy.schedule),
            baseline: overall_baseline,
            actual: overall_actual,
            variance: overall_delta,
        },
        schedule_performance_index: spi,
        schedule_variance_days,
        critical_phase_id: critical_phase.map(|p| p.phase_id),
    };

    let status_counts = tasks
        .iter()
        .fold(StatusCounts::default(), |counts, t| counts.record(t.record.status));
    let completed_tasks = matched.iter().filter(|m| m.task.is_complete()).count();

    tracing::debug!(
        tasks = tasks.len(),
        phases = phases.len(),
        spi,
        schedule_variance_days,
        "baseline comparison complete"
    );

    BaselineComparison::Compared(ScheduleVariance {
        baseline_id: baseline.id,
        baseline_name: baseline.name.clone(),
        as_of,
        tasks,
        phases,
        overall,
        status_counts,
        completed_tasks,
        unbaselined_tasks,
    })
}
