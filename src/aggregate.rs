//! Merge allocation sources for one resource and classify weekly load.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::{round_percent, WeeklyAllocationMap};
use crate::calendar::WeekId;
use crate::config::{CapacityPolicy, PlanningPolicy};

/// Load classification of a single week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadLevel {
    Normal,
    High,
    Overallocated,
}

impl LoadLevel {
    /// Traffic-light flag for the level
    pub fn flag(&self) -> &'static str {
        match self {
            LoadLevel::Normal => "green",
            LoadLevel::High => "amber",
            LoadLevel::Overallocated => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekLoad {
    pub week: WeekId,
    pub percent: f64,
    pub level: LoadLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub average: f64,
    pub peak: f64,
    pub total_weeks: usize,
    /// Weeks above the overallocation threshold
    pub overallocated_weeks: usize,
    /// Weeks between the high and overallocation thresholds, inclusive
    pub near_capacity_weeks: usize,
}

/// Merged allocation of one resource across all of its sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedAllocation {
    pub resource_id: Uuid,
    pub weekly: WeeklyAllocationMap,
    pub weeks: Vec<WeekLoad>,
    pub summary: AllocationSummary,
}

/// Union of all sources, summing weeks that appear in more than one.
pub fn merge_allocations<'a, I>(sources: I) -> WeeklyAllocationMap
where
    I: IntoIterator<Item = &'a WeeklyAllocationMap>,
{
    sources
        .into_iter()
        .flat_map(|source| source.iter())
        .fold(WeeklyAllocationMap::new(), |acc, (week, percent)| {
            acc.add(week, percent)
        })
}

pub fn classify_load(percent: f64, policy: &CapacityPolicy) -> LoadLevel {
    if percent > policy.over_threshold {
        LoadLevel::Overallocated
    } else if percent > policy.high_threshold {
        LoadLevel::High
    } else {
        LoadLevel::Normal
    }
}

pub fn summarize(weekly: &WeeklyAllocationMap, policy: &CapacityPolicy) -> AllocationSummary {
    if weekly.is_empty() {
        return AllocationSummary::default();
    }

    let total_weeks = weekly.len();
    let average = weekly.total() / total_weeks as f64;
    let peak = weekly.values().fold(f64::MIN, f64::max);
    let overallocated_weeks = weekly
        .values()
        .filter(|v| *v > policy.over_threshold)
        .count();
    let near_capacity_weeks = weekly
        .values()
        .filter(|v| *v >= policy.high_threshold && *v <= policy.over_threshold)
        .count();

    AllocationSummary {
        average: round_percent(average, policy.percent_decimals),
        peak,
        total_weeks,
        overallocated_weeks,
        near_capacity_weeks,
    }
}

/// Merge, classify, and summarise a resource's allocation sources.
pub fn aggregate(
    resource_id: Uuid,
    sources: &[WeeklyAllocationMap],
    policy: &PlanningPolicy,
) -> AggregatedAllocation {
    let capacity = &policy.capacity;
    let weekly = merge_allocations(sources).rounded(capacity.percent_decimals);

    let weeks: Vec<WeekLoad> = weekly
        .iter()
        .map(|(week, percent)| WeekLoad {
            week,
            percent,
            level: classify_load(percent, capacity),
        })
        .collect();
    let summary = summarize(&weekly, capacity);

    if summary.overallocated_weeks > 0 {
        tracing::warn!(
            %resource_id,
            overallocated_weeks = summary.overallocated_weeks,
            peak = summary.peak,
            "resource is overallocated"
        );
    }
    tracing::debug!(
        %resource_id,
        sources = sources.len(),
        weeks = weeks.len(),
        "aggregated allocation"
    );

    AggregatedAllocation {
        resource_id,
        weekly,
        weeks,
        summary,
    }
}
