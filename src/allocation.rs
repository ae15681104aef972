//! Weekly allocation map, the canonical output of every allocation algorithm.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::WeekId;
use crate::config::CapacityPolicy;

/// Ordered mapping of week identifier to allocation percentage.
///
/// Iteration order is chronological. Values may exceed 100 to signal
/// overallocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyAllocationMap(BTreeMap<WeekId, f64>);

impl WeeklyAllocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from per-week values in index order (`W01` first).
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (WeekId::from_index(index), value))
            .collect()
    }

    pub fn get(&self, week: WeekId) -> Option<f64> {
        self.0.get(&week).copied()
    }

    /// Value for `week`, treating absent weeks as zero.
    pub fn value(&self, week: WeekId) -> f64 {
        self.get(week).unwrap_or(0.0)
    }

    /// Return a copy with `week` set to `percent`.
    pub fn insert(mut self, week: WeekId, percent: f64) -> Self {
        self.0.insert(week, percent);
        self
    }

    /// Return a copy with `percent` added to `week`'s running total.
    pub fn add(mut self, week: WeekId, percent: f64) -> Self {
        *self.0.entry(week).or_insert(0.0) += percent;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (WeekId, f64)> + '_ {
        self.0.iter().map(|(week, value)| (*week, *value))
    }

    pub fn weeks(&self) -> impl Iterator<Item = WeekId> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values().sum()
    }

    /// Round every value to the policy's precision.
    pub fn rounded(self, decimals: u32) -> Self {
        self.0
            .into_iter()
            .map(|(week, value)| (week, round_percent(value, decimals)))
            .collect()
    }
}

impl FromIterator<(WeekId, f64)> for WeeklyAllocationMap {
    fn from_iter<T: IntoIterator<Item = (WeekId, f64)>>(iter: T) -> Self {
        WeeklyAllocationMap(iter.into_iter().collect())
    }
}

impl IntoIterator for WeeklyAllocationMap {
    type Item = (WeekId, f64);
    type IntoIter = std::collections::btree_map::IntoIter<WeekId, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Clamp a percentage into the policy bounds. NaN becomes the lower bound.
pub fn clamp_percent(percent: f64, policy: &CapacityPolicy) -> f64 {
    if percent.is_nan() {
        return policy.min_percent;
    }
    percent.clamp(policy.min_percent, policy.max_percent)
}

/// Round to `decimals` places, normalising `-0.0` to `0.0`.
pub fn round_percent(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_assigns_week_ids() {
        let map = WeeklyAllocationMap::from_values([10.0, 20.0, 30.0]);
        let weeks: Vec<String> = map.weeks().map(|w| w.to_string()).collect();
        assert_eq!(weeks, vec!["W01", "W02", "W03"]);
        assert_eq!(map.get(WeekId(2)), Some(20.0));
        assert_eq!(map.value(WeekId(9)), 0.0);
    }

    #[test]
    fn test_add_accumulates() {
        let map = WeeklyAllocationMap::new()
            .add(WeekId(1), 40.0)
            .add(WeekId(1), 70.0);
        assert_eq!(map.get(WeekId(1)), Some(110.0));
    }

    #[test]
    fn test_chronological_order_past_99_weeks() {
        let map = WeeklyAllocationMap::new()
            .insert(WeekId(100), 1.0)
            .insert(WeekId(11), 2.0)
            .insert(WeekId(9), 3.0);
        let weeks: Vec<u32> = map.weeks().map(|w| w.0).collect();
        assert_eq!(weeks, vec![9, 11, 100]);
    }

    #[test]
    fn test_serializes_as_object() {
        let map = WeeklyAllocationMap::from_values([100.0, 40.5]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"W01":100.0,"W02":40.5}"#);

        let back: WeeklyAllocationMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_clamp_percent() {
        let policy = CapacityPolicy::default();
        assert_eq!(clamp_percent(-5.0, &policy), 0.0);
        assert_eq!(clamp_percent(150.0, &policy), 150.0);
        assert_eq!(clamp_percent(250.0, &policy), 200.0);
        assert_eq!(clamp_percent(f64::NAN, &policy), 0.0);
    }

    #[test]
    fn test_round_percent_hides_float_noise() {
        assert_eq!(round_percent(0.1 + 0.2, 2), 0.3);
        assert_eq!(round_percent(4.618937644341801, 2), 4.62);
        assert_eq!(round_percent(-0.001, 2), 0.0);
        assert!(round_percent(-0.001, 2).is_sign_positive());
    }
}
