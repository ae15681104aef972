//! Calendar arithmetic shared by every allocation computation.
//!
//! - [`week_buckets`] splits a date interval into Monday-aligned weeks, the
//!   common time axis of the engine.
//! - [`business_days`] counts weekdays (Mon-Fri) in an interval, inclusive of
//!   both endpoints.
//!
//! Inverted intervals (`end < start`) are never an error: they produce no
//! buckets and zero business days.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Closed date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day interval
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Number of calendar days covered, inclusive. Zero when inverted.
    pub fn calendar_days(&self) -> u32 {
        if !self.is_valid() {
            return 0;
        }
        (self.end.signed_duration_since(self.start).num_days() + 1) as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Overlapping sub-interval, if the two intervals share at least one day.
    pub fn intersection(&self, other: &DateInterval) -> Option<DateInterval> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateInterval { start, end })
    }
}

/// 1-based week identifier, rendered as `W01`, `W02`, ...
///
/// Ordering is numeric, so `W100` sorts after `W99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekId(pub u32);

impl WeekId {
    /// Identifier for a 0-based week index.
    pub fn from_index(index: usize) -> Self {
        WeekId(index as u32 + 1)
    }

    pub fn index(&self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{:02}", self.0)
    }
}

impl FromStr for WeekId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('W')
            .ok_or_else(|| format!("Week identifier must start with 'W': {}", s))?;
        let number: u32 = digits
            .parse()
            .map_err(|e| format!("Invalid week number in '{}': {}", s, e))?;
        if number == 0 {
            return Err(format!("Week identifiers are 1-based: {}", s));
        }
        Ok(WeekId(number))
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One Monday-to-Sunday week on the project axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub id: WeekId,
    /// Monday of the week (may precede the interval start)
    pub start: NaiveDate,
    /// Sunday of the week, inclusive
    pub end: NaiveDate,
}

impl WeekBucket {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(self.start, self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.interval().contains(date)
    }
}

/// Monday of the week containing `date`, or `NaiveDate::MIN` when that
/// Monday is before the representable range.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Duration::days(date.weekday().num_days_from_monday() as i64);
    date.checked_sub_signed(back).unwrap_or(NaiveDate::MIN)
}

/// Every calendar week the interval touches, Monday-aligned and contiguous.
///
/// The first bucket starts on the Monday of `interval.start`'s week, not on
/// `interval.start` itself. Returns an empty sequence for inverted intervals.
/// At the edges of the date range buckets are cut to `NaiveDate::MIN` and
/// `NaiveDate::MAX`.
pub fn week_buckets(interval: &DateInterval) -> Vec<WeekBucket> {
    if !interval.is_valid() {
        tracing::warn!(
            start = %interval.start,
            end = %interval.end,
            "inverted interval, no week buckets"
        );
        return Vec::new();
    }

    let first_monday = week_start(interval.start);
    let weeks = (interval.end.signed_duration_since(first_monday).num_days() / 7) + 1;

    (0..weeks as usize)
        .map_while(|index| {
            let start = first_monday.checked_add_signed(Duration::weeks(index as i64))?;
            let end = start
                .checked_add_signed(Duration::days(6))
                .unwrap_or(NaiveDate::MAX);
            Some(WeekBucket {
                id: WeekId::from_index(index),
                start,
                end,
            })
        })
        .collect()
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in the interval, both endpoints included. Zero when inverted.
pub fn business_days(interval: &DateInterval) -> u32 {
    let total = interval.calendar_days();
    if total == 0 {
        return 0;
    }

    // Every run of 7 consecutive days holds exactly 5 weekdays.
    let full_weeks = total / 7;
    let tail = interval
        .start
        .checked_add_signed(Duration::weeks(full_weeks as i64))
        .map_or(0, |tail_start| {
            (0..total % 7)
                .filter_map(|offset| tail_start.checked_add_signed(Duration::days(offset as i64)))
                .filter(|date| is_weekday(*date))
                .count() as u32
        });

    full_weeks * 5 + tail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_id_display_and_parse() {
        assert_eq!(WeekId(1).to_string(), "W01");
        assert_eq!(WeekId(12).to_string(), "W12");
        assert_eq!(WeekId(104).to_string(), "W104");
        assert_eq!("W07".parse::<WeekId>().unwrap(), WeekId(7));
        assert_eq!("W104".parse::<WeekId>().unwrap(), WeekId(104));
        assert!("W00".parse::<WeekId>().is_err());
        assert!("07".parse::<WeekId>().is_err());
        assert!("Wx".parse::<WeekId>().is_err());
    }

    #[test]
    fn test_week_id_orders_numerically() {
        assert!(WeekId(99) < WeekId(100));
        assert_eq!(WeekId::from_index(0), WeekId(1));
        assert_eq!(WeekId(3).index(), 2);
    }

    #[test]
    fn test_week_id_serializes_as_string() {
        let json = serde_json::to_string(&WeekId(3)).unwrap();
        assert_eq!(json, "\"W03\"");
        let back: WeekId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WeekId(3));
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-01-03 is a Wednesday
        assert_eq!(week_start(date(2024, 1, 3)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 1)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 7)), date(2024, 1, 1));
    }

    #[test]
    fn test_date_range_edges_do_not_overflow() {
        let last = DateInterval::day(NaiveDate::MAX);
        let buckets = week_buckets(&last);
        assert_eq!(buckets.len(), 1);
        assert!(buckets[0].contains(NaiveDate::MAX));
        assert_eq!(buckets[0].end, NaiveDate::MAX);
        assert!(business_days(&last) <= 1);

        let first = DateInterval::day(NaiveDate::MIN);
        let buckets = week_buckets(&first);
        assert_eq!(buckets.len(), 1);
        assert!(buckets[0].contains(NaiveDate::MIN));
        assert!(business_days(&first) <= 1);

        let max_start = week_start(NaiveDate::MAX);
        let tail = DateInterval::new(max_start - Duration::days(14), NaiveDate::MAX);
        let buckets = week_buckets(&tail);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[2].end, NaiveDate::MAX);
        assert!(business_days(&tail) >= 10);
    }

    #[test]
    fn test_buckets_for_midweek_start() {
        let interval = DateInterval::new(date(2024, 1, 3), date(2024, 1, 16));
        let buckets = week_buckets(&interval);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].id.to_string(), "W01");
        assert_eq!(buckets[0].start, date(2024, 1, 1));
        assert_eq!(buckets[0].end, date(2024, 1, 7));
        assert_eq!(buckets[2].id.to_string(), "W03");
        assert_eq!(buckets[2].start, date(2024, 1, 15));
        assert!(buckets[2].contains(date(2024, 1, 16)));
    }

    #[test]
    fn test_single_day_interval_has_one_bucket() {
        let buckets = week_buckets(&DateInterval::day(date(2024, 1, 6)));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].start, date(2024, 1, 1));
    }

    #[test]
    fn test_sunday_to_monday_spans_two_buckets() {
        let buckets = week_buckets(&DateInterval::new(date(2024, 1, 7), date(2024, 1, 8)));
        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn test_inverted_interval_has_no_buckets() {
        let interval = DateInterval::new(date(2024, 1, 10), date(2024, 1, 1));
        assert!(week_buckets(&interval).is_empty());
        assert_eq!(business_days(&interval), 0);
        assert_eq!(interval.calendar_days(), 0);
    }

    #[test]
    fn test_business_days_full_week() {
        let interval = DateInterval::new(date(2024, 1, 1), date(2024, 1, 7));
        assert_eq!(business_days(&interval), 5);
    }

    #[test]
    fn test_business_days_weekend_only() {
        let interval = DateInterval::new(date(2024, 1, 6), date(2024, 1, 7));
        assert_eq!(business_days(&interval), 0);
    }

    #[test]
    fn test_business_days_across_weekend() {
        // Thu 4th .. Tue 9th: Thu, Fri, Mon, Tue
        let interval = DateInterval::new(date(2024, 1, 4), date(2024, 1, 9));
        assert_eq!(business_days(&interval), 4);
    }

    #[test]
    fn test_business_days_long_span() {
        // January 2024 has 23 weekdays
        let interval = DateInterval::new(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(business_days(&interval), 23);
    }

    #[test]
    fn test_intersection() {
        let a = DateInterval::new(date(2024, 1, 1), date(2024, 1, 10));
        let b = DateInterval::new(date(2024, 1, 8), date(2024, 1, 20));
        assert_eq!(
            a.intersection(&b),
            Some(DateInterval::new(date(2024, 1, 8), date(2024, 1, 10)))
        );

        let c = DateInterval::new(date(2024, 1, 11), date(2024, 1, 12));
        assert_eq!(a.intersection(&c), None);
    }
}
