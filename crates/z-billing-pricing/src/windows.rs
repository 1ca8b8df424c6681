//! Fixed-size usage windows within a billing period.
//!
//! Usage stores usually return only the windows that saw events. Bucketed pricing
//! needs one value per window of the period, so [`fill_bucketed_usage`] lays the
//! sparse results over the expected windows and fills the gaps with zero.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Size of a usage window. All windows are aligned in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSize {
    /// One minute.
    Minute,
    /// Fifteen minutes, aligned to the quarter hour.
    FifteenMin,
    /// Thirty minutes, aligned to the half hour.
    ThirtyMin,
    /// One hour.
    Hour,
    /// Three hours, aligned to 00:00, 03:00, ...
    ThreeHour,
    /// Six hours, aligned to 00:00, 06:00, ...
    SixHour,
    /// Twelve hours, aligned to 00:00 and 12:00.
    TwelveHour,
    /// One calendar day.
    Day,
    /// Seven days starting on Sunday.
    Week,
    /// One calendar month starting on the 1st.
    Month,
}

impl WindowSize {
    /// Start of the window containing `t`.
    #[must_use]
    pub fn align(self, t: DateTime<Utc>) -> DateTime<Utc> {
        let date = t.date_naive();
        let (hour, minute) = (t.hour(), t.minute());

        let start = match self {
            Self::Minute => date.and_hms_opt(hour, minute, 0),
            Self::FifteenMin => date.and_hms_opt(hour, minute / 15 * 15, 0),
            Self::ThirtyMin => date.and_hms_opt(hour, minute / 30 * 30, 0),
            Self::Hour => date.and_hms_opt(hour, 0, 0),
            Self::ThreeHour => date.and_hms_opt(hour / 3 * 3, 0, 0),
            Self::SixHour => date.and_hms_opt(hour / 6 * 6, 0, 0),
            Self::TwelveHour => date.and_hms_opt(hour / 12 * 12, 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Week => date
                .checked_sub_signed(Duration::days(i64::from(
                    date.weekday().num_days_from_sunday(),
                )))
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Self::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };

        start.map_or(t, |naive| Utc.from_utc_datetime(&naive))
    }

    /// Start of the window following the one starting at `start`.
    #[must_use]
    pub fn next(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let step = match self {
            Self::Minute => Duration::minutes(1),
            Self::FifteenMin => Duration::minutes(15),
            Self::ThirtyMin => Duration::minutes(30),
            Self::Hour => Duration::hours(1),
            Self::ThreeHour => Duration::hours(3),
            Self::SixHour => Duration::hours(6),
            Self::TwelveHour => Duration::hours(12),
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => return start.checked_add_months(Months::new(1)),
        };
        start.checked_add_signed(step)
    }
}

/// Usage value reported for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUsage {
    /// Start of the window.
    pub window_start: DateTime<Utc>,
    /// Usage observed in the window (typically its maximum).
    pub value: Decimal,
}

/// Starts of the windows overlapping `[period_start, period_end)`, in order.
#[must_use]
pub fn expected_window_starts(
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    size: WindowSize,
) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    if period_end <= period_start {
        return starts;
    }

    let mut current = Some(size.align(period_start));
    while let Some(start) = current.filter(|s| *s < period_end) {
        starts.push(start);
        current = size.next(start);
    }
    starts
}

/// One usage value per expected window of the period, zero where `results` has none.
///
/// Results are matched to windows on their start time truncated to the second.
#[must_use]
pub fn fill_bucketed_usage(
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    size: WindowSize,
    results: &[WindowUsage],
) -> Vec<Decimal> {
    let by_window: HashMap<DateTime<Utc>, Decimal> = results
        .iter()
        .map(|r| (truncate_to_second(r.window_start), r.value))
        .collect();

    expected_window_starts(period_start, period_end, size)
        .into_iter()
        .map(|start| {
            by_window
                .get(&truncate_to_second(start))
                .copied()
                .unwrap_or(Decimal::ZERO)
        })
        .collect()
}

fn truncate_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap_or(t)
}
