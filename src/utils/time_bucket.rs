//! Calendar arithmetic for bucketing task records.
//!
//! Every function keeps the offset of the instant it is given, so "day" and
//! "week" mean the calendar of that offset.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, Timelike, Weekday};

use crate::models::analytics::{DayType, PeriodKind, TimeSlot};

const MILLIS_PER_DAY: i64 = 86_400_000;

pub fn start_of_day(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    instant
        - Duration::seconds(i64::from(instant.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

pub fn end_of_day(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(instant) + Duration::days(1) - Duration::nanoseconds(1)
}

/// Weeks start on Monday.
pub fn start_of_week(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = instant.weekday().num_days_from_monday();
    start_of_day(instant) - Duration::days(i64::from(offset))
}

pub fn end_of_week(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_week(instant) + Duration::days(7) - Duration::nanoseconds(1)
}

pub fn start_of_month(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(instant) - Duration::days(i64::from(instant.day0()))
}

pub fn end_of_month(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let length = days_in_month(instant.year(), instant.month());
    start_of_month(instant) + Duration::days(i64::from(length)) - Duration::nanoseconds(1)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Shifts by whole months, clamping the day to the target month's length.
/// `None` when the result falls outside the representable range.
pub fn add_months(instant: DateTime<FixedOffset>, months: i32) -> Option<DateTime<FixedOffset>> {
    if months >= 0 {
        instant.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        instant.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Ceiling of the absolute elapsed days between two instants.
pub fn days_difference(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> i64 {
    let millis = (b - a).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Signed fractional days from `from` to `to`.
pub fn elapsed_days(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY as f64
}

pub fn is_weekend(instant: DateTime<FixedOffset>) -> bool {
    matches!(instant.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_weekday(instant: DateTime<FixedOffset>) -> bool {
    !is_weekend(instant)
}

pub fn day_type(instant: DateTime<FixedOffset>) -> DayType {
    if is_weekend(instant) {
        DayType::Weekend
    } else {
        DayType::Weekday
    }
}

pub fn time_slot(instant: DateTime<FixedOffset>) -> TimeSlot {
    match instant.hour() {
        6..=11 => TimeSlot::Morning,
        12..=17 => TimeSlot::Afternoon,
        18..=21 => TimeSlot::Evening,
        _ => TimeSlot::Night,
    }
}

/// ISO-8601 week of year. Labels only; bucket boundaries use
/// [`start_of_week`].
pub fn week_number(instant: DateTime<FixedOffset>) -> u32 {
    instant.iso_week().week()
}

pub fn bucket_label(start: DateTime<FixedOffset>, period: PeriodKind) -> String {
    match period {
        PeriodKind::Day => start.format("%m/%d").to_string(),
        PeriodKind::Week => format!("W{}", week_number(start)),
        PeriodKind::Month => start.format("%Y-%m").to_string(),
    }
}

pub fn format_relative(instant: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> String {
    let seconds = (now - instant).num_seconds();
    if seconds < 60 {
        "刚刚".to_string()
    } else if seconds < 3_600 {
        format!("{} 分钟前", seconds / 60)
    } else if seconds < 86_400 {
        format!("{} 小时前", seconds / 3_600)
    } else if seconds < 7 * 86_400 {
        format!("{} 天前", seconds / 86_400)
    } else {
        instant.format("%Y-%m-%d").to_string()
    }
}

/// Instants from `start` to `end` inclusive. Each step is computed from
/// `start`, so monthly steps from the 31st clamp per month without drifting.
/// Clone the range to walk it again.
#[derive(Debug, Clone)]
pub struct DateRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    step: PeriodKind,
    index: u32,
}

impl DateRange {
    pub fn restart(&mut self) {
        self.index = 0;
    }

    fn nth_step(&self, index: u32) -> Option<DateTime<FixedOffset>> {
        match self.step {
            PeriodKind::Day => self
                .start
                .checked_add_signed(Duration::days(i64::from(index))),
            PeriodKind::Week => self
                .start
                .checked_add_signed(Duration::weeks(i64::from(index))),
            PeriodKind::Month => self.start.checked_add_months(Months::new(index)),
        }
    }
}

impl Iterator for DateRange {
    type Item = DateTime<FixedOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.nth_step(self.index)?;
        if current > self.end {
            return None;
        }
        self.index += 1;
        Some(current)
    }
}

pub fn date_range(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    step: PeriodKind,
) -> DateRange {
    DateRange {
        start,
        end,
        step,
        index: 0,
    }
}
