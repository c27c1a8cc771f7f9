use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use types::DateRange;

use crate::ScheduleError;

/// Maps a week number of a year to its Monday..Friday range.
pub trait WeekRangeStrategy: Send + Sync {
    fn resolve(&self, week: u32, year: i32) -> Result<DateRange, ScheduleError>;
}

/// Week 1 starts on the first Monday on or after January 1st.
///
/// This does not match ISO-8601 numbering when January 1st falls on
/// Tuesday..Thursday.
#[derive(Clone, Copy, Debug, Default)]
pub struct MondayFinder;

impl WeekRangeStrategy for MondayFinder {
    fn resolve(&self, week: u32, year: i32) -> Result<DateRange, ScheduleError> {
        check_week(week, year)?;
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ScheduleError::InvalidWeek { week, year })?;
        let iso_weekday = jan1.weekday().number_from_monday() as i64;
        let offset = (8 - iso_weekday) % 7;
        let monday = jan1
            .checked_add_signed(Duration::days(offset + (week as i64 - 1) * 7))
            .ok_or(ScheduleError::InvalidWeek { week, year })?;
        monday_to_friday(monday, week, year)
    }
}

/// ISO-8601 week numbering.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoWeek;

impl WeekRangeStrategy for IsoWeek {
    fn resolve(&self, week: u32, year: i32) -> Result<DateRange, ScheduleError> {
        check_week(week, year)?;
        let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .ok_or(ScheduleError::InvalidWeek { week, year })?;
        monday_to_friday(monday, week, year)
    }
}

/// Weeks running past the last representable date are invalid.
fn monday_to_friday(monday: NaiveDate, week: u32, year: i32) -> Result<DateRange, ScheduleError> {
    let friday = monday
        .checked_add_signed(Duration::days(4))
        .ok_or(ScheduleError::InvalidWeek { week, year })?;
    Ok(DateRange::days(monday, friday))
}

fn check_week(week: u32, year: i32) -> Result<(), ScheduleError> {
    if (1..=53).contains(&week) {
        Ok(())
    } else {
        Err(ScheduleError::InvalidWeek { week, year })
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekStrategyKind {
    #[default]
    MondayFinder,
    Iso,
}

impl WeekStrategyKind {
    pub fn strategy(self) -> Arc<dyn WeekRangeStrategy> {
        match self {
            WeekStrategyKind::MondayFinder => Arc::new(MondayFinder),
            WeekStrategyKind::Iso => Arc::new(IsoWeek),
        }
    }
}

/// Monday of the Monday-based calendar week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn jan_first_on_monday_is_week_one() {
        // 2024-01-01 is a Monday.
        let r = MondayFinder.resolve(1, 2024).unwrap();
        assert_eq!(r.start.date(), d(2024, 1, 1));
        assert_eq!(r.end.date(), d(2024, 1, 5));
        assert_eq!(r.end.time(), types::end_of_day());
    }

    #[test]
    fn first_monday_after_midweek_new_year() {
        // 2025-01-01 is a Wednesday: first Monday is the 6th.
        let r = MondayFinder.resolve(1, 2025).unwrap();
        assert_eq!(r.start.date(), d(2025, 1, 6));
        let r = MondayFinder.resolve(10, 2025).unwrap();
        assert_eq!(r.start.date(), d(2025, 3, 10));
    }

    #[test]
    fn sunday_new_year_starts_next_day() {
        // 2023-01-01 is a Sunday.
        let r = MondayFinder.resolve(1, 2023).unwrap();
        assert_eq!(r.start.date(), d(2023, 1, 2));
    }

    #[test]
    fn iso_and_monday_finder_diverge_for_midweek_new_year() {
        // ISO week 1 of 2025 starts on 2024-12-30.
        let iso = IsoWeek.resolve(1, 2025).unwrap();
        assert_eq!(iso.start.date(), d(2024, 12, 30));
        assert_ne!(iso.start, MondayFinder.resolve(1, 2025).unwrap().start);
    }

    #[test]
    fn out_of_range_week_is_rejected() {
        assert!(matches!(MondayFinder.resolve(0, 2024), Err(ScheduleError::InvalidWeek { .. })));
        assert!(matches!(IsoWeek.resolve(54, 2024), Err(ScheduleError::InvalidWeek { .. })));
        // 2024 has only 52 ISO weeks.
        assert!(IsoWeek.resolve(53, 2024).is_err());
    }

    #[test]
    fn weeks_past_the_calendar_end_are_rejected() {
        let last_year = NaiveDate::MAX.year();
        assert!(matches!(
            MondayFinder.resolve(53, last_year),
            Err(ScheduleError::InvalidWeek { week: 53, .. })
        ));
        assert!(MondayFinder.resolve(1, last_year + 1).is_err());
        assert!(MondayFinder.resolve(1, last_year).is_ok());
    }

    #[test]
    fn monday_of_week() {
        assert_eq!(monday_of(d(2024, 3, 7)), d(2024, 3, 4));
        assert_eq!(monday_of(d(2024, 3, 10)), d(2024, 3, 4));
        assert_eq!(monday_of(d(2024, 3, 4)), d(2024, 3, 4));
    }
}
