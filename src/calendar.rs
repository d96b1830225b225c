//! Calendar helpers for day-aligned sample ranges
//!
//! Record lookup is exact-range equality, so every caller that asks the motion
//! source for a day must build the same bounds. These helpers are that single
//! definition: local midnight to the next local midnight, expressed in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

use crate::error::PedestrianError;

/// UTC bounds of `date` in the time zone `tz`
pub fn day_bounds<Tz: TimeZone>(
    date: NaiveDate,
    tz: &Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PedestrianError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| PedestrianError::InvalidDate(format!("{} has no following day", date)))?;

    Ok((local_midnight(date, tz)?, local_midnight(next, tz)?))
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, PedestrianError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PedestrianError::InvalidDate(date.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| PedestrianError::InvalidDate(format!("{} has no local midnight", date)))
}

/// The seven days before `today`, oldest first
pub fn last_seven_days(today: NaiveDate) -> Vec<NaiveDate> {
    (1..=7i64)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// The seven days of the week containing `today`, starting on `week_start`
pub fn current_week(today: NaiveDate, week_start: Weekday) -> Vec<NaiveDate> {
    let days_since_start = (7 + today.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    let first = today - Duration::days(i64::from(days_since_start));

    (0..7i64).map(|offset| first + Duration::days(offset)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_bounds_utc() {
        let (start, end) = day_bounds(date(2024, 1, 15), &Utc).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_day_bounds_with_offset() {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let (start, end) = day_bounds(date(2024, 1, 15), &new_york).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap());
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_day_bounds_are_stable() {
        let a = day_bounds(date(2024, 6, 1), &Utc).unwrap();
        let b = day_bounds(date(2024, 6, 1), &Utc).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_last_seven_days_excludes_today() {
        let days = last_seven_days(date(2024, 3, 10));

        assert_eq!(days.len(), 7);
        assert_eq!(days.first(), Some(&date(2024, 3, 3)));
        assert_eq!(days.last(), Some(&date(2024, 3, 9)));
    }

    #[test]
    fn test_current_week() {
        // 2024-03-13 is a Wednesday
        let monday_week = current_week(date(2024, 3, 13), Weekday::Mon);
        assert_eq!(monday_week[0], date(2024, 3, 11));
        assert_eq!(monday_week[6], date(2024, 3, 17));

        let sunday_week = current_week(date(2024, 3, 13), Weekday::Sun);
        assert_eq!(sunday_week[0], date(2024, 3, 10));

        let on_start = current_week(date(2024, 3, 10), Weekday::Sun);
        assert_eq!(on_start[0], date(2024, 3, 10));
    }
}
