//! Goal-completion streaks
//!
//! A streak is a maximal run of consecutive records whose `goal_reached` flag is
//! set. The scan is a single pass with constant extra memory.

use crate::error::PedestrianError;
use crate::store::RecordStore;
use crate::types::{DailyRecord, Streak};

/// Streak calculator over an ascending daily history
pub struct StreakCalculator;

impl StreakCalculator {
    /// Compute current and longest streaks from records sorted by `start_date`.
    ///
    /// The current run is the one ending at the last record; a trailing record
    /// that missed the goal makes it zero.
    pub fn compute(history: &[DailyRecord]) -> Streak {
        let mut run_length = 0u32;
        let mut longest = 0u32;
        let mut range_start = None;
        let mut range_end = None;

        for record in history {
            if record.goal_reached {
                if run_length == 0 {
                    range_start = Some(record.start_date);
                }
                run_length += 1;
                range_end = Some(record.start_date);
            } else {
                run_length = 0;
                range_start = None;
                range_end = None;
            }
            longest = longest.max(run_length);
        }

        Streak {
            current: run_length,
            longest,
            range_start,
            range_end,
        }
    }

    /// Read the full history from `store` and compute its streak
    pub fn from_store<S: RecordStore>(store: &S) -> Result<Streak, PedestrianError> {
        let history = store.all().map_err(PedestrianError::store)?;
        Ok(Self::compute(&history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawSample;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    /// Build an ascending history where `true` means the goal was reached
    fn history(flags: &[bool]) -> Vec<DailyRecord> {
        flags
            .iter()
            .enumerate()
            .map(|(i, &reached)| {
                let d = i as u32 + 1;
                let steps = if reached { 10 } else { 0 };
                DailyRecord::from_sample(&RawSample::new(day(d), day(d + 1), steps), 10)
            })
            .collect()
    }

    #[test]
    fn test_empty_history() {
        let streak = StreakCalculator::compute(&[]);
        assert_eq!(streak, Streak::default());
        assert_eq!(streak.range_start, None);
    }

    #[test]
    fn test_all_reached() {
        let streak = StreakCalculator::compute(&history(&[true, true, true]));
        assert_eq!(streak.current, 3);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.range_start, Some(day(1)));
        assert_eq!(streak.range_end, Some(day(3)));
    }

    #[test]
    fn test_trailing_run_after_break() {
        let streak = StreakCalculator::compute(&history(&[true, false, true, true]));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 2);
        assert_eq!(streak.range_start, Some(day(3)));
        assert_eq!(streak.range_end, Some(day(4)));
    }

    #[test]
    fn test_broken_at_end() {
        let streak = StreakCalculator::compute(&history(&[true, true, false]));
        assert_eq!(streak.current, 0);
        assert_eq!(streak.longest, 2);
        assert_eq!(streak.range_start, None);
        assert_eq!(streak.range_end, None);
    }

    #[test]
    fn test_longest_earlier_than_current() {
        let streak = StreakCalculator::compute(&history(&[true, true, true, false, true]));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.range_start, Some(day(5)));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let records = history(&[false, true, true, false, true]);
        assert_eq!(
            StreakCalculator::compute(&records),
            StreakCalculator::compute(&records)
        );
    }
}
