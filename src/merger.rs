//! Daily record merging
//!
//! Folds one raw pedometer sample into the daily record for its range. The first
//! merge for a range creates the record; later merges overwrite its totals and
//! goal flag in place, so a live day can be merged repeatedly as steps accrue.

use crate::error::PedestrianError;
use crate::store::RecordStore;
use crate::types::{DailyRecord, RawSample};

/// Find-or-create merger for daily records
pub struct DailyRecordMerger;

impl DailyRecordMerger {
    /// Merge `sample` into `store` using the goal in effect right now.
    ///
    /// The goal is evaluated with `>=` and baked into `goal_reached`, so later
    /// goal changes do not rewrite history. Re-merging with fewer steps can
    /// clear the flag again.
    pub fn merge<S: RecordStore>(
        sample: &RawSample,
        daily_step_goal: u32,
        store: &mut S,
    ) -> Result<DailyRecord, PedestrianError> {
        sample.validate()?;
        if daily_step_goal == 0 {
            return Err(PedestrianError::InvalidGoal(daily_step_goal));
        }

        let existing = store
            .find_by_range(sample.start, sample.end)
            .map_err(PedestrianError::store)?;

        let record = match existing {
            Some(mut record) => {
                record.apply(sample, daily_step_goal);
                tracing::debug!(
                    id = %record.id,
                    start = %record.start_date,
                    steps = record.step_count,
                    goal_reached = record.goal_reached,
                    "Updated daily record"
                );
                record
            }
            None => {
                let record = DailyRecord::from_sample(sample, daily_step_goal);
                tracing::debug!(
                    id = %record.id,
                    start = %record.start_date,
                    steps = record.step_count,
                    goal_reached = record.goal_reached,
                    "Created daily record"
                );
                record
            }
        };

        store.insert(record).map_err(PedestrianError::store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::fmt;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn sample(d: u32, steps: u32) -> RawSample {
        RawSample::new(day(d), day(d + 1), steps)
    }

    #[test]
    fn test_first_merge_creates_record() {
        let mut store = MemoryRecordStore::new();
        let s = sample(1, 12_000).with_distance(9100.0).with_floors(4, 3);

        let record = DailyRecordMerger::merge(&s, 10_000, &mut store).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(record.start_date, day(1));
        assert_eq!(record.end_date, day(2));
        assert_eq!(record.step_count, 12_000);
        assert_eq!(record.distance_meters, 9100.0);
        assert_eq!(record.floors_ascended, 4);
        assert_eq!(record.floors_descended, 3);
        assert!(record.goal_reached);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut store = MemoryRecordStore::new();
        let s = sample(1, 7_000).with_distance(5000.0);

        let first = DailyRecordMerger::merge(&s, 10_000, &mut store).unwrap();
        let second = DailyRecordMerger::merge(&s, 10_000, &mut store).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_goal_boundary_is_inclusive() {
        let mut store = MemoryRecordStore::new();

        let at_goal = DailyRecordMerger::merge(&sample(1, 10_000), 10_000, &mut store).unwrap();
        let below = DailyRecordMerger::merge(&sample(2, 9_999), 10_000, &mut store).unwrap();

        assert!(at_goal.goal_reached);
        assert!(!below.goal_reached);
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = MemoryRecordStore::new();

        let high = DailyRecordMerger::merge(&sample(1, 11_000), 10_000, &mut store).unwrap();
        assert!(high.goal_reached);

        let low = DailyRecordMerger::merge(&sample(1, 4_000), 10_000, &mut store).unwrap();
        assert_eq!(low.id, high.id);
        assert_eq!(low.step_count, 4_000);
        assert!(!low.goal_reached);
    }

    #[test]
    fn test_missing_distance_resets_to_zero() {
        let mut store = MemoryRecordStore::new();
        DailyRecordMerger::merge(&sample(1, 100).with_distance(80.0), 10_000, &mut store).unwrap();

        let record = DailyRecordMerger::merge(&sample(1, 200), 10_000, &mut store).unwrap();
        assert_eq!(record.distance_meters, 0.0);
    }

    #[test]
    fn test_invalid_range_is_rejected_without_writing() {
        let mut store = MemoryRecordStore::new();
        let bad = RawSample::new(day(2), day(1), 100);

        let result = DailyRecordMerger::merge(&bad, 10_000, &mut store);

        assert!(matches!(result, Err(PedestrianError::InvalidRange { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_finite_distance_is_rejected_without_writing() {
        let mut store = MemoryRecordStore::new();
        let bad = sample(1, 100).with_distance(f64::NAN);

        let result = DailyRecordMerger::merge(&bad, 10_000, &mut store);

        assert!(matches!(result, Err(PedestrianError::InvalidSample(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_goal_is_rejected() {
        let mut store = MemoryRecordStore::new();
        let result = DailyRecordMerger::merge(&sample(1, 100), 0, &mut store);
        assert!(matches!(result, Err(PedestrianError::InvalidGoal(0))));
    }

    #[derive(Debug)]
    struct Unavailable;

    impl fmt::Display for Unavailable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "store unavailable")
        }
    }

    impl std::error::Error for Unavailable {}

    struct FailingStore;

    impl RecordStore for FailingStore {
        type Error = Unavailable;

        fn find_by_range(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Option<DailyRecord>, Self::Error> {
            Ok(None)
        }

        fn insert(&mut self, _record: DailyRecord) -> Result<DailyRecord, Self::Error> {
            Err(Unavailable)
        }

        fn all(&self) -> Result<Vec<DailyRecord>, Self::Error> {
            Err(Unavailable)
        }
    }

    #[test]
    fn test_store_errors_propagate() {
        let mut store = FailingStore;
        let err = DailyRecordMerger::merge(&sample(1, 100), 10_000, &mut store).unwrap_err();

        match err {
            PedestrianError::Store(inner) => assert!(inner.downcast_ref::<Unavailable>().is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
