//! Activity summaries
//!
//! Totals and averages over raw samples or stored daily records, as shown on
//! the weekly metrics view. Missing distance and floor readings count as zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DailyRecord, DistanceUnit, RawSample};

/// Aggregated totals over a set of days
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Number of samples or records folded in
    pub days: u32,
    pub total_steps: u64,
    pub total_distance_meters: f64,
    pub total_floors_ascended: u64,
    pub total_floors_descended: u64,
    /// Days whose goal was reached (always 0 for raw samples)
    pub goal_days: u32,
}

impl ActivitySummary {
    /// Mean steps per day
    pub fn average_steps(&self) -> Option<f64> {
        if self.days == 0 {
            return None;
        }
        Some(self.total_steps as f64 / self.days as f64)
    }

    /// Mean distance per day (meters)
    pub fn average_distance_meters(&self) -> Option<f64> {
        if self.days == 0 {
            return None;
        }
        Some(self.total_distance_meters / self.days as f64)
    }

    /// Total distance converted to `unit`
    pub fn distance_in(&self, unit: DistanceUnit) -> f64 {
        unit.convert_meters(self.total_distance_meters)
    }
}

/// Sum raw samples
pub fn summarize_samples(samples: &[RawSample]) -> ActivitySummary {
    samples
        .iter()
        .fold(ActivitySummary::default(), |mut acc, sample| {
            acc.days += 1;
            acc.total_steps += u64::from(sample.step_count);
            acc.total_distance_meters += sample.distance_meters.unwrap_or(0.0);
            acc.total_floors_ascended += u64::from(sample.floors_ascended.unwrap_or(0));
            acc.total_floors_descended += u64::from(sample.floors_descended.unwrap_or(0));
            acc
        })
}

/// Sum stored daily records
pub fn summarize_records(records: &[DailyRecord]) -> ActivitySummary {
    fold_records(records.iter())
}

/// Sum records whose `start_date` falls in `[from, to)`
pub fn summarize_between(
    records: &[DailyRecord],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> ActivitySummary {
    fold_records(
        records
            .iter()
            .filter(|r| r.start_date >= from && r.start_date < to),
    )
}

fn fold_records<'a>(records: impl Iterator<Item = &'a DailyRecord>) -> ActivitySummary {
    records.fold(ActivitySummary::default(), |mut acc, record| {
        acc.days += 1;
        acc.total_steps += u64::from(record.step_count);
        acc.total_distance_meters += record.distance_meters;
        acc.total_floors_ascended += u64::from(record.floors_ascended);
        acc.total_floors_descended += u64::from(record.floors_descended);
        if record.goal_reached {
            acc.goal_days += 1;
        }
        acc
    })
}
