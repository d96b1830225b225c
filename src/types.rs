//! Core types for the Pedestrian engine
//!
//! This module defines the data that flows through the engine: raw pedometer
//! samples coming from the motion source, persisted daily records, and the
//! derived streak handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PedestrianError;

const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Unprocessed pedometer reading for a bounded interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Interval start (inclusive)
    pub start: DateTime<Utc>,
    /// Interval end (exclusive)
    pub end: DateTime<Utc>,
    /// Number of steps taken in the interval
    pub step_count: u32,
    /// Estimated distance (meters), absent when the sensor has no estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    /// Floors ascended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors_ascended: Option<u32>,
    /// Floors descended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors_descended: Option<u32>,
}

impl RawSample {
    /// Create a sample with only a step count
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step_count: u32) -> Self {
        Self {
            start,
            end,
            step_count,
            distance_meters: None,
            floors_ascended: None,
            floors_descended: None,
        }
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance_meters = Some(meters);
        self
    }

    pub fn with_floors(mut self, ascended: u32, descended: u32) -> Self {
        self.floors_ascended = Some(ascended);
        self.floors_descended = Some(descended);
        self
    }

    /// Reject samples whose interval is empty or inverted, or whose distance
    /// is negative or not finite
    pub fn validate(&self) -> Result<(), PedestrianError> {
        if self.end <= self.start {
            return Err(PedestrianError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if let Some(meters) = self.distance_meters {
            if !meters.is_finite() || meters < 0.0 {
                return Err(PedestrianError::InvalidSample(format!(
                    "distance_meters must be a finite value >= 0, got {}",
                    meters
                )));
            }
        }
        Ok(())
    }
}

/// Persisted aggregate for one day range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Identifier assigned at creation, stable for the record's lifetime
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub step_count: u32,
    pub distance_meters: f64,
    #[serde(default)]
    pub floors_ascended: u32,
    #[serde(default)]
    pub floors_descended: u32,
    /// Whether the step goal in effect at the last merge was met
    pub goal_reached: bool,
}

impl DailyRecord {
    /// Build a fresh record from a sample, allocating a new id
    pub fn from_sample(sample: &RawSample, daily_step_goal: u32) -> Self {
        let mut record = Self {
            id: Uuid::new_v4(),
            start_date: sample.start,
            end_date: sample.end,
            step_count: 0,
            distance_meters: 0.0,
            floors_ascended: 0,
            floors_descended: 0,
            goal_reached: false,
        };
        record.apply(sample, daily_step_goal);
        record
    }

    /// Overwrite the totals with the sample's values (last write wins)
    pub fn apply(&mut self, sample: &RawSample, daily_step_goal: u32) {
        self.step_count = sample.step_count;
        self.distance_meters = sample.distance_meters.unwrap_or(0.0);
        self.floors_ascended = sample.floors_ascended.unwrap_or(0);
        self.floors_descended = sample.floors_descended.unwrap_or(0);
        self.goal_reached = sample.step_count >= daily_step_goal;
    }

    /// Range key used by record stores
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_date, self.end_date)
    }
}

/// Goal-completion streak derived from an ordered history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Length of the run ending at the most recent record
    pub current: u32,
    /// Longest run anywhere in the history
    pub longest: u32,
    /// First goal-reached day of the current run. None when `current` is 0,
    /// including an empty history; a missed day clears the range rather than
    /// pointing at the day that broke the run.
    pub range_start: Option<DateTime<Utc>>,
    /// Last day of the current run (None when there is no current run)
    pub range_end: Option<DateTime<Utc>>,
}

/// Unit used when reporting distances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "miles",
            DistanceUnit::Kilometers => "kilometers",
        }
    }

    /// Abbreviated label for display
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }

    /// Convert a distance in meters to this unit
    pub fn convert_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Miles => meters / METERS_PER_MILE,
            DistanceUnit::Kilometers => meters / METERS_PER_KILOMETER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_rejects_inverted_and_empty_ranges() {
        assert!(RawSample::new(day(1), day(2), 10).validate().is_ok());

        let empty = RawSample::new(day(2), day(2), 10);
        assert!(matches!(
            empty.validate(),
            Err(PedestrianError::InvalidRange { .. })
        ));

        let inverted = RawSample::new(day(3), day(2), 10);
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_distance() {
        let ok = RawSample::new(day(1), day(2), 10).with_distance(0.0);
        assert!(ok.validate().is_ok());

        for meters in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -50.0] {
            let sample = RawSample::new(day(1), day(2), 10).with_distance(meters);
            assert!(
                matches!(sample.validate(), Err(PedestrianError::InvalidSample(_))),
                "distance {} should be rejected",
                meters
            );
        }
    }

    #[test]
    fn test_from_sample_defaults_missing_fields() {
        let record = DailyRecord::from_sample(&RawSample::new(day(1), day(2), 500), 1000);

        assert_eq!(record.distance_meters, 0.0);
        assert_eq!(record.floors_ascended, 0);
        assert_eq!(record.floors_descended, 0);
        assert!(!record.goal_reached);
        assert_eq!(record.range(), (day(1), day(2)));
    }

    #[test]
    fn test_sample_json_shape() {
        let json = r#"{
            "start": "2024-01-15T00:00:00Z",
            "end": "2024-01-16T00:00:00Z",
            "step_count": 8500,
            "distance_meters": 6200.5
        }"#;

        let sample: RawSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.step_count, 8500);
        assert_eq!(sample.distance_meters, Some(6200.5));
        assert_eq!(sample.floors_ascended, None);
    }

    #[test]
    fn test_distance_unit_conversion() {
        assert!((DistanceUnit::Kilometers.convert_meters(5000.0) - 5.0).abs() < 1e-9);
        assert!((DistanceUnit::Miles.convert_meters(1609.344) - 1.0).abs() < 1e-9);
        assert_eq!(DistanceUnit::default(), DistanceUnit::Miles);
        assert_eq!(
            serde_json::to_string(&DistanceUnit::Kilometers).unwrap(),
            "\"kilometers\""
        );
    }
}
