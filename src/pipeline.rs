//! Pipeline orchestration
//!
//! This module provides the public API for the engine. A host fetches a batch of
//! raw samples from the motion source, hands them to [`StepProcessor::ingest`],
//! then asks for the refreshed streak and summary.

use crate::error::PedestrianError;
use crate::merger::DailyRecordMerger;
use crate::settings::SettingsProvider;
use crate::store::{MemoryRecordStore, RecordStore};
use crate::streak::StreakCalculator;
use crate::summary::{summarize_records, ActivitySummary};
use crate::types::{DailyRecord, RawSample, Streak};

/// Parse a JSON array of raw samples
pub fn parse_samples_array(json: &str) -> Result<Vec<RawSample>, PedestrianError> {
    let samples: Vec<RawSample> = serde_json::from_str(json)?;
    Ok(samples)
}

/// Parse NDJSON (one raw sample per line)
pub fn parse_samples_ndjson(ndjson: &str) -> Result<Vec<RawSample>, PedestrianError> {
    let mut samples = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawSample>(trimmed) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                return Err(PedestrianError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(samples)
}

/// Merge a JSON array of samples into a fresh history and return its streak as JSON.
///
/// # Example
/// ```ignore
/// let streak_json = samples_to_streak(week_json, 10_000)?;
/// ```
pub fn samples_to_streak(samples_json: &str, daily_step_goal: u32) -> Result<String, PedestrianError> {
    let samples = parse_samples_array(samples_json)?;

    let mut processor = StepProcessor::new();
    processor.ingest(&samples, &daily_step_goal)?;

    let streak = processor.streak()?;
    serde_json::to_string(&streak).map_err(|e| PedestrianError::EncodingError(e.to_string()))
}

/// Stateful processor holding an injected record store.
pub struct StepProcessor<S: RecordStore = MemoryRecordStore> {
    store: S,
}

impl Default for StepProcessor<MemoryRecordStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl StepProcessor<MemoryRecordStore> {
    /// Create a processor with an empty in-memory store
    pub fn new() -> Self {
        Self {
            store: MemoryRecordStore::new(),
        }
    }

    /// Replace the history with a JSON snapshot
    pub fn load_records(&mut self, json: &str) -> Result<(), PedestrianError> {
        self.store = MemoryRecordStore::from_json(json)?;
        Ok(())
    }

    /// Snapshot the history to JSON
    pub fn save_records(&self) -> Result<String, PedestrianError> {
        self.store.to_json()
    }
}

impl<S: RecordStore> StepProcessor<S> {
    /// Create a processor over an existing store
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Merge a batch of samples in order.
    ///
    /// Every sample is validated before any is merged, so an invalid range or
    /// distance leaves the store untouched. The goal is read from `settings` once per
    /// sample.
    pub fn ingest(
        &mut self,
        samples: &[RawSample],
        settings: &impl SettingsProvider,
    ) -> Result<Vec<DailyRecord>, PedestrianError> {
        for sample in samples {
            sample.validate()?;
        }

        let mut merged = Vec::with_capacity(samples.len());
        for sample in samples {
            let goal = settings.daily_step_goal();
            merged.push(DailyRecordMerger::merge(sample, goal, &mut self.store)?);
        }

        tracing::info!(
            samples = samples.len(),
            goal_days = merged.iter().filter(|r| r.goal_reached).count(),
            "Ingested pedometer samples"
        );

        Ok(merged)
    }

    /// Streak over the full stored history
    pub fn streak(&self) -> Result<Streak, PedestrianError> {
        StreakCalculator::from_store(&self.store)
    }

    /// Totals over the full stored history
    pub fn summary(&self) -> Result<ActivitySummary, PedestrianError> {
        Ok(summarize_records(&self.records()?))
    }

    /// Stored records ascending by start date
    pub fn records(&self) -> Result<Vec<DailyRecord>, PedestrianError> {
        self.store.all().map_err(PedestrianError::store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
