//! Daily record storage
//!
//! The engine never owns persistence. Callers hand it a [`RecordStore`] and the
//! engine reads and writes records through that handle. [`MemoryRecordStore`]
//! is the in-process implementation used by the processor, the CLI and tests.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::error::PedestrianError;
use crate::types::DailyRecord;

/// Collection of daily records keyed by exact `(start_date, end_date)` range
pub trait RecordStore {
    /// Error raised by the backing storage
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up the record whose range equals `(start, end)` exactly
    fn find_by_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<DailyRecord>, Self::Error>;

    /// Store a record, replacing any record with the same range
    fn insert(&mut self, record: DailyRecord) -> Result<DailyRecord, Self::Error>;

    /// All records, ascending by `start_date`
    fn all(&self) -> Result<Vec<DailyRecord>, Self::Error>;
}

type RangeKey = (DateTime<Utc>, DateTime<Utc>);

/// In-memory record store backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: BTreeMap<RangeKey, DailyRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Load a store from a JSON array of records
    pub fn from_json(json: &str) -> Result<Self, PedestrianError> {
        let records: Vec<DailyRecord> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for record in records {
            let key = record.range();
            if store.records.insert(key, record).is_some() {
                return Err(PedestrianError::ParseError(format!(
                    "Duplicate record for range {} - {}",
                    key.0.to_rfc3339(),
                    key.1.to_rfc3339()
                )));
            }
        }
        Ok(store)
    }

    /// Serialize the store to a JSON array ordered by start date
    pub fn to_json(&self) -> Result<String, PedestrianError> {
        let records: Vec<&DailyRecord> = self.records.values().collect();
        serde_json::to_string(&records).map_err(|e| PedestrianError::EncodingError(e.to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    type Error = Infallible;

    fn find_by_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<DailyRecord>, Self::Error> {
        Ok(self.records.get(&(start, end)).cloned())
    }

    fn insert(&mut self, record: DailyRecord) -> Result<DailyRecord, Self::Error> {
        self.records.insert(record.range(), record.clone());
        Ok(record)
    }

    fn all(&self) -> Result<Vec<DailyRecord>, Self::Error> {
        Ok(self.records.values().cloned().collect())
    }
}
