//! Error types for the Pedestrian engine

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while merging, scanning or loading step history
#[derive(Debug, Error)]
pub enum PedestrianError {
    #[error("Invalid sample range: end {end} is not after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid daily step goal: {0} (must be greater than zero)")]
    InvalidGoal(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Record store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PedestrianError {
    /// Wrap an error raised by a [`crate::store::RecordStore`] implementation
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PedestrianError::Store(Box::new(err))
    }
}
