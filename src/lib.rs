//! Pedestrian - on-device step history engine
//!
//! Pedestrian turns raw pedometer samples into persisted daily records and
//! derives goal-completion streaks and activity summaries from that history:
//! sample validation → find-or-create merge → ordered history scan.
//!
//! Storage is injected through [`RecordStore`]; the engine holds no global state.

pub mod calendar;
pub mod error;
pub mod merger;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod streak;
pub mod summary;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::PedestrianError;
pub use merger::DailyRecordMerger;
pub use pipeline::{samples_to_streak, StepProcessor};
pub use settings::{Settings, SettingsProvider};
pub use store::{MemoryRecordStore, RecordStore};
pub use streak::StreakCalculator;
pub use summary::ActivitySummary;
pub use types::{DailyRecord, DistanceUnit, RawSample, Streak};

/// Engine version
pub const PEDESTRIAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "pedestrian-core";
