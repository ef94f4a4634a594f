//! Core types, schedule compilation and pickup queries for the muellplan waste calendar.

/// Compilation of raw OCR records into the schedule table.
pub mod compiler;
/// JSON configuration of the extraction and compilation pipeline.
pub mod config;
/// Persistence and loading of compiled datasets.
pub mod dataset;
/// Public holidays excluded from collection.
pub mod holidays;
/// Domain models and identifiers.
pub mod model;
/// Traits describing the collaborators of the query service.
pub mod ports;
/// Next-pickup and future-schedule queries with per-day caching.
pub mod query;
/// CSV storage of raw OCR cell records.
pub mod raw_table;
/// High-level service facade used by clients.
pub mod service;

pub use compiler::{CompileError, RejectedRow, compile, compile_year};
pub use config::{ConfigError, PipelineConfig};
pub use dataset::{DatasetError, JsonScheduleStore};
pub use holidays::HolidayCalendar;
pub use model::*;
pub use ports::*;
pub use query::{NextPickupCache, compute_next_pickups, future_pickups};
pub use service::*;
