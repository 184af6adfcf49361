#![forbid(unsafe_code)]

//! Core domain model and business logic for the ultraplan training assistant.
//!
//! This crate provides:
//! - Domain types (phases, week configs, sessions, history entries)
//! - The built-in periodized plan and plan validation
//! - Duration parsing, sport classification and cross-discipline conversion
//! - The suggestion engine and week plan builder
//! - History persistence, CSV import and Runalyze sync

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod plan;
pub mod duration;
pub mod classify;
pub mod convert;
pub mod engine;
pub mod history;
pub mod import;
pub mod activity;
pub mod sync;
pub mod volume;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use plan::Plan;
pub use duration::parse_duration_min;
pub use classify::classify_sport;
pub use convert::convert_duration;
pub use engine::{full_week_plan, generate_suggestion};
pub use history::{aggregate_for_date, merge_entries, HistoryStore, MergeOutcome};
pub use import::parse_training_csv;
pub use activity::{ActivitySource, CsvFileSource, RunalyzeSource};
pub use sync::{sync_from, SyncReport};
pub use volume::{weekly_volume, WeekVolume};
