//! # vectorscout-core
//!
//! Core library for vectorscout - a robotics competition match scouting kit.
//!
//! This library provides:
//! - Domain types for match and pit scouting records
//! - Zone resolution on field diagrams
//! - The phase-scoped action registry and per-match action log
//! - The compact transfer-code payload codec
//! - Match and pit session controllers
//! - Database storage layer with SQLite
//! - Match schedules from The Blue Alliance with a local cache
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use vectorscout_core::{Config, Database, MatchSession};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! // Scout a match
//! let mut session = MatchSession::from_config(&config).expect("failed to load diagrams");
//! session.set_event("Kettering", "2026miket");
//! ```

// Re-export commonly used items at the crate root
pub use actions::{ActionLog, ActionRecord, ActionType, QualitativeData, QualitativeKind};
pub use codec::{decode, encode_match, encode_pit, Decoded, Payload};
pub use config::Config;
pub use db::{Database, RecordStore};
pub use error::{Error, Result};
pub use geometry::{DiagramKind, DiagramSet, FieldView, MirrorMode, Point};
pub use schedule::{EventCatalog, EventSchedule, MatchScheduleEntry, ScheduleCache, TbaClient};
pub use session::{CancelPolicy, MatchSession, PitSession, SubmitError};
pub use types::*;

// Public modules
pub mod actions;
pub mod autopath;
pub mod clock;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod geometry;
pub mod logging;
pub mod schedule;
pub mod session;
pub mod types;
