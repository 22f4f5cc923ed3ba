//! One tracking pass: fetch each product page, report it, compare it with the
//! last-known state, alert on changes and persist the new state.
//!
//! - [`tracker::Tracker`]: the per-run orchestrator
//! - [`history::History`]: URL → last observation, stored as JSON
//! - [`compare`]: price-drop and stock-change detection
//! - [`report`]: console lines
//!
//! The pass is sequential. A product that cannot be fetched or parsed is
//! reported and skipped; it neither stops the run nor enters history.
pub mod compare;
pub mod history;
pub mod report;
pub mod tracker;

pub use compare::{ChangeEvent, alert_message};
pub use history::{History, HistoryError};
pub use tracker::{PageFetcher, ProductError, RunSummary, Tracker, TrackerError, check, observe};
