//! Multi-step form session tracking.
//!
//! The valuation form wizard reports every step transition here. The tracker
//! keeps the per-session step log, recomputes the rollups on each write and
//! closes the session when the form is submitted.

mod error;
mod tracker;

pub use error::TrackingError;
pub use tracker::{
    is_valid_record_id, new_record_id, validate_window_days, FormTracker, MAX_WINDOW_DAYS,
};
