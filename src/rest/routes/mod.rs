//! Route handlers for the REST API.

pub mod analytics;
pub mod form_sessions;
pub mod health;
pub mod leads;
pub mod visitors;
