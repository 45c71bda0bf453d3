//! leadtrack - valuation form tracking, lead intake and conversion analytics
//!
//! The binary serves the REST API and prints reports; everything it uses is
//! exported here so integration tests can drive the same router.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod leads;
pub mod logging;
pub mod rest;
pub mod store;
pub mod tracking;
pub mod types;
pub mod visitors;
