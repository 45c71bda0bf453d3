//! Record store abstraction.
//!
//! Provides a trait-based seam over persistence so the tracker can run against:
//! - JSON documents on disk (the default deployment)
//! - An in-memory store for tests and throwaway runs
//!
//! Form session writes go through [`RecordStore::replace_form_session`], which
//! only succeeds if the stored version still matches what the caller read.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::{Config, StoreBackend};
use crate::tracking::TrackingError;
use crate::types::{FormSession, Lead, VisitorSession};

mod collections;
mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

/// Errors raised by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record '{0}' not found")]
    Missing(String),

    #[error("record '{0}' already exists")]
    Duplicate(String),

    #[error("record '{id}' changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: String, expected: u64, found: u64 },

    #[error("visitor '{0}' started another session concurrently")]
    SessionSuperseded(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Number of records held per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreCounts {
    pub form_sessions: usize,
    pub leads: usize,
    pub visitor_sessions: usize,
}

/// Persistent record store for form sessions, leads and visitor sessions
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new form session; fails with `Duplicate` if the id is taken
    async fn insert_form_session(&self, session: &FormSession) -> Result<(), StoreError>;

    async fn get_form_session(&self, session_id: &str) -> Result<Option<FormSession>, StoreError>;

    /// Replace a form session only if the stored copy is still at `expected_version`
    async fn replace_form_session(
        &self,
        session: &FormSession,
        expected_version: u64,
    ) -> Result<(), StoreError>;

    /// Form sessions created at or after `since`, oldest first
    async fn form_sessions_since(&self, since: DateTime<Utc>)
        -> Result<Vec<FormSession>, StoreError>;

    /// Store a new lead; fails with `Duplicate` if the id is taken
    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError>;

    /// Leads created at or after `since`, oldest first
    async fn leads_since(&self, since: DateTime<Utc>) -> Result<Vec<Lead>, StoreError>;

    /// The visitor's most recently active session, if any
    async fn latest_visitor_session(
        &self,
        visitor_id: &str,
    ) -> Result<Option<VisitorSession>, StoreError>;

    /// Store a new visitor session, provided the visitor's latest session is
    /// still `superseded` (`None` when they had none)
    async fn insert_visitor_session(
        &self,
        session: &VisitorSession,
        superseded: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Replace a visitor session only if the stored copy is still at `expected_version`
    async fn replace_visitor_session(
        &self,
        session: &VisitorSession,
        expected_version: u64,
    ) -> Result<(), StoreError>;

    /// Visitor sessions started at or after `since`, oldest first
    async fn visitor_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VisitorSession>, StoreError>;

    async fn counts(&self) -> Result<StoreCounts, StoreError>;
}

/// Open the store selected by `store.backend`
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::File => {
            let store = JsonFileStore::open(config.data_path()).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Run one store call under `timeout`, translating failures for the caller.
///
/// An expired timeout reads as the store being unavailable. Nothing is retried.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, TrackingError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(TrackingError::from),
        Err(_) => Err(TrackingError::StoreUnavailable(format!(
            "store call timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
