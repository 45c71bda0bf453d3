//! In-memory record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::collections::Collections;
use super::{RecordStore, StoreCounts, StoreError};
use crate::types::{FormSession, Lead, VisitorSession};

/// Process-local store; every record is dropped with the process
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert_form_session(&self, session: &FormSession) -> Result<(), StoreError> {
        self.inner.write().await.insert_form_session(session)
    }

    async fn get_form_session(&self, session_id: &str) -> Result<Option<FormSession>, StoreError> {
        Ok(self.inner.read().await.form_sessions.get(session_id).cloned())
    }

    async fn replace_form_session(
        &self,
        session: &FormSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .replace_form_session(session, expected_version)
    }

    async fn form_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<FormSession>, StoreError> {
        Ok(self.inner.read().await.form_sessions_since(since))
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        self.inner.write().await.insert_lead(lead)
    }

    async fn leads_since(&self, since: DateTime<Utc>) -> Result<Vec<Lead>, StoreError> {
        Ok(self.inner.read().await.leads_since(since))
    }

    async fn latest_visitor_session(
        &self,
        visitor_id: &str,
    ) -> Result<Option<VisitorSession>, StoreError> {
        Ok(self.inner.read().await.latest_visitor_session(visitor_id))
    }

    async fn insert_visitor_session(
        &self,
        session: &VisitorSession,
        superseded: Option<&str>,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .insert_visitor_session(session, superseded)
    }

    async fn replace_visitor_session(
        &self,
        session: &VisitorSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .replace_visitor_session(session, expected_version)
    }

    async fn visitor_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VisitorSession>, StoreError> {
        Ok(self.inner.read().await.visitor_sessions_since(since))
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        Ok(self.inner.read().await.counts())
    }
}
