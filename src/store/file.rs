//! JSON-file record store.
//!
//! Layout under the data directory:
//! - `form_sessions.json`
//! - `leads.json`
//! - `visitor_sessions.json`
//!
//! Each file holds one collection as a JSON array. All collections are loaded
//! at open; every write stages the change on a copy, replaces the affected
//! file (temp file + rename) and only then commits the copy in memory, so a
//! failed write leaves both disk and memory at the previous state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use super::collections::Collections;
use super::{RecordStore, StoreCounts, StoreError};
use crate::types::{FormSession, Lead, VisitorSession};

const FORM_SESSIONS_FILE: &str = "form_sessions.json";
const LEADS_FILE: &str = "leads.json";
const VISITOR_SESSIONS_FILE: &str = "visitor_sessions.json";

#[derive(Debug, Clone, Copy)]
enum Collection {
    FormSessions,
    Leads,
    VisitorSessions,
}

impl Collection {
    fn file_name(self) -> &'static str {
        match self {
            Collection::FormSessions => FORM_SESSIONS_FILE,
            Collection::Leads => LEADS_FILE,
            Collection::VisitorSessions => VISITOR_SESSIONS_FILE,
        }
    }
}

/// Store that keeps each collection in a JSON file under `data_dir`
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    inner: Mutex<Collections>,
}

impl JsonFileStore {
    /// Open (or create) a store rooted at `data_dir`
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;

        let form_sessions: Vec<FormSession> =
            read_collection(&data_dir.join(FORM_SESSIONS_FILE)).await?;
        let leads: Vec<Lead> = read_collection(&data_dir.join(LEADS_FILE)).await?;
        let visitor_sessions: Vec<VisitorSession> =
            read_collection(&data_dir.join(VISITOR_SESSIONS_FILE)).await?;

        tracing::info!(
            data_dir = %data_dir.display(),
            form_sessions = form_sessions.len(),
            leads = leads.len(),
            visitor_sessions = visitor_sessions.len(),
            "Opened JSON file store"
        );

        let collections = Collections {
            form_sessions: form_sessions
                .into_iter()
                .map(|s| (s.session_id.clone(), s))
                .collect(),
            leads: leads.into_iter().map(|l| (l.id.clone(), l)).collect(),
            visitor_sessions: visitor_sessions
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
        };

        Ok(Self {
            data_dir,
            inner: Mutex::new(collections),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Apply `change` to a staged copy, persist the touched collection, then commit
    async fn mutate<F>(&self, collection: Collection, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Collections) -> Result<(), StoreError>,
    {
        let mut guard = self.inner.lock().await;
        let mut staged = guard.clone();
        change(&mut staged)?;
        self.persist(&staged, collection).await?;
        *guard = staged;
        Ok(())
    }

    async fn persist(&self, collections: &Collections, collection: Collection) -> Result<(), StoreError> {
        let path = self.data_dir.join(collection.file_name());
        match collection {
            Collection::FormSessions => {
                let mut records: Vec<&FormSession> = collections.form_sessions.values().collect();
                records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
                write_collection(&path, &records).await
            }
            Collection::Leads => {
                let mut records: Vec<&Lead> = collections.leads.values().collect();
                records.sort_by(|a, b| a.id.cmp(&b.id));
                write_collection(&path, &records).await
            }
            Collection::VisitorSessions => {
                let mut records: Vec<&VisitorSession> =
                    collections.visitor_sessions.values().collect();
                records.sort_by(|a, b| a.id.cmp(&b.id));
                write_collection(&path, &records).await
            }
        }
    }
}

async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(records)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert_form_session(&self, session: &FormSession) -> Result<(), StoreError> {
        self.mutate(Collection::FormSessions, |c| c.insert_form_session(session))
            .await
    }

    async fn get_form_session(&self, session_id: &str) -> Result<Option<FormSession>, StoreError> {
        Ok(self.inner.lock().await.form_sessions.get(session_id).cloned())
    }

    async fn replace_form_session(
        &self,
        session: &FormSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.mutate(Collection::FormSessions, |c| {
            c.replace_form_session(session, expected_version)
        })
        .await
    }

    async fn form_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<FormSession>, StoreError> {
        Ok(self.inner.lock().await.form_sessions_since(since))
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        self.mutate(Collection::Leads, |c| c.insert_lead(lead)).await
    }

    async fn leads_since(&self, since: DateTime<Utc>) -> Result<Vec<Lead>, StoreError> {
        Ok(self.inner.lock().await.leads_since(since))
    }

    async fn latest_visitor_session(
        &self,
        visitor_id: &str,
    ) -> Result<Option<VisitorSession>, StoreError> {
        Ok(self.inner.lock().await.latest_visitor_session(visitor_id))
    }

    async fn insert_visitor_session(
        &self,
        session: &VisitorSession,
        superseded: Option<&str>,
    ) -> Result<(), StoreError> {
        self.mutate(Collection::VisitorSessions, |c| {
            c.insert_visitor_session(session, superseded)
        })
        .await
    }

    async fn replace_visitor_session(
        &self,
        session: &VisitorSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.mutate(Collection::VisitorSessions, |c| {
            c.replace_visitor_session(session, expected_version)
        })
        .await
    }

    async fn visitor_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VisitorSession>, StoreError> {
        Ok(self.inner.lock().await.visitor_sessions_since(since))
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        Ok(self.inner.lock().await.counts())
    }
}
