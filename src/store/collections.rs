//! Record collections shared by the memory and file stores.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{StoreCounts, StoreError};
use crate::types::{FormSession, Lead, VisitorSession};

#[derive(Debug, Clone, Default)]
pub(super) struct Collections {
    pub form_sessions: HashMap<String, FormSession>,
    pub leads: HashMap<String, Lead>,
    pub visitor_sessions: HashMap<String, VisitorSession>,
}

impl Collections {
    pub fn insert_form_session(&mut self, session: &FormSession) -> Result<(), StoreError> {
        if self.form_sessions.contains_key(&session.session_id) {
            return Err(StoreError::Duplicate(session.session_id.clone()));
        }
        self.form_sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    pub fn replace_form_session(
        &mut self,
        session: &FormSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let stored = self
            .form_sessions
            .get_mut(&session.session_id)
            .ok_or_else(|| StoreError::Missing(session.session_id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: session.session_id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        *stored = session.clone();
        Ok(())
    }

    pub fn form_sessions_since(&self, since: DateTime<Utc>) -> Vec<FormSession> {
        let mut sessions: Vec<FormSession> = self
            .form_sessions
            .values()
            .filter(|s| s.created_at >= since)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    pub fn insert_lead(&mut self, lead: &Lead) -> Result<(), StoreError> {
        if self.leads.contains_key(&lead.id) {
            return Err(StoreError::Duplicate(lead.id.clone()));
        }
        self.leads.insert(lead.id.clone(), lead.clone());
        Ok(())
    }

    pub fn leads_since(&self, since: DateTime<Utc>) -> Vec<Lead> {
        let mut leads: Vec<Lead> = self
            .leads
            .values()
            .filter(|l| l.created_at >= since)
            .cloned()
            .collect();
        leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        leads
    }

    pub fn latest_visitor_session(&self, visitor_id: &str) -> Option<VisitorSession> {
        self.visitor_sessions
            .values()
            .filter(|s| s.visitor_id == visitor_id)
            .max_by(|a, b| {
                a.last_seen_at
                    .cmp(&b.last_seen_at)
                    .then_with(|| a.started_at.cmp(&b.started_at))
            })
            .cloned()
    }

    pub fn insert_visitor_session(
        &mut self,
        session: &VisitorSession,
        superseded: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.visitor_sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(session.id.clone()));
        }

        let latest = self
            .latest_visitor_session(&session.visitor_id)
            .map(|s| s.id);
        if latest.as_deref() != superseded {
            return Err(StoreError::SessionSuperseded(session.visitor_id.clone()));
        }

        self.visitor_sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    pub fn replace_visitor_session(
        &mut self,
        session: &VisitorSession,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let stored = self
            .visitor_sessions
            .get_mut(&session.id)
            .ok_or_else(|| StoreError::Missing(session.id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: session.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        *stored = session.clone();
        Ok(())
    }

    pub fn visitor_sessions_since(&self, since: DateTime<Utc>) -> Vec<VisitorSession> {
        let mut sessions: Vec<VisitorSession> = self
            .visitor_sessions
            .values()
            .filter(|s| s.started_at >= since)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            form_sessions: self.form_sessions.len(),
            leads: self.leads.len(),
            visitor_sessions: self.visitor_sessions.len(),
        }
    }
}
