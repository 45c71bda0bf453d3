//! Visitor page-view tracking.
//!
//! Page views are grouped into visitor sessions: a view joins the visitor's
//! latest session unless that session has been idle longer than
//! `tracking.visitor_idle_minutes`, in which case a new session starts with
//! the attribution carried by the view.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{window_start, Clock};
use crate::config::Config;
use crate::store::{bounded, RecordStore};
use crate::tracking::{is_valid_record_id, new_record_id, TrackingError};
use crate::types::{PageViewInput, VisitorSession};

/// Longest page path worth recording
const MAX_PATH_LEN: usize = 512;

pub struct VisitorTracker {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    idle_gap: chrono::Duration,
    store_timeout: Duration,
}

impl VisitorTracker {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            idle_gap: config.visitor_idle_gap(),
            store_timeout: config.store_timeout(),
        }
    }

    pub async fn record_page_view(
        &self,
        visitor_id: &str,
        input: PageViewInput,
    ) -> Result<VisitorSession, TrackingError> {
        if !is_valid_record_id(visitor_id) {
            return Err(TrackingError::Validation(format!(
                "'{}' is not a valid visitor id",
                visitor_id
            )));
        }
        let path = input.path.trim().to_string();
        if !path.starts_with('/') || path.len() > MAX_PATH_LEN {
            return Err(TrackingError::Validation(format!(
                "'{}' is not a site path",
                path
            )));
        }

        let now = self.clock.now();
        let latest = bounded(
            self.store_timeout,
            self.store.latest_visitor_session(visitor_id),
        )
        .await?;

        match latest {
            Some(mut session) if session.is_active(now, self.idle_gap) => {
                let read_version = session.version;
                session.record_view(path, now);
                bounded(
                    self.store_timeout,
                    self.store.replace_visitor_session(&session, read_version),
                )
                .await?;
                Ok(session)
            }
            latest => {
                let superseded = latest.map(|s| s.id);
                let mut session = VisitorSession::start(
                    new_record_id(),
                    visitor_id.to_string(),
                    input.attribution.normalized(),
                    now,
                );
                session.record_view(path, now);
                bounded(
                    self.store_timeout,
                    self.store
                        .insert_visitor_session(&session, superseded.as_deref()),
                )
                .await?;

                tracing::debug!(
                    visitor_id = %visitor_id,
                    visitor_session = %session.id,
                    "Visitor session started"
                );
                Ok(session)
            }
        }
    }

    /// Visitor sessions started within the last `window_days` days
    pub async fn list_sessions(&self, window_days: u32) -> Result<Vec<VisitorSession>, TrackingError> {
        let since = window_start(self.clock.now(), window_days);
        bounded(self.store_timeout, self.store.visitor_sessions_since(since)).await
    }
}
