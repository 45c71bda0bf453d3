use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::clock::{window_start, Clock};
use crate::config::Config;
use crate::store::{bounded, RecordStore};
use crate::types::{Attribution, FormSession, StepEventInput};

use super::TrackingError;

/// Longest identifier accepted from a client
const MAX_ID_LEN: usize = 64;

/// Fresh unguessable identifier: a v4 UUID in its 32-char hex form
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifiers are URL-safe tokens: ASCII letters, digits, `-` and `_`
pub fn is_valid_record_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Longest listing or analytics window a caller may ask for
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Reject empty or absurd windows; `None` means "use the configured default"
pub fn validate_window_days(days: Option<u32>) -> Result<Option<u32>, TrackingError> {
    match days {
        Some(0) => Err(TrackingError::Validation(
            "days must be at least 1".to_string(),
        )),
        Some(days) if days > MAX_WINDOW_DAYS => Err(TrackingError::Validation(format!(
            "days must be at most {}",
            MAX_WINDOW_DAYS
        ))),
        days => Ok(days),
    }
}

/// Session lifecycle operations over a [`RecordStore`]
pub struct FormTracker {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    initial_step: u32,
    store_timeout: Duration,
}

impl FormTracker {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            initial_step: config.tracking.initial_step,
            store_timeout: config.store_timeout(),
        }
    }

    /// Open a session carrying `attribution` and return its id
    pub async fn create_session(&self, attribution: Attribution) -> Result<String, TrackingError> {
        let session_id = new_record_id();
        let session = FormSession::open(
            session_id.clone(),
            attribution.normalized(),
            self.initial_step,
            self.clock.now(),
        );

        bounded(self.store_timeout, self.store.insert_form_session(&session)).await?;

        tracing::info!(
            session_id = %session_id,
            source = session.attribution.source_label(),
            "Form session created"
        );
        Ok(session_id)
    }

    /// Append a step event and persist the refreshed session.
    ///
    /// The write is a compare-and-swap on the version that was read; if another
    /// update landed in between this fails with `Conflict` instead of dropping it.
    pub async fn update_session(
        &self,
        session_id: &str,
        input: StepEventInput,
    ) -> Result<FormSession, TrackingError> {
        let mut session = self.load(session_id).await?;
        let read_version = session.version;
        let step = input.step;

        session.record_step(input, self.clock.now());
        bounded(
            self.store_timeout,
            self.store.replace_form_session(&session, read_version),
        )
        .await?;

        tracing::debug!(
            session_id = %session_id,
            step,
            steps_completed = session.steps_completed,
            max_step_reached = session.max_step_reached,
            "Form step recorded"
        );
        Ok(session)
    }

    /// Mark the session completed, linking `lead_id` when the form produced a lead
    pub async fn complete_session(
        &self,
        session_id: &str,
        lead_id: Option<String>,
    ) -> Result<FormSession, TrackingError> {
        let mut session = self.load(session_id).await?;
        let read_version = session.version;

        if session.completed && session.lead_id.is_some() && session.lead_id != lead_id {
            tracing::warn!(
                session_id = %session_id,
                previous = ?session.lead_id,
                next = ?lead_id,
                "Completed form session relinked to a different lead"
            );
        }

        session.complete(lead_id, self.clock.now());
        bounded(
            self.store_timeout,
            self.store.replace_form_session(&session, read_version),
        )
        .await?;

        tracing::info!(
            session_id = %session_id,
            converted = session.converted_to_lead,
            steps_completed = session.steps_completed,
            "Form session completed"
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<FormSession, TrackingError> {
        self.load(session_id).await
    }

    /// Sessions created within the last `window_days` days, oldest first
    pub async fn list_sessions(&self, window_days: u32) -> Result<Vec<FormSession>, TrackingError> {
        let since = window_start(self.clock.now(), window_days);
        bounded(self.store_timeout, self.store.form_sessions_since(since)).await
    }

    async fn load(&self, session_id: &str) -> Result<FormSession, TrackingError> {
        if !is_valid_record_id(session_id) {
            return Err(TrackingError::Validation(format!(
                "'{}' is not a valid session id",
                session_id
            )));
        }

        bounded(self.store_timeout, self.store.get_form_session(session_id))
            .await?
            .ok_or_else(|| TrackingError::NotFound(format!("Session '{}' not found", session_id)))
    }
}
