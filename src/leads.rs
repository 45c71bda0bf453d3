//! Lead intake.
//!
//! A lead is written once. When the submission names the form session it came
//! from, that session is completed and linked to the new lead.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{window_start, Clock};
use crate::config::Config;
use crate::store::{bounded, RecordStore};
use crate::tracking::{new_record_id, FormTracker, TrackingError};
use crate::types::{Lead, LeadInput};

pub struct LeadIntake {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    tracker: Arc<FormTracker>,
    store_timeout: Duration,
}

impl LeadIntake {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        tracker: Arc<FormTracker>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            clock,
            tracker,
            store_timeout: config.store_timeout(),
        }
    }

    /// Validate and store a lead, then close its form session if one is named.
    ///
    /// The lead is kept even if the session can't be completed; that failure is
    /// only logged.
    pub async fn create_lead(&self, input: LeadInput) -> Result<Lead, TrackingError> {
        let lead = input
            .into_lead(new_record_id(), self.clock.now())
            .map_err(TrackingError::Validation)?;

        bounded(self.store_timeout, self.store.insert_lead(&lead)).await?;

        tracing::info!(
            lead_id = %lead.id,
            source = lead.attribution.source_label(),
            has_form_session = lead.form_session_id.is_some(),
            "Lead created"
        );

        if let Some(session_id) = &lead.form_session_id {
            if let Err(e) = self
                .tracker
                .complete_session(session_id, Some(lead.id.clone()))
                .await
            {
                tracing::warn!(
                    lead_id = %lead.id,
                    session_id = %session_id,
                    error = %e,
                    "Could not link lead to form session"
                );
            }
        }

        Ok(lead)
    }

    /// Leads created within the last `window_days` days, newest first
    pub async fn list_leads(&self, window_days: u32) -> Result<Vec<Lead>, TrackingError> {
        let since = window_start(self.clock.now(), window_days);
        let mut leads = bounded(self.store_timeout, self.store.leads_since(since)).await?;
        leads.reverse();
        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::InMemoryStore;
    use crate::types::Attribution;
    use chrono::{TimeZone, Utc};

    struct Fixture {
        intake: LeadIntake,
        tracker: Arc<FormTracker>,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        let config = Config::default();
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 4, 16, 0, 0).unwrap());
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let tracker = Arc::new(FormTracker::new(store.clone(), shared_clock.clone(), &config));
        let intake = LeadIntake::new(store, shared_clock, tracker.clone(), &config);
        Fixture {
            intake,
            tracker,
            clock,
        }
    }

    fn input(name: &str) -> LeadInput {
        LeadInput {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lead_completes_linked_session() {
        let f = fixture();
        let session_id = f.tracker.create_session(Attribution::default()).await.unwrap();

        let mut submission = input("Morgan");
        submission.form_session_id = Some(session_id.clone());
        let lead = f.intake.create_lead(submission).await.unwrap();

        let session = f.tracker.get_session(&session_id).await.unwrap();
        assert!(session.completed);
        assert!(session.converted_to_lead);
        assert_eq!(session.lead_id.as_deref(), Some(lead.id.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_session_does_not_block_lead() {
        let f = fixture();
        let mut submission = input("Morgan");
        submission.form_session_id = Some("missing-session".to_string());

        let lead = f.intake.create_lead(submission).await.unwrap();
        assert_eq!(f.intake.list_leads(30).await.unwrap()[0].id, lead.id);
    }

    #[tokio::test]
    async fn test_invalid_lead_is_validation_error() {
        let f = fixture();
        let err = f
            .intake
            .create_lead(LeadInput {
                name: "No Contact".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::Validation(_)));
        assert!(f.intake.list_leads(30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_leads_newest_first_within_window() {
        let f = fixture();
        f.intake.create_lead(input("Avery")).await.unwrap();
        f.clock.advance(chrono::Duration::days(20));
        f.intake.create_lead(input("Blake")).await.unwrap();
        f.clock.advance(chrono::Duration::days(1));
        f.intake.create_lead(input("Casey")).await.unwrap();

        let names: Vec<String> = f
            .intake
            .list_leads(30)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Casey", "Blake", "Avery"]);

        assert_eq!(f.intake.list_leads(7).await.unwrap().len(), 2);
    }
}
