//! Form session records - one per attempt at the multi-step valuation form.
//!
//! A session is opened when the visitor reaches the first tracked step, grows
//! one [`StepEvent`] per step transition, and is closed by a single completion.
//! Sessions that never complete are reconciled as abandoned elsewhere using
//! `exit_step` and `max_step_reached`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Attribution;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, no step events yet
    Open,
    /// At least one step event recorded
    InProgress,
    /// Closed by a completion call
    Completed,
}

/// One step transition, embedded in [`FormSession::step_history`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepEvent {
    pub step: u32,
    pub step_name: String,
    /// `left_at - duration`, never later than `left_at`
    pub entered_at: DateTime<Utc>,
    /// When the event was received
    pub left_at: DateTime<Utc>,
    /// Seconds spent on the step, as reported by the client
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub answer: Option<serde_json::Value>,
    #[serde(default)]
    pub was_skipped: bool,
    #[serde(default)]
    pub went_back: bool,
}

/// A step transition as submitted by the form wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepEventInput {
    pub step: u32,
    pub step_name: String,
    /// Seconds spent on the step
    pub duration: f64,
    /// Value entered on this step
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub answer: Option<serde_json::Value>,
    /// Full snapshot of every form field; replaces the stored snapshot when present
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub answers: Option<serde_json::Value>,
    #[serde(default)]
    pub was_skipped: bool,
    #[serde(default)]
    pub went_back: bool,
}

impl StepEventInput {
    pub fn new(step: u32, step_name: impl Into<String>, duration: f64) -> Self {
        Self {
            step,
            step_name: step_name.into(),
            duration,
            answer: None,
            answers: None,
            was_skipped: false,
            went_back: false,
        }
    }

    /// Check the fields the wizard is expected to send well-formed
    pub fn validate(&self) -> Result<(), String> {
        if self.step_name.trim().is_empty() {
            return Err("stepName must not be empty".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            ));
        }
        if self.duration > MAX_STEP_SECONDS {
            return Err(format!(
                "duration must be at most {} seconds, got {}",
                MAX_STEP_SECONDS, self.duration
            ));
        }
        Ok(())
    }
}

/// Longest time a single step may report (one day)
pub const MAX_STEP_SECONDS: f64 = 86_400.0;

/// When a step lasting `duration` seconds and ending at `left_at` began.
///
/// Negative durations count as zero; durations past the calendar range clamp
/// to the earliest representable instant.
fn entered_at(left_at: DateTime<Utc>, duration: f64) -> DateTime<Utc> {
    let elapsed_ms = (duration.max(0.0) * 1000.0).round() as i64;
    TimeDelta::try_milliseconds(elapsed_ms)
        .and_then(|elapsed| left_at.checked_sub_signed(elapsed))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A single attempt at filling the valuation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write; stores reject a replace whose expected version is stale
    pub version: u64,

    #[serde(flatten)]
    pub attribution: Attribution,

    // ─────────────────────────────────────────────────────────────────────
    // Progress
    // ─────────────────────────────────────────────────────────────────────
    /// Append-only, in arrival order
    #[serde(default)]
    pub step_history: Vec<StepEvent>,
    pub current_step: u32,
    pub max_step_reached: u32,
    /// Non-skipped events in `step_history`
    pub steps_completed: u32,
    /// Seconds summed over every event in `step_history`
    pub total_duration: f64,
    /// `total_duration / steps_completed`, 0.0 while nothing is completed
    pub average_step_time: f64,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub answers: Option<serde_json::Value>,

    // ─────────────────────────────────────────────────────────────────────
    // Outcome
    // ─────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub converted_to_lead: bool,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub abandoned: bool,
    /// Last known position, used when the session is never completed
    #[serde(default)]
    pub exit_step: Option<u32>,
}

impl FormSession {
    /// A fresh session positioned on `initial_step`
    pub fn open(
        session_id: String,
        attribution: Attribution,
        initial_step: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            created_at: now,
            updated_at: now,
            version: 0,
            attribution,
            step_history: Vec::new(),
            current_step: initial_step,
            max_step_reached: initial_step,
            steps_completed: 0,
            total_duration: 0.0,
            average_step_time: 0.0,
            answers: None,
            completed: false,
            completed_at: None,
            converted_to_lead: false,
            lead_id: None,
            abandoned: false,
            exit_step: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.completed {
            SessionStatus::Completed
        } else if self.step_history.is_empty() {
            SessionStatus::Open
        } else {
            SessionStatus::InProgress
        }
    }

    /// Append a step event received at `now` and refresh every derived field.
    ///
    /// Repeated submissions of the same step are appended, not merged.
    pub fn record_step(&mut self, input: StepEventInput, now: DateTime<Utc>) {
        self.step_history.push(StepEvent {
            step: input.step,
            step_name: input.step_name,
            entered_at: entered_at(now, input.duration),
            left_at: now,
            duration: input.duration,
            answer: input.answer,
            was_skipped: input.was_skipped,
            went_back: input.went_back,
        });

        self.max_step_reached = self.max_step_reached.max(input.step);
        self.current_step = input.step;
        self.exit_step = Some(input.step);
        if input.answers.is_some() {
            self.answers = input.answers;
        }
        self.recompute_rollups();
        self.touch(now);
    }

    /// Close the session, linking the lead it produced if any.
    ///
    /// Calling this again with a different lead overwrites the link; the last
    /// call wins. `completed_at` keeps the first completion time and
    /// `converted_to_lead` always mirrors whether a lead is linked.
    pub fn complete(&mut self, lead_id: Option<String>, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at.get_or_insert(now);
        self.abandoned = false;
        if lead_id.is_some() {
            self.lead_id = lead_id;
        }
        self.converted_to_lead = self.lead_id.is_some();
        self.touch(now);
    }

    /// Rebuild the aggregates from `step_history`
    pub fn recompute_rollups(&mut self) {
        self.steps_completed = self
            .step_history
            .iter()
            .filter(|event| !event.was_skipped)
            .count() as u32;
        self.total_duration = self.step_history.iter().map(|event| event.duration).sum();
        self.average_step_time = if self.steps_completed == 0 {
            0.0
        } else {
            self.total_duration / f64::from(self.steps_completed)
        };
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).unwrap()
    }

    fn session() -> FormSession {
        FormSession::open("abc123".to_string(), Attribution::default(), 3, now())
    }

    #[test]
    fn test_open_session_starts_on_initial_step() {
        let session = session();
        assert_eq!(session.current_step, 3);
        assert_eq!(session.max_step_reached, 3);
        assert!(session.step_history.is_empty());
        assert_eq!(session.status(), SessionStatus::Open);
        assert_eq!(session.average_step_time, 0.0);
    }

    #[test]
    fn test_record_step_derives_entered_at() {
        let mut session = session();
        session.record_step(StepEventInput::new(4, "address", 12.0), now());

        let event = &session.step_history[0];
        assert_eq!(event.left_at, now());
        assert_eq!(event.entered_at, now() - chrono::Duration::seconds(12));
        assert!(event.entered_at <= event.left_at);
        assert_eq!(session.current_step, 4);
        assert_eq!(session.exit_step, Some(4));
        assert_eq!(session.status(), SessionStatus::InProgress);
    }

    #[test]
    fn test_negative_duration_keeps_entered_at_ordered() {
        let mut session = session();
        session.record_step(StepEventInput::new(4, "address", -5.0), now());

        let event = &session.step_history[0];
        assert_eq!(event.entered_at, event.left_at);
        assert_eq!(session.total_duration, -5.0);
    }

    #[test]
    fn test_out_of_range_duration_clamps_entered_at() {
        let mut session = session();
        session.record_step(StepEventInput::new(4, "address", 1e13), now());
        session.record_step(StepEventInput::new(5, "bedrooms", f64::MAX), now());

        assert_eq!(session.step_history[0].entered_at, DateTime::<Utc>::MIN_UTC);
        assert_eq!(session.step_history[1].entered_at, DateTime::<Utc>::MIN_UTC);
        assert_eq!(session.steps_completed, 2);
    }

    #[test]
    fn test_max_step_reached_never_decreases() {
        let mut session = session();
        for step in [5, 7, 4, 6] {
            session.record_step(StepEventInput::new(step, "s", 1.0), now());
        }
        assert_eq!(session.max_step_reached, 7);
        assert_eq!(session.current_step, 6);

        // Going below the initial step keeps the initial step as the floor
        let mut backwards = self::session();
        backwards.record_step(StepEventInput::new(1, "s", 1.0), now());
        assert_eq!(backwards.max_step_reached, 3);
    }

    #[test]
    fn test_rollups_follow_history() {
        let mut session = session();
        session.record_step(StepEventInput::new(4, "address", 10.0), now());
        let mut skipped = StepEventInput::new(5, "bedrooms", 2.0);
        skipped.was_skipped = true;
        session.record_step(skipped, now());
        session.record_step(StepEventInput::new(6, "timeline", 6.0), now());

        let non_skipped = session
            .step_history
            .iter()
            .filter(|e| !e.was_skipped)
            .count() as u32;
        let summed: f64 = session.step_history.iter().map(|e| e.duration).sum();

        assert_eq!(session.steps_completed, non_skipped);
        assert_eq!(session.steps_completed, 2);
        assert_eq!(session.total_duration, summed);
        assert_eq!(session.total_duration, 18.0);
        assert_eq!(session.average_step_time, 9.0);
    }

    #[test]
    fn test_only_skipped_steps_average_is_zero() {
        let mut session = session();
        let mut skipped = StepEventInput::new(4, "address", 3.0);
        skipped.was_skipped = true;
        session.record_step(skipped, now());

        assert_eq!(session.steps_completed, 0);
        assert_eq!(session.average_step_time, 0.0);
        assert!(!session.average_step_time.is_nan());
    }

    #[test]
    fn test_resubmitted_step_is_cumulative() {
        let mut session = session();
        session.record_step(StepEventInput::new(4, "address", 5.0), now());
        session.record_step(StepEventInput::new(4, "address", 5.0), now());

        assert_eq!(session.step_history.len(), 2);
        assert_eq!(session.steps_completed, 2);
        assert_eq!(session.total_duration, 10.0);
    }

    #[test]
    fn test_answers_replaced_only_when_supplied() {
        let mut session = session();
        let mut first = StepEventInput::new(4, "address", 1.0);
        first.answers = Some(serde_json::json!({"address": "12 Elm St"}));
        session.record_step(first, now());

        session.record_step(StepEventInput::new(5, "beds", 1.0), now());
        assert_eq!(
            session.answers,
            Some(serde_json::json!({"address": "12 Elm St"}))
        );

        let mut third = StepEventInput::new(6, "baths", 1.0);
        third.answers = Some(serde_json::json!({"address": "12 Elm St", "baths": 2}));
        session.record_step(third, now());
        assert_eq!(session.answers.as_ref().unwrap()["baths"], 2);
    }

    #[test]
    fn test_complete_is_stable_for_same_lead() {
        let mut session = session();
        session.abandoned = true;
        session.complete(Some("L1".to_string()), now());
        let first = (session.completed, session.converted_to_lead, session.lead_id.clone());

        session.complete(Some("L1".to_string()), now());
        assert_eq!(
            (session.completed, session.converted_to_lead, session.lead_id.clone()),
            first
        );
        assert!(session.completed);
        assert!(session.converted_to_lead);
        assert!(!session.abandoned);
        assert_eq!(session.completed_at, Some(now()));
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_recomplete_keeps_first_time_and_link() {
        let mut session = session();
        session.complete(Some("L1".to_string()), now());

        let later = now() + chrono::Duration::minutes(5);
        session.complete(None, later);
        assert_eq!(session.completed_at, Some(now()));
        assert_eq!(session.lead_id.as_deref(), Some("L1"));
        assert!(session.converted_to_lead);
        assert_eq!(session.updated_at, later);

        session.complete(Some("L2".to_string()), later);
        assert_eq!(session.lead_id.as_deref(), Some("L2"));
    }

    #[test]
    fn test_complete_without_lead_is_not_converted() {
        let mut session = session();
        session.complete(None, now());
        assert!(session.completed);
        assert!(!session.converted_to_lead);
        assert!(session.lead_id.is_none());
    }

    #[test]
    fn test_every_write_bumps_version() {
        let mut session = session();
        assert_eq!(session.version, 0);
        session.record_step(StepEventInput::new(4, "address", 1.0), now());
        session.complete(None, now());
        assert_eq!(session.version, 2);
    }

    #[test]
    fn test_input_validation() {
        assert!(StepEventInput::new(4, "address", 0.0).validate().is_ok());
        assert!(StepEventInput::new(4, "  ", 1.0).validate().is_err());
        assert!(StepEventInput::new(4, "address", -1.0).validate().is_err());
        assert!(StepEventInput::new(4, "address", f64::NAN).validate().is_err());
        assert!(StepEventInput::new(4, "address", MAX_STEP_SECONDS).validate().is_ok());
        assert!(StepEventInput::new(4, "address", 1e13).validate().is_err());
    }

    #[test]
    fn test_wire_format_flattens_attribution() {
        let mut session = session();
        session.attribution.utm_source = Some("google".to_string());
        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["sessionId"], "abc123");
        assert_eq!(json["utmSource"], "google");
        assert_eq!(json["maxStepReached"], 3);

        let parsed: FormSession = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_step_input_defaults() {
        let json = r#"{"step": 4, "stepName": "address", "duration": 12}"#;
        let input: StepEventInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.duration, 12.0);
        assert!(!input.was_skipped);
        assert!(!input.went_back);
        assert!(input.answers.is_none());
    }
}
