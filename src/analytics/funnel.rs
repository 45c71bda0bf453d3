//! Form funnel: how far form sessions get and where open ones stop.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::format_rate;
use crate::types::FormSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormFunnel {
    pub window_days: u32,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub converted_sessions: usize,
    /// Sessions never completed (candidates for abandonment)
    pub open_sessions: usize,
    pub completion_rate: String,
    pub average_steps_completed: f64,
    /// Mean seconds per session across all recorded steps
    pub average_duration: f64,
    /// Ascending by step
    pub steps: Vec<StepReach>,
    /// Most sessions first
    pub by_source: Vec<SourceBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepReach {
    pub step: u32,
    /// Sessions whose furthest step is at least this one
    pub sessions_reached: usize,
    /// Open sessions last seen on this step
    pub exits: usize,
    pub reach_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakdown {
    pub source: String,
    pub sessions: usize,
    pub completed: usize,
    pub completion_rate: String,
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Summarize form sessions.
///
/// An open session's exit is its `exit_step`, or its current step when it
/// never recorded one.
pub fn form_funnel(window_days: u32, sessions: &[FormSession]) -> FormFunnel {
    let total_sessions = sessions.len();
    let completed_sessions = sessions.iter().filter(|s| s.completed).count();
    let converted_sessions = sessions.iter().filter(|s| s.converted_to_lead).count();

    let mut steps: BTreeSet<u32> = BTreeSet::new();
    for session in sessions {
        steps.insert(session.max_step_reached);
        steps.insert(session.current_step);
        steps.extend(session.step_history.iter().map(|event| event.step));
    }

    let mut exits: BTreeMap<u32, usize> = BTreeMap::new();
    for session in sessions.iter().filter(|s| !s.completed) {
        let exit = session.exit_step.unwrap_or(session.current_step);
        *exits.entry(exit).or_default() += 1;
    }

    let steps = steps
        .into_iter()
        .map(|step| {
            let sessions_reached = sessions
                .iter()
                .filter(|s| s.max_step_reached >= step)
                .count();
            StepReach {
                step,
                sessions_reached,
                exits: exits.get(&step).copied().unwrap_or(0),
                reach_rate: format_rate(sessions_reached, total_sessions),
            }
        })
        .collect();

    let mut sources: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for session in sessions {
        let entry = sources
            .entry(session.attribution.source_label())
            .or_default();
        entry.0 += 1;
        if session.completed {
            entry.1 += 1;
        }
    }
    let mut by_source: Vec<SourceBreakdown> = sources
        .into_iter()
        .map(|(source, (count, completed))| SourceBreakdown {
            source: source.to_string(),
            sessions: count,
            completed,
            completion_rate: format_rate(completed, count),
        })
        .collect();
    by_source.sort_by(|a, b| b.sessions.cmp(&a.sessions).then_with(|| a.source.cmp(&b.source)));

    let steps_total: u32 = sessions.iter().map(|s| s.steps_completed).sum();
    let duration_total: f64 = sessions.iter().map(|s| s.total_duration).sum();

    FormFunnel {
        window_days,
        total_sessions,
        completed_sessions,
        converted_sessions,
        open_sessions: total_sessions - completed_sessions,
        completion_rate: format_rate(completed_sessions, total_sessions),
        average_steps_completed: mean(f64::from(steps_total), total_sessions),
        average_duration: mean(duration_total, total_sessions),
        steps,
        by_source,
    }
}
