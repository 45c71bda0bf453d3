//! Conversion/attribution rollup: visitor sessions joined to leads by visitor id.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::format_rate;
use crate::types::{Attribution, Lead, VisitorSession};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRollup {
    pub summary: RollupSummary,
    /// One row per visitor session, oldest first
    pub pivot_data: Vec<VisitorPivotRow>,
    /// One row per page path, most conversions first
    pub page_conversion_rates: Vec<PageConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RollupSummary {
    pub window_days: u32,
    pub total_sessions: usize,
    pub converted_sessions: usize,
    pub unique_visitors: usize,
    pub total_leads: usize,
    /// Percentage, one decimal place
    pub overall_conversion_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPivotRow {
    pub session_id: String,
    pub visitor_id: String,
    pub started_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub converted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<String>,
    pub page_count: usize,
    #[serde(flatten)]
    pub attribution: Attribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageConversion {
    pub page: String,
    /// Distinct visitors who viewed the page
    pub visitors: usize,
    /// Of those, visitors with a lead
    pub conversions: usize,
    /// Percentage, one decimal place
    pub conversion_rate: String,
}

#[derive(Default)]
struct PageTally<'a> {
    visitors: HashSet<&'a str>,
    converted: HashSet<&'a str>,
}

/// Fold visitor sessions and leads into the rollup.
///
/// A visitor counts as converted when any lead carries their visitor id; the
/// earliest such lead is the one reported.
pub fn conversion_rollup(
    window_days: u32,
    visitor_sessions: &[VisitorSession],
    leads: &[Lead],
) -> ConversionRollup {
    let mut lead_by_visitor: HashMap<&str, &Lead> = HashMap::new();
    for lead in leads {
        if let Some(visitor_id) = lead.visitor_id.as_deref() {
            lead_by_visitor
                .entry(visitor_id)
                .and_modify(|existing| {
                    if lead.created_at < existing.created_at {
                        *existing = lead;
                    }
                })
                .or_insert(lead);
        }
    }

    let mut pivot_data = Vec::with_capacity(visitor_sessions.len());
    let mut pages: BTreeMap<&str, PageTally<'_>> = BTreeMap::new();
    let mut unique_visitors: HashSet<&str> = HashSet::new();

    for session in visitor_sessions {
        let visitor_id = session.visitor_id.as_str();
        let lead = lead_by_visitor.get(visitor_id);
        let converted = lead.is_some();
        unique_visitors.insert(visitor_id);

        for view in &session.page_views {
            let tally = pages.entry(view.path.as_str()).or_default();
            tally.visitors.insert(visitor_id);
            if converted {
                tally.converted.insert(visitor_id);
            }
        }

        pivot_data.push(VisitorPivotRow {
            session_id: session.id.clone(),
            visitor_id: session.visitor_id.clone(),
            started_at: session.started_at,
            last_seen_at: session.last_seen_at,
            converted,
            lead_id: lead.map(|l| l.id.clone()),
            first_page: session.first_page().map(str::to_string),
            last_page: session.last_page().map(str::to_string),
            page_count: session.page_views.len(),
            attribution: session.attribution.clone(),
        });
    }
    pivot_data.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    let mut page_conversion_rates: Vec<PageConversion> = pages
        .into_iter()
        .map(|(page, tally)| PageConversion {
            page: page.to_string(),
            visitors: tally.visitors.len(),
            conversions: tally.converted.len(),
            conversion_rate: format_rate(tally.converted.len(), tally.visitors.len()),
        })
        .collect();
    page_conversion_rates.sort_by(|a, b| {
        b.conversions
            .cmp(&a.conversions)
            .then_with(|| b.visitors.cmp(&a.visitors))
            .then_with(|| a.page.cmp(&b.page))
    });

    let total_sessions = pivot_data.len();
    let converted_sessions = pivot_data.iter().filter(|row| row.converted).count();

    ConversionRollup {
        summary: RollupSummary {
            window_days,
            total_sessions,
            converted_sessions,
            unique_visitors: unique_visitors.len(),
            total_leads: leads.len(),
            overall_conversion_rate: format_rate(converted_sessions, total_sessions),
        },
        pivot_data,
        page_conversion_rates,
    }
}
