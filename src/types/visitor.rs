//! Visitor sessions - page views grouped by visitor and idle gap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Attribution;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub path: String,
    pub viewed_at: DateTime<Utc>,
}

/// Page view reported by the site's tracking snippet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageViewInput {
    pub path: String,
    /// Only used when this view starts a new visitor session
    #[serde(flatten)]
    pub attribution: Attribution,
}

/// A run of page views by one visitor with no gap longer than the idle limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSession {
    pub id: String,
    pub visitor_id: String,
    pub started_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Bumped on every recorded view; stores reject a replace whose expected version is stale
    #[serde(default)]
    pub version: u64,
    /// In view order
    #[serde(default)]
    pub page_views: Vec<PageView>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

impl VisitorSession {
    pub fn start(
        id: String,
        visitor_id: String,
        attribution: Attribution,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            visitor_id,
            started_at: now,
            last_seen_at: now,
            version: 0,
            page_views: Vec::new(),
            attribution,
        }
    }

    /// Whether a view at `now` still belongs to this session
    pub fn is_active(&self, now: DateTime<Utc>, idle_gap: chrono::Duration) -> bool {
        now - self.last_seen_at <= idle_gap
    }

    pub fn record_view(&mut self, path: String, now: DateTime<Utc>) {
        self.page_views.push(PageView {
            path,
            viewed_at: now,
        });
        self.last_seen_at = self.last_seen_at.max(now);
        self.version += 1;
    }

    pub fn first_page(&self) -> Option<&str> {
        self.page_views.first().map(|view| view.path.as_str())
    }

    pub fn last_page(&self) -> Option<&str> {
        self.page_views.last().map(|view| view.path.as_str())
    }
}
