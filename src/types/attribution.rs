//! Marketing-source and device metadata captured once per session.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// UTM parameters, referrer, landing page and device info.
///
/// Captured when a session starts and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,

    // ─────────────────────────────────────────────────────────────────────
    // Device
    // ─────────────────────────────────────────────────────────────────────
    /// "mobile", "tablet" or "desktop" as reported by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// e.g. "390x844"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<String>,
}

impl Attribution {
    /// Trim every field and drop the ones left empty.
    ///
    /// Browsers send `""` for missing query parameters; those should read as absent.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            utm_source: clean(self.utm_source),
            utm_medium: clean(self.utm_medium),
            utm_campaign: clean(self.utm_campaign),
            utm_term: clean(self.utm_term),
            utm_content: clean(self.utm_content),
            referrer: clean(self.referrer),
            landing_page: clean(self.landing_page),
            device_type: clean(self.device_type),
            browser: clean(self.browser),
            os: clean(self.os),
            screen_size: clean(self.screen_size),
        }
    }

    /// Label used to group traffic by source ("direct" when no UTM source was given)
    pub fn source_label(&self) -> &str {
        self.utm_source.as_deref().unwrap_or("direct")
    }
}
