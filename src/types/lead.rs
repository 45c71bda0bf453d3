//! Lead records - named prospects produced by a form submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Attribution;

/// Minimum digits a phone number needs to be worth calling back
const MIN_PHONE_DIGITS: usize = 7;

/// A stored lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Property address being valued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Cookie-scoped visitor identifier, joins the lead to page-view sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    /// Form session that produced this lead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_session_id: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

/// Lead submission from the valuation form or the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub form_session_id: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadInput {
    /// Validate and turn the submission into a lead record
    pub fn into_lead(self, id: String, now: DateTime<Utc>) -> Result<Lead, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("name is required".to_string());
        }

        let email = non_blank(self.email);
        let phone = non_blank(self.phone);

        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(format!("'{}' is not a valid email address", email));
            }
        }
        if let Some(phone) = &phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if digits < MIN_PHONE_DIGITS {
                return Err(format!(
                    "phone number needs at least {} digits",
                    MIN_PHONE_DIGITS
                ));
            }
        }
        if email.is_none() && phone.is_none() {
            return Err("an email address or phone number is required".to_string());
        }

        Ok(Lead {
            id,
            created_at: now,
            name,
            email,
            phone,
            address: non_blank(self.address),
            message: non_blank(self.message),
            visitor_id: non_blank(self.visitor_id),
            form_session_id: non_blank(self.form_session_id),
            attribution: self.attribution.normalized(),
        })
    }
}
