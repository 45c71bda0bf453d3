//! Read-side analytics for the admin dashboard.
//!
//! Both reports are pure folds over records read from the store. The two reads
//! behind the conversion rollup are not taken atomically; a lead written
//! between them is simply counted or not.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{window_start, Clock};
use crate::config::Config;
use crate::store::{bounded, RecordStore};
use crate::tracking::TrackingError;

mod funnel;
mod rollup;

pub use funnel::{form_funnel, FormFunnel, SourceBreakdown, StepReach};
pub use rollup::{
    conversion_rollup, ConversionRollup, PageConversion, RollupSummary, VisitorPivotRow,
};

/// Percentage with one decimal place; "0.0" when there is nothing to divide by
pub fn format_rate(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", numerator as f64 * 100.0 / denominator as f64)
}

pub struct Analytics {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl Analytics {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            store_timeout: config.store_timeout(),
        }
    }

    /// Visitor sessions joined against leads over the last `window_days` days
    pub async fn conversion_rollup(&self, window_days: u32) -> Result<ConversionRollup, TrackingError> {
        let since = window_start(self.clock.now(), window_days);
        let visitor_sessions =
            bounded(self.store_timeout, self.store.visitor_sessions_since(since)).await?;
        let leads = bounded(self.store_timeout, self.store.leads_since(since)).await?;

        let rollup = conversion_rollup(window_days, &visitor_sessions, &leads);
        tracing::debug!(
            window_days,
            sessions = rollup.summary.total_sessions,
            converted = rollup.summary.converted_sessions,
            pages = rollup.page_conversion_rates.len(),
            "Conversion rollup built"
        );
        Ok(rollup)
    }

    /// Step reach and completion over form sessions from the last `window_days` days
    pub async fn form_funnel(&self, window_days: u32) -> Result<FormFunnel, TrackingError> {
        let since = window_start(self.clock.now(), window_days);
        let sessions = bounded(self.store_timeout, self.store.form_sessions_since(since)).await?;
        Ok(form_funnel(window_days, &sessions))
    }
}
