//! API state management for the REST server.

use std::sync::Arc;

use crate::analytics::Analytics;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::leads::LeadIntake;
use crate::store::RecordStore;
use crate::tracking::FormTracker;
use crate::visitors::VisitorTracker;

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
    pub tracker: Arc<FormTracker>,
    pub leads: Arc<LeadIntake>,
    pub visitors: Arc<VisitorTracker>,
    pub analytics: Arc<Analytics>,
}

impl ApiState {
    /// Create API state over `store` using the system clock
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        let tracker = Arc::new(FormTracker::new(store.clone(), clock.clone(), &config));
        let leads = Arc::new(LeadIntake::new(
            store.clone(),
            clock.clone(),
            tracker.clone(),
            &config,
        ));
        let visitors = Arc::new(VisitorTracker::new(store.clone(), clock.clone(), &config));
        let analytics = Arc::new(Analytics::new(store.clone(), clock, &config));

        Self {
            config: Arc::new(config),
            store,
            tracker,
            leads,
            visitors,
            analytics,
        }
    }

    /// Window for an analytics or listing request, defaulting from config
    pub fn window_days(&self, requested: Option<u32>) -> u32 {
        self.config.window_days(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn test_window_days_uses_config_default() {
        let mut config = Config::default();
        config.tracking.default_window_days = 14;
        let state = ApiState::new(config, Arc::new(InMemoryStore::new()));

        assert_eq!(state.window_days(None), 14);
        assert_eq!(state.window_days(Some(3)), 3);
    }
}
