use std::sync::Arc;
use yarnhue_core::{Config, YarnMatcher};

/// Shared application state
pub struct AppState {
    config: Config,
    matcher: Arc<YarnMatcher>,
}

impl AppState {
    pub fn new(config: Config, matcher: Arc<YarnMatcher>) -> Self {
        Self { config, matcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn matcher(&self) -> &YarnMatcher {
        self.matcher.as_ref()
    }
}
