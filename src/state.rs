use std::collections::HashSet;
use std::sync::Arc;

use crate::generator::ContentGenerator;
use crate::metrics::Metrics;
use crate::registry::ModelRegistry;

// app's shared state
pub struct AppState {
    pub registry: ModelRegistry,
    pub api_keys: HashSet<String>, // empty set disables auth
    pub generator: Arc<dyn ContentGenerator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        registry: ModelRegistry,
        api_keys: impl IntoIterator<Item = String>,
        generator: Arc<dyn ContentGenerator>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            api_keys: api_keys.into_iter().collect(),
            generator,
            metrics,
        }
    }
}
