//! Application state for the payroll engine API.

use std::sync::Arc;

use crate::catalog::ComponentCatalog;
use crate::config::ConfigLoader;

/// Shared application state.
///
/// Holds the loaded catalog configuration, shared read-only by every request
/// handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the component catalog.
    pub fn catalog(&self) -> &ComponentCatalog {
        self.config.catalog()
    }
}
