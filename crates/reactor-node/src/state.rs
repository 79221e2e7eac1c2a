//! Application state.

use std::sync::Arc;

use reactor_core::ReactorConfig;
use reactor_plan::Dispatcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration.
    pub config: Arc<ReactorConfig>,

    /// Outbound dispatcher shared by every plan execution.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create state that dispatches over HTTP.
    pub fn new(config: ReactorConfig) -> Self {
        let config = Arc::new(config);
        Self {
            dispatcher: Dispatcher::http(config.clone()),
            config,
        }
    }

    /// Create state around an existing dispatcher.
    #[cfg(test)]
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(dispatcher.config().clone()),
            dispatcher,
        }
    }
}
