//! Application state for the calculator API.

use std::sync::Arc;

use crate::engine::Dispatcher;

/// Shared application state.
///
/// Holds the dispatcher every handler routes through.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Creates a new application state around a dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
