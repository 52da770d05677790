use std::sync::Arc;

use runtime::{AnthropicBackend, Bridge};
use tokio::sync::Mutex;

/// Shared application state for the chat routes.
///
/// The bridge sits behind a `tokio::Mutex` so concurrent chat requests
/// serialize on the one tool host connection: a turn holds the lock from
/// entry guard to final text, which is the single-flight discipline the
/// orchestrator requires.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Mutex<Bridge<AnthropicBackend>>>,
}

impl AppState {
    pub fn new(bridge: Bridge<AnthropicBackend>) -> Self {
        Self {
            bridge: Arc::new(Mutex::new(bridge)),
        }
    }
}
