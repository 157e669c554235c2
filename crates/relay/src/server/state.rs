use std::sync::Arc;

use crate::dispatcher::RelayDispatcher;

/// Application state shared across spill handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RelayDispatcher>,
    /// Trust `X-Forwarded-For` for the client address
    pub behind_reverse_proxy: bool,
    /// Largest body read before the spill is rejected as over-length
    pub body_limit: usize,
}

impl AppState {
    pub fn new(dispatcher: Arc<RelayDispatcher>, behind_reverse_proxy: bool, body_limit: usize) -> Self {
        Self { dispatcher, behind_reverse_proxy, body_limit }
    }
}
