use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::Value;

pub const WEBHOOK_PATH: &str = "/services/T000/B000/XXX";

/// Stand-in for a Slack incoming webhook
#[derive(Default)]
pub struct MockWebhookState {
    received: AtomicU64,
    bodies: RwLock<Vec<Value>>,
    response_override: RwLock<Option<StatusCode>>,
}

impl MockWebhookState {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.read().unwrap().clone()
    }

    pub fn set_response_override(&self, status: StatusCode) {
        *self.response_override.write().unwrap() = Some(status);
    }
}

pub fn mock_webhook_router(state: Arc<MockWebhookState>) -> Router {
    Router::new().route(WEBHOOK_PATH, post(handle_webhook)).with_state(state)
}

async fn handle_webhook(
    State(state): State<Arc<MockWebhookState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.received.fetch_add(1, Ordering::Relaxed);

    if let Some(status) = *state.response_override.read().unwrap() {
        return (status, "invalid_token").into_response();
    }

    state.bodies.write().unwrap().push(body);
    (StatusCode::OK, "ok").into_response()
}
