use std::net::SocketAddr;

use axum::{
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use super::{client_ip::resolve_client_ip, state::AppState};
use crate::types::SpillRequest;

/// Handle a spill submission
pub async fn handle_spill(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();

    let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let source_address = resolve_client_ip(&parts.headers, peer, state.behind_reverse_proxy);

    let body = match to_bytes(body, state.body_limit).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Could not read spill body");
            return state.dispatcher.reject_unreadable();
        }
    };

    state.dispatcher.handle(SpillRequest { body, source_address }).await
}

/// Liveness probe
pub async fn status() -> impl IntoResponse {
    StatusCode::OK
}
