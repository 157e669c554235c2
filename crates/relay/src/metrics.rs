use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

lazy_static! {
    /// Spills that reached the dispatcher
    pub static ref SPILLS_RECEIVED: IntCounter = register_int_counter!(
        "spill_received_total",
        "Total number of spill submissions received"
    )
    .expect("Failed to register spills received metric");

    /// Spills rejected before delivery, by reason
    pub static ref SPILLS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "spill_rejected_total",
        "Total number of spill submissions rejected",
        &["reason"]
    )
    .expect("Failed to register spills rejected metric");

    /// Spills accepted by the sink
    pub static ref SPILLS_DELIVERED: IntCounter = register_int_counter!(
        "spill_delivered_total",
        "Total number of spills delivered to the notification sink"
    )
    .expect("Failed to register spills delivered metric");

    /// Spills that passed validation but could not be delivered
    pub static ref SPILL_DELIVERY_FAILURES: IntCounterVec = register_int_counter_vec!(
        "spill_delivery_failed_total",
        "Total number of spills the notification sink failed to accept",
        &["sink"]
    )
    .expect("Failed to register delivery failures metric");

    /// Verification provider calls that errored (counted as failed captchas)
    pub static ref CAPTCHA_PROVIDER_ERRORS: IntCounter = register_int_counter!(
        "captcha_provider_errors_total",
        "Total number of verification provider calls that failed"
    )
    .expect("Failed to register captcha provider errors metric");
}

/// Serve `/metrics` in the Prometheus text format until the listener fails
pub async fn start_metrics_server(port: u16) -> eyre::Result<()> {
    let app = Router::new().route("/metrics", get(handle_metrics));

    let addr = format!("0.0.0.0:{port}");
    info!("Metrics server listening on {}", addr);

    axum::serve(TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}

async fn handle_metrics() -> impl IntoResponse {
    match encode_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

fn encode_metrics() -> eyre::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
