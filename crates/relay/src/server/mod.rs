use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use eyre::{eyre, Result};
use jiff::tz::TimeZone;
use spill_common::{
    config::{SinkConfig, SpillConfig},
    infrastructure::request_body_limit,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    captcha::{HumanVerificationGate, RecaptchaProvider},
    dispatcher::RelayDispatcher,
    metrics::start_metrics_server,
    sink::{NotificationSink, SmtpSink, WebhookSink},
    validation::InputValidator,
};

mod client_ip;
mod handlers;
mod state;

pub use client_ip::resolve_client_ip;
pub use state::AppState;

use handlers::{handle_spill, status};

/// Wire the dispatcher and its collaborators from the config
pub fn build_dispatcher(config: &SpillConfig) -> Result<RelayDispatcher> {
    let provider = RecaptchaProvider::new(&config.captcha)?;

    let sink: Arc<dyn NotificationSink> = match &config.sink {
        SinkConfig::Webhook(webhook) => Arc::new(WebhookSink::new(webhook)?),
        SinkConfig::Smtp(smtp) => Arc::new(SmtpSink::new(smtp)?),
    };

    let time_zone = TimeZone::get(&config.notify.time_zone)
        .map_err(|e| eyre!("Unknown time zone '{}': {e}", config.notify.time_zone))?;

    Ok(RelayDispatcher::new(
        HumanVerificationGate::new(Arc::new(provider)),
        InputValidator::new(&config.validation),
        sink,
        time_zone,
        config.notify.support_email.clone(),
    ))
}

/// Start the spill API (and the metrics server, if configured) and run until Ctrl-C
pub async fn start_spill_server(config: SpillConfig) -> Result<()> {
    if let Some(metrics_port) = config.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(metrics_port).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Spill API listening on {}", addr);

    run_spill_server(listener, &config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal, stopping gracefully...");
    })
    .await
}

/// Serve the spill API on `listener` until `shutdown` resolves
pub async fn run_spill_server<F>(listener: TcpListener, config: &SpillConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let dispatcher = Arc::new(build_dispatcher(config)?);
    let body_limit = request_body_limit(dispatcher.validator().max_message_length());
    let state = AppState::new(dispatcher, config.behind_reverse_proxy, body_limit);

    let app = create_router(state, &config.allowed_origins);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/spill", post(handle_spill))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}
