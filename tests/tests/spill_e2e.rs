use std::{net::SocketAddr, sync::Arc};

use axum::http::StatusCode;
use eyre::Result;
use serde_json::{json, Value};
use spill_common::SpillConfig;
use spill_tests::{
    mock_provider::{mock_provider_router, MockProviderState, ProviderBehaviour},
    mock_webhook::{mock_webhook_router, MockWebhookState},
    utils::{
        setup_test_env, spawn_router, start_spill_relay, unused_port, webhook_config,
        CAPTCHA_SECRET,
    },
};

struct Relay {
    addr: SocketAddr,
    provider: Arc<MockProviderState>,
    webhook: Arc<MockWebhookState>,
}

async fn relay_with(behaviour: ProviderBehaviour) -> Result<Relay> {
    relay_with_config(behaviour, |_| {}).await
}

async fn relay_with_config(
    behaviour: ProviderBehaviour,
    customize: impl FnOnce(&mut SpillConfig),
) -> Result<Relay> {
    setup_test_env();

    let provider = Arc::new(MockProviderState::new(behaviour));
    let webhook = Arc::new(MockWebhookState::default());
    let provider_addr = spawn_router(mock_provider_router(provider.clone())).await?;
    let webhook_addr = spawn_router(mock_webhook_router(webhook.clone())).await?;

    let mut config = webhook_config(provider_addr, webhook_addr)?;
    customize(&mut config);
    let addr = start_spill_relay(config).await?;

    Ok(Relay { addr, provider, webhook })
}

async fn post_spill(addr: SocketAddr, body: String) -> Result<(StatusCode, String)> {
    post_spill_with(reqwest::Client::new().post(format!("http://{addr}/spill")).body(body)).await
}

async fn post_spill_with(request: reqwest::RequestBuilder) -> Result<(StatusCode, String)> {
    let response = request.send().await?;
    let status = StatusCode::from_u16(response.status().as_u16())?;
    Ok((status, response.text().await?))
}

fn spill(email: &str, message: &str) -> String {
    json!({"email": email, "message": message, "g-recaptcha-response": "token-123"}).to_string()
}

fn plain_texts(webhook_body: &Value) -> Vec<String> {
    webhook_body["blocks"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|block| block["text"]["type"] == "plain_text")
        .filter_map(|block| block["text"]["text"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_status_endpoint() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let response = reqwest::get(format!("http://{}/status", relay.addr)).await?;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_valid_spill_reaches_webhook() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let (status, body) = post_spill(relay.addr, spill("Student@wisc.edu", "hello")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Your spill has been sent successfully!");

    let query = relay.provider.last_query().expect("provider was called");
    assert_eq!(query.get("secret").map(String::as_str), Some(CAPTCHA_SECRET));
    assert_eq!(query.get("response").map(String::as_str), Some("token-123"));

    let bodies = relay.webhook.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        plain_texts(&bodies[0]),
        vec!["hello", "Email: student@wisc.edu", "IP Address: 127.0.0.1"]
    );

    Ok(())
}

#[tokio::test]
async fn test_failed_captcha_rejected() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(false)).await?;

    let (status, body) = post_spill(relay.addr, spill("student@wisc.edu", "hello")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please complete the captcha (the \"I'm not a robot\" checkbox) and try again.");
    assert_eq!(relay.provider.received(), 1);
    assert_eq!(relay.webhook.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_malformed_provider_reply_rejected_as_captcha() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Malformed).await?;

    let (status, body) = post_spill(relay.addr, spill("student@wisc.edu", "hello")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Please complete the captcha"));
    assert_eq!(relay.webhook.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_missing_token_skips_provider() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let body = json!({"email": "student@wisc.edu", "message": "hello"}).to_string();
    let (status, text) = post_spill(relay.addr, body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.starts_with("Please complete the captcha"));
    assert_eq!(relay.provider.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_foreign_domain_rejected() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let (status, body) = post_spill(relay.addr, spill("student@gmail.com", "hello")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("A wisc.edu email must be specified"));
    assert_eq!(relay.webhook.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_message_length_limit() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let (status, _) = post_spill(relay.addr, spill("a@wisc.edu", &"x".repeat(10_000))).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_spill(relay.addr, spill("a@wisc.edu", &"x".repeat(10_001))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "A message must be included. Messages cannot be longer than 10000 characters.");
    assert_eq!(relay.webhook.received(), 1);

    Ok(())
}

#[tokio::test]
async fn test_escaped_astral_message_at_limit_accepted() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    // 10000 badgers, each escaped as a UTF-16 surrogate pair (12 bytes on the wire)
    let message = r"\ud83e\udda1".repeat(10_000);
    let body = format!(
        r#"{{"email":"a@wisc.edu","message":"{message}","g-recaptcha-response":"token-123"}}"#
    );

    let (status, text) = post_spill(relay.addr, body).await?;
    assert_eq!(status, StatusCode::OK, "{text}");

    let bodies = relay.webhook.bodies();
    assert_eq!(plain_texts(&bodies[0])[0].chars().count(), 10_000);

    Ok(())
}

#[tokio::test]
async fn test_oversized_body_without_token_reads_as_missing_body() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let body = json!({"email": "a@wisc.edu", "message": "x".repeat(200_000)}).to_string();
    let (status, text) = post_spill(relay.addr, body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "No body attached to request.");
    assert_eq!(relay.provider.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_empty_body_rejected() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let (status, body) = post_spill(relay.addr, String::new()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No body attached to request.");
    assert_eq!(relay.provider.received(), 0);

    Ok(())
}

#[tokio::test]
async fn test_webhook_failure_returns_fallback_contact() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;
    relay.webhook.set_response_override(StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = post_spill(relay.addr, spill("student@wisc.edu", "hello")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Please email dev.badgerspill@gmail.com"));
    // One attempt, no retry
    assert_eq!(relay.webhook.received(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unreachable_smtp_server_returns_fallback_contact() -> Result<()> {
    let smtp_port = unused_port().await?;
    let relay = relay_with_config(ProviderBehaviour::Verdict(true), |config| {
        config.sink = SpillConfig::from_toml_str(&format!(
            r#"
            [captcha]
            secret = "unused"

            [sink]
            type = "smtp"
            host = "127.0.0.1"
            port = {smtp_port}
            username = "relay@example.com"
            password = "hunter2"
            to = "inbox@example.com"
            timeout_ms = 2000
            "#
        ))
        .expect("smtp config parses")
        .sink;
    })
    .await?;

    let (status, body) = post_spill(relay.addr, spill("student@wisc.edu", "hello")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Please email dev.badgerspill@gmail.com"));

    Ok(())
}

#[tokio::test]
async fn test_forwarded_for_trusted_behind_proxy() -> Result<()> {
    let relay =
        relay_with_config(ProviderBehaviour::Verdict(true), |config| config.behind_reverse_proxy = true)
            .await?;

    let request = reqwest::Client::new()
        .post(format!("http://{}/spill", relay.addr))
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .body(spill("student@wisc.edu", "hello"));
    let (status, _) = post_spill_with(request).await?;
    assert_eq!(status, StatusCode::OK);

    let bodies = relay.webhook.bodies();
    assert!(plain_texts(&bodies[0]).contains(&"IP Address: 203.0.113.7".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_proxy() -> Result<()> {
    let relay = relay_with(ProviderBehaviour::Verdict(true)).await?;

    let request = reqwest::Client::new()
        .post(format!("http://{}/spill", relay.addr))
        .header("X-Forwarded-For", "203.0.113.7")
        .body(spill("student@wisc.edu", "hello"));
    let (status, _) = post_spill_with(request).await?;
    assert_eq!(status, StatusCode::OK);

    let bodies = relay.webhook.bodies();
    assert!(plain_texts(&bodies[0]).contains(&"IP Address: 127.0.0.1".to_string()));

    Ok(())
}
