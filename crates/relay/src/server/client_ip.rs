use std::net::IpAddr;

use axum::http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Client address for a request.
///
/// Behind a reverse proxy the left-most `X-Forwarded-For` entry is the
/// original client; without a usable header the socket peer is used.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    behind_reverse_proxy: bool,
) -> Option<IpAddr> {
    if behind_reverse_proxy {
        if let Some(forwarded) = forwarded_client(headers) {
            return Some(forwarded);
        }
    }
    peer
}

fn forwarded_client(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    value.split(',').next()?.trim().parse().ok()
}
