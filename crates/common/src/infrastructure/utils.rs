use std::net::{Ipv4Addr, Ipv6Addr};

use url::Host;

use super::error::{Error, Result};

/// Slack reserved for JSON framing, the sender email and the captcha token
const REQUEST_ENVELOPE_BYTES: usize = 16 * 1024;

/// Request body size limit for a spill accepting messages of `max_message_length` chars.
///
/// A char outside the BMP is sent by some encoders as a `\uXXXX\uXXXX` surrogate pair,
/// so the worst case is 12 bytes per char plus the envelope.
#[must_use]
pub fn request_body_limit(max_message_length: usize) -> usize {
    max_message_length.saturating_mul(12).saturating_add(REQUEST_ENVELOPE_BYTES)
}

/// Safe URL parsing and validation
///
/// # Errors
///
/// Returns an error if:
/// - The URL cannot be parsed
/// - The URL scheme is not HTTPS
/// - The URL points to a local address
pub fn parse_and_validate_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url)
        .map_err(|e| Error::InvalidUrl(format!("Failed to parse URL '{url}': {e}")))?;

    if parsed.scheme() != "https" {
        return Err(Error::InvalidUrl(format!("URL '{url}' must use HTTPS scheme")));
    }

    let host = parsed.host().ok_or_else(|| Error::InvalidUrl(format!("URL '{url}' has no host")))?;

    if is_local_host(&host) {
        return Err(Error::InvalidUrl(format!("URL '{url}' must not point to local addresses")));
    }

    Ok(parsed)
}

/// Loopback, private, link-local or unspecified hosts
fn is_local_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(addr) => is_local_ipv4(*addr),
        Host::Ipv6(addr) => is_local_ipv6(*addr),
    }
}

fn is_local_ipv4(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_private() || addr.is_link_local() || addr.is_unspecified()
}

fn is_local_ipv6(addr: Ipv6Addr) -> bool {
    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_local_ipv4(v4);
    }

    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        || (first & 0xfe00) == 0xfc00 // fc00::/7 unique local
        || (first & 0xffc0) == 0xfe80 // fe80::/10 link-local
}
