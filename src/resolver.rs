//! Client IP resolution.
//!
//! # Responsibilities
//! - Pick the real client address out of CDN/LB trust headers
//! - Fall back to the transport-layer peer address
//! - Strip ports from `host:port` and `[addr]:port` forms
//!
//! # Design Decisions
//! - Strict precedence, first match wins; lower-priority headers are
//!   never consulted once a higher one is present and non-empty
//! - Best-effort: the output is not validated as a well-formed IP
//! - No trusted-hop filtering. These headers are only meaningful when
//!   the deployment topology strips or overwrites them at the edge;
//!   a direct caller can spoof any of them.

use axum::http::HeaderMap;

/// Trust headers consulted in precedence order.
const TRUST_HEADERS: [&str; 4] = [
    "CF-Connecting-IP", // Cloudflare
    "True-Client-IP",   // Akamai, Cloudflare Enterprise
    "X-Real-IP",        // Nginx
    "X-Forwarded-For",  // Standard proxy header
];

/// Resolve the client IP from trust headers, falling back to the peer
/// address with any port stripped.
///
/// Always returns some string; malformed input yields a malformed
/// result rather than an error.
pub fn resolve_client_ip(headers: &HeaderMap, peer_addr: &str) -> String {
    for name in TRUST_HEADERS {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        // X-Forwarded-For is appended to by each hop; the leftmost
        // entry is the original client as seen by the first hop.
        if name.eq_ignore_ascii_case("X-Forwarded-For") {
            let first = value.split(',').next().unwrap_or(value);
            return first.trim().to_string();
        }
        return value.trim().to_string();
    }

    strip_port(peer_addr)
}

/// Isolate the address component of a peer address string.
///
/// `[::1]:8080` -> `::1`, `127.0.0.1:8080` -> `127.0.0.1`; anything
/// without a recognizable port delimiter passes through unchanged.
fn strip_port(addr: &str) -> String {
    if let Some(idx) = addr.rfind(':') {
        if addr.contains('[') {
            if let Some(close) = addr.rfind(']') {
                return addr[1..close].to_string();
            }
        } else {
            return addr[..idx].to_string();
        }
    }
    addr.to_string()
}
