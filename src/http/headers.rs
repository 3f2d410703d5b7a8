//! Header relay helpers.
//!
//! # Responsibilities
//! - Copy a header multimap verbatim, preserving per-key order and
//!   multiplicity
//! - Define the injected client-IP header name
//!
//! # Design Decisions
//! - One copy utility used for both directions (inbound -> outbound
//!   request, upstream -> outbound response)
//! - `append`, not `insert`: repeated header lines must survive the relay

use axum::http::HeaderMap;

/// Header carrying the resolved client IP to the upstream.
pub const X_MGM_CLIENT_IP: &str = "x-mgm-client-ip";

/// Copy every (key, value) pair from `src` into `dst`, preserving the
/// order and multiplicity of repeated keys.
pub fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (key, value) in src.iter() {
        dst.append(key.clone(), value.clone());
    }
}
