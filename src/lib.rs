//! Client-IP-injecting forwarding proxy library.
//!
//! Sits in front of a metrics-ingestion backend behind CDNs and load
//! balancers, forwarding every request 1:1 to a fixed upstream while
//! injecting the best-guess real client IP as `X-MGM-Client-IP`.

pub mod config;
pub mod http;
pub mod resolver;

pub use config::ProxyConfig;
pub use http::HttpServer;
