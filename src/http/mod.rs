//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, /health probe, forwarding handler)
//!     → resolver (client IP from trust headers / peer address)
//!     → headers.rs (verbatim header relay + injected client-IP header)
//!     → upstream dispatch → response relayed to client
//! ```

pub mod headers;
pub mod server;

pub use headers::{copy_headers, X_MGM_CLIENT_IP};
pub use server::HttpServer;
