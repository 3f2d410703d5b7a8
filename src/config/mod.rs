//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment (MGM_TARGET_URL, PORT)
//!     → loader.rs (read & validate)
//!     → ProxyConfig (validated, immutable)
//!     → passed into HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no reload
//! - All fields have documented defaults to allow zero-config startup
//! - Invalid upstream URL or port is fatal before the listener binds

pub mod loader;
pub mod schema;

pub use loader::{load_from_env, ConfigError};
pub use schema::ProxyConfig;
