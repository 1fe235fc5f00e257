//! # cord-common
//!
//! Shared building blocks for the cord client library: platform id type,
//! tri-state JSON fields, client configuration, and tracing setup.

pub mod config;
pub mod json;
pub mod snowflake;
pub mod telemetry;

pub use config::{ClientConfig, GatewayOptions, API_VERSION, DEFAULT_API_BASE};
pub use json::Maybe;
pub use snowflake::{Snowflake, SnowflakeParseError};
pub use telemetry::{init_tracing, init_tracing_with_config, TracingConfig};

/// Default `User-Agent` sent with every REST request.
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "cord (https://github.com/cord-rs/cord, {})",
        env!("CARGO_PKG_VERSION")
    )
}
