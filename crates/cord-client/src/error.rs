//! Client facade error type

use thiserror::Error;

/// Errors surfaced by the high-level client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Rest(#[from] cord_rest::RestError),

    #[error(transparent)]
    Gateway(#[from] cord_gateway::GatewayError),
}
