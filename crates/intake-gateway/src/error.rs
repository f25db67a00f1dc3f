//! Error types for the submission gateway.

use intake_core::IntakeError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response (refused, timed out, DNS).
    #[error("Transport failure: {0}")]
    Transport(String),
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<GatewayError> for IntakeError {
    fn from(err: GatewayError) -> Self {
        IntakeError::Gateway(err.to_string())
    }
}
