//! Error types for the gateway client.
//!
//! # Design
//! Only failures that stop a request from producing a gateway verdict live
//! here. Declines, invalid cards and unknown ids are answered by the gateway
//! and come back as `GatewayResult::Rejected` or as a response whose own
//! `successful` flag is false, never as an `ApiError`.

use thiserror::Error;

/// Errors returned by `GatewayClient` and `Gateway`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request constructor refused a value (non-positive amount, empty
    /// reference, malformed expiry). Carries the gateway's wording; `Gateway`
    /// turns it into a `GatewayResult::Rejected`.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Gateway configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The gateway refused the credentials and sent no response envelope.
    #[error("gateway rejected the credentials")]
    Unauthorized,

    /// Non-2xx status whose body is not a gateway envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The round-trip exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or I/O failure before a response arrived.
    #[error("transport failure: {0}")]
    Transport(String),
}
