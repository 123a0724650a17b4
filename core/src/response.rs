//! Gateway response envelope and per-operation response payloads.
//!
//! # Design
//! The gateway answers every call with `{ successful, response, errors }`.
//! `GatewayResult` keeps the two levels of success apart: `Accepted` means the
//! gateway took the request, while the payload's own `successful` flag says
//! whether the transaction was approved. A declined card is therefore
//! `Accepted` with `response.successful == false`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::types::Amount;

/// Outcome of a call the gateway answered.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResult<T> {
    /// The gateway accepted the request. `errors` carries any advisory
    /// messages sent alongside the payload.
    Accepted { response: T, errors: Vec<String> },
    /// The gateway refused the request. `errors` is never empty.
    Rejected { errors: Vec<String> },
}

impl<T> GatewayResult<T> {
    pub fn successful(&self) -> bool {
        matches!(self, GatewayResult::Accepted { .. })
    }

    pub fn response(&self) -> Option<&T> {
        match self {
            GatewayResult::Accepted { response, .. } => Some(response),
            GatewayResult::Rejected { .. } => None,
        }
    }

    pub fn errors(&self) -> &[String] {
        match self {
            GatewayResult::Accepted { errors, .. } | GatewayResult::Rejected { errors } => errors,
        }
    }

    pub fn into_response(self) -> Option<T> {
        match self {
            GatewayResult::Accepted { response, .. } => Some(response),
            GatewayResult::Rejected { .. } => None,
        }
    }
}

impl<T: Decision> GatewayResult<T> {
    /// True only when the gateway accepted the request and approved the
    /// transaction.
    pub fn completed(&self) -> bool {
        self.response().is_some_and(|r| r.approved())
    }
}

/// Payloads that carry the gateway's approve/decline decision.
pub trait Decision {
    fn approved(&self) -> bool;
}

/// A purchase as reported by the gateway, for both card and token purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub id: String,
    pub successful: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub card_holder: Option<String>,
    /// Masked by the gateway.
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub card_expiry: Option<String>,
    #[serde(default)]
    pub card_token: Option<String>,
}

impl Decision for PurchaseResponse {
    fn approved(&self) -> bool {
        self.successful
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundResponse {
    pub id: String,
    pub successful: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Id of the purchase this refund was issued against.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl Decision for RefundResponse {
    fn approved(&self) -> bool {
        self.successful
    }
}

/// A stored card. `card_number` is masked: all but the last four digits are
/// `X`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizeResponse {
    pub token: String,
    pub card_holder: String,
    pub card_number: String,
    #[serde(default)]
    pub card_expiry: Option<String>,
}

/// Raw response envelope. The payload stays untyped until the envelope says
/// it is meaningful; rejected calls may carry a partial or empty object.
#[derive(Debug, Deserialize)]
struct Envelope {
    successful: bool,
    #[serde(default)]
    response: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Decode an envelope body into a `GatewayResult`. Returns `None` when the
/// body is not an envelope at all so the caller can fall back to the status
/// code.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &str,
) -> Option<Result<GatewayResult<T>, ApiError>> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    Some(into_result(status, envelope))
}

fn into_result<T: DeserializeOwned>(
    status: u16,
    envelope: Envelope,
) -> Result<GatewayResult<T>, ApiError> {
    let Envelope {
        successful,
        response,
        mut errors,
    } = envelope;

    if !successful {
        if errors.is_empty() {
            errors.push(format!("Gateway returned HTTP {status} without error details"));
        }
        return Ok(GatewayResult::Rejected { errors });
    }

    let payload = match response {
        Some(serde_json::Value::Null) | None => {
            return Err(ApiError::Deserialization(
                "successful envelope has no response payload".to_string(),
            ))
        }
        Some(payload) => payload,
    };
    let response =
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    Ok(GatewayResult::Accepted { response, errors })
}
