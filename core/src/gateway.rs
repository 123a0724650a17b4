//! Blocking gateway client that performs the HTTP round-trip with `ureq`.
//!
//! Every operation is one `build_*` call, one request, one `parse_*` call.
//! Nothing is retried. Input the gateway would refuse anyway (non-positive
//! amount, blank reference, malformed expiry, blank lookup id) is answered
//! locally with a `Rejected` result in the gateway's wording, and no request
//! is sent.

use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::client::GatewayClient;
use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{PurchaseRequest, RefundRequest, TokenPurchaseRequest, TokenizeRequest};
use crate::response::{GatewayResult, PurchaseResponse, RefundResponse, TokenizeResponse};
use crate::types::{CardNumber, Cvv};

const PURCHASE_NOT_FOUND: &str = "Could not find Purchase";
const REFUND_NOT_FOUND: &str = "Could not find Refund";

/// Configured connection to the gateway. Cheap to clone and safe to share
/// between threads; it holds no per-call state.
#[derive(Clone)]
pub struct Gateway {
    client: GatewayClient,
    agent: ureq::Agent,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            client: GatewayClient::new(config),
            agent,
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(&GatewayConfig::from_env()?))
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn purchase(&self, request: &PurchaseRequest) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        let req = self.client.build_purchase(request)?;
        let result = self.client.parse_purchase(self.execute(req)?)?;
        log_rejection("purchase", &result);
        Ok(result)
    }

    pub fn get_purchase(&self, id: &str) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        if id.trim().is_empty() {
            return Ok(rejected_locally("get_purchase", PURCHASE_NOT_FOUND));
        }
        let req = self.client.build_get_purchase(id);
        let result = self.client.parse_get_purchase(self.execute(req)?)?;
        log_rejection("get_purchase", &result);
        Ok(result)
    }

    /// Refund part or all of the purchase `purchase_id`.
    pub fn refund(
        &self,
        purchase_id: &str,
        amount: Decimal,
        reference: &str,
    ) -> Result<GatewayResult<RefundResponse>, ApiError> {
        let request = match RefundRequest::new(purchase_id, amount, reference) {
            Ok(request) => request,
            Err(err) => return invalid_input("refund", err),
        };
        let req = self.client.build_refund(&request)?;
        let result = self.client.parse_refund(self.execute(req)?)?;
        log_rejection("refund", &result);
        Ok(result)
    }

    pub fn get_refund(&self, id: &str) -> Result<GatewayResult<RefundResponse>, ApiError> {
        if id.trim().is_empty() {
            return Ok(rejected_locally("get_refund", REFUND_NOT_FOUND));
        }
        let req = self.client.build_get_refund(id);
        let result = self.client.parse_get_refund(self.execute(req)?)?;
        log_rejection("get_refund", &result);
        Ok(result)
    }

    /// Store a card at the gateway. `card_expiry` is `MM/YYYY`.
    pub fn tokenize(
        &self,
        card_holder: &str,
        card_number: impl Into<CardNumber>,
        card_expiry: &str,
        cvv: impl Into<Cvv>,
    ) -> Result<GatewayResult<TokenizeResponse>, ApiError> {
        let request = match TokenizeRequest::new(card_holder, card_number, card_expiry, cvv) {
            Ok(request) => request,
            Err(err) => return invalid_input("tokenize", err),
        };
        let req = self.client.build_tokenize(&request)?;
        let result = self.client.parse_tokenize(self.execute(req)?)?;
        log_rejection("tokenize", &result);
        Ok(result)
    }

    /// Charge a tokenized card. The CVV may be omitted.
    pub fn token_purchase(
        &self,
        token: &str,
        amount: Decimal,
        reference: &str,
        cvv: Option<Cvv>,
    ) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        let mut request = match TokenPurchaseRequest::new(token, amount, reference) {
            Ok(request) => request,
            Err(err) => return invalid_input("token_purchase", err),
        };
        if let Some(cvv) = cvv {
            request = request.with_cvv(cvv);
        }
        self.submit_token_purchase(&request)
    }

    /// Same as `token_purchase`, for callers that already built the request
    /// (for example to attach a customer IP).
    pub fn submit_token_purchase(
        &self,
        request: &TokenPurchaseRequest,
    ) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        let req = self.client.build_token_purchase(request)?;
        let result = self.client.parse_purchase(self.execute(req)?)?;
        log_rejection("token_purchase", &result);
        Ok(result)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;
        debug!(%method, url = %path, "sending gateway request");

        let sent = match method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = sent.map_err(|e| transport_error(&path, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(&path, e))?;
        debug!(status, url = %path, "gateway responded");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

fn transport_error(url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(timeout) => {
            warn!(url, ?timeout, "gateway request timed out");
            ApiError::Timeout
        }
        other => {
            warn!(url, error = %other, "gateway request failed");
            ApiError::Transport(other.to_string())
        }
    }
}

fn rejected_locally<T>(operation: &str, message: &str) -> GatewayResult<T> {
    debug!(operation, message, "request rejected before sending");
    GatewayResult::Rejected {
        errors: vec![message.to_string()],
    }
}

/// Report a request that failed local validation the way the gateway would.
fn invalid_input<T>(operation: &str, err: ApiError) -> Result<GatewayResult<T>, ApiError> {
    match err {
        ApiError::InvalidRequest(message) => Ok(rejected_locally(operation, &message)),
        other => Err(other),
    }
}

fn log_rejection<T>(operation: &str, result: &GatewayResult<T>) {
    if let GatewayResult::Rejected { errors } = result {
        debug!(operation, ?errors, "gateway rejected request");
    }
}
