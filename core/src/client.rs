//! Stateless HTTP request builder and response parser for the gateway API.
//!
//! # Design
//! `GatewayClient` holds only the base URL, the precomputed `Authorization`
//! header and the sandbox flag. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The caller executes the actual HTTP round-trip, keeping
//! this layer deterministic and free of I/O.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{PurchaseRequest, RefundRequest, TokenPurchaseRequest, TokenizeRequest};
use crate::response::{decode_envelope, GatewayResult, PurchaseResponse, RefundResponse, TokenizeResponse};

const API_VERSION: &str = "v1.0";

/// Write payload plus the `test` flag the gateway expects on every write.
#[derive(Serialize)]
struct WithTestFlag<'a, T: Serialize> {
    #[serde(flatten)]
    payload: &'a T,
    test: bool,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    authorization: String,
    sandbox: bool,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let credentials = BASE64_STANDARD.encode(format!("{}:{}", config.username, config.token));
        Self {
            base_url: config.base_url().to_string(),
            authorization: format!("Basic {credentials}"),
            sandbox: config.sandbox,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_purchase(&self, request: &PurchaseRequest) -> Result<HttpRequest, ApiError> {
        self.post("purchases", request)
    }

    pub fn build_token_purchase(&self, request: &TokenPurchaseRequest) -> Result<HttpRequest, ApiError> {
        self.post("purchases", request)
    }

    pub fn build_get_purchase(&self, id: &str) -> HttpRequest {
        self.get("purchases", id)
    }

    pub fn build_refund(&self, request: &RefundRequest) -> Result<HttpRequest, ApiError> {
        self.post("refunds", request)
    }

    pub fn build_get_refund(&self, id: &str) -> HttpRequest {
        self.get("refunds", id)
    }

    pub fn build_tokenize(&self, request: &TokenizeRequest) -> Result<HttpRequest, ApiError> {
        self.post("credit_cards", request)
    }

    /// Parses card and token purchases alike.
    pub fn parse_purchase(&self, response: HttpResponse) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_get_purchase(&self, response: HttpResponse) -> Result<GatewayResult<PurchaseResponse>, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_refund(&self, response: HttpResponse) -> Result<GatewayResult<RefundResponse>, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_get_refund(&self, response: HttpResponse) -> Result<GatewayResult<RefundResponse>, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_tokenize(&self, response: HttpResponse) -> Result<GatewayResult<TokenizeResponse>, ApiError> {
        parse_envelope(response)
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{API_VERSION}/{resource}", self.base_url)
    }

    fn get(&self, resource: &str, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/{}", self.url(resource), encode_path_segment(id)),
            headers: self.headers(false),
            body: None,
        }
    }

    fn post<T: Serialize>(&self, resource: &str, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&WithTestFlag {
            payload,
            test: self.sandbox,
        })
        .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url(resource),
            headers: self.headers(true),
            body: Some(body),
        })
    }

    fn headers(&self, with_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![
            ("authorization".to_string(), self.authorization.clone()),
            ("accept".to_string(), "application/json".to_string()),
        ];
        if with_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers
    }
}

/// Interpret a gateway reply. Envelope bodies are honoured whatever the
/// status; anything else is mapped from the status code.
fn parse_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<GatewayResult<T>, ApiError> {
    if let Some(result) = decode_envelope(response.status, &response.body) {
        return result;
    }
    match response.status {
        401 => Err(ApiError::Unauthorized),
        status if !response.is_success() => Err(ApiError::HttpError {
            status,
            body: response.body,
        }),
        _ => Err(ApiError::Deserialization(format!(
            "response body is not a gateway envelope: {}",
            response.body
        ))),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client() -> GatewayClient {
        GatewayClient::new(&GatewayConfig::new("TEST", "TEST").with_base_url("http://localhost:3000"))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn body_of(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_purchase_produces_correct_request() {
        let input = PurchaseRequest::new(dec!(100.00), "UNITTEST1", "Jim Smith", "5123456789012346", "05/2013", 123u16)
            .unwrap();
        let req = client().build_purchase(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/v1.0/purchases");
        assert_eq!(req.header("Authorization"), Some("Basic VEVTVDpURVNU"));
        assert_eq!(req.header("content-type"), Some("application/json"));

        let body = body_of(&req);
        assert_eq!(body["amount"], 10000);
        assert_eq!(body["reference"], "UNITTEST1");
        assert_eq!(body["card_number"], "5123456789012346");
        assert_eq!(body["card_expiry"], "05/2013");
        assert_eq!(body["cvv"], "123");
        assert_eq!(body["test"], true);
    }

    #[test]
    fn production_client_sends_test_false() {
        let config = GatewayConfig::new("TEST", "TEST").with_sandbox(false);
        let client = GatewayClient::new(&config);
        assert!(client.base_url().starts_with("https://gateway.fatzebra.com.au"));
        let input = RefundRequest::new("071-P-1", dec!(1), "R").unwrap();
        let body = body_of(&client.build_refund(&input).unwrap());
        assert_eq!(body["test"], false);
    }

    #[test]
    fn build_token_purchase_targets_purchases() {
        let input = TokenPurchaseRequest::new("a1b2c3", dec!(100.00), "REF").unwrap();
        let req = client().build_token_purchase(&input).unwrap();
        assert_eq!(req.path, "http://localhost:3000/v1.0/purchases");
        let body = body_of(&req);
        assert_eq!(body["card_token"], "a1b2c3");
        assert!(body.get("cvv").is_none());
        assert!(body.get("card_number").is_none());
    }

    #[test]
    fn build_get_purchase_has_no_body() {
        let req = client().build_get_purchase("071-P-ABC");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/v1.0/purchases/071-P-ABC");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
        assert!(req.header("authorization").is_some());
    }

    #[test]
    fn build_get_encodes_id() {
        let req = client().build_get_refund("a/b c");
        assert_eq!(req.path, "http://localhost:3000/v1.0/refunds/a%2Fb%20c");
    }

    #[test]
    fn build_tokenize_targets_credit_cards() {
        let input = TokenizeRequest::new("Billy Blanks", "5123456789012346", "05/2013", "123").unwrap();
        let req = client().build_tokenize(&input).unwrap();
        assert_eq!(req.path, "http://localhost:3000/v1.0/credit_cards");
        assert_eq!(body_of(&req)["card_holder"], "Billy Blanks");
    }

    #[test]
    fn debug_does_not_print_body() {
        let input = TokenizeRequest::new("Billy Blanks", "5123456789012346", "05/2013", "123").unwrap();
        let req = client().build_tokenize(&input).unwrap();
        let out = format!("{req:?}");
        assert!(!out.contains("5123456789012346"));
        assert!(!out.contains("VEVTVDpURVNU"));
    }

    #[test]
    fn parse_purchase_approved() {
        let body = r#"{"successful":true,"response":{"id":"071-P-1","successful":true,"message":"Approved"},"errors":[]}"#;
        let result = client().parse_purchase(response(200, body)).unwrap();
        assert!(result.successful());
        assert_eq!(result.response().unwrap().message, "Approved");
    }

    #[test]
    fn parse_purchase_declined_is_still_successful() {
        let body = r#"{"successful":true,"response":{"id":"071-P-2","successful":false,"message":"Declined, check with issuer"},"errors":[]}"#;
        let result = client().parse_purchase(response(200, body)).unwrap();
        assert!(result.successful());
        assert!(!result.response().unwrap().successful);
        assert!(!result.completed());
    }

    #[test]
    fn parse_rejection_on_error_status() {
        let body = r#"{"successful":false,"response":null,"errors":["Could not find Purchase"]}"#;
        let result = client().parse_get_purchase(response(404, body)).unwrap();
        assert!(!result.successful());
        assert_eq!(result.errors()[0], "Could not find Purchase");
    }

    #[test]
    fn parse_unauthorized_without_envelope() {
        let err = client().parse_refund(response(401, "HTTP Basic: Access denied.")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn parse_server_error_without_envelope() {
        let err = client().parse_get_refund(response(502, "bad gateway")).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
    }

    #[test]
    fn parse_bad_json_on_success_status() {
        let err = client().parse_tokenize(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_tokenize_success() {
        let body = r#"{"successful":true,"response":{"token":"abc1234567","card_holder":"Billy Blanks","card_number":"XXXXXXXXXXXX2346","card_expiry":"05/2013"},"errors":[]}"#;
        let result = client().parse_tokenize(response(200, body)).unwrap();
        let card = result.response().unwrap();
        assert_eq!(card.token, "abc1234567");
        assert_eq!(card.card_number, "XXXXXXXXXXXX2346");
    }
}
