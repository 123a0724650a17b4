//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences. Expected response objects
//! list only the fields a case cares about.

use fatzebra_core::{
    ApiError, GatewayClient, GatewayConfig, GatewayResult, HttpMethod, HttpRequest, HttpResponse, PurchaseRequest,
    RefundRequest, TokenPurchaseRequest, TokenizeRequest,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> GatewayClient {
    GatewayClient::new(&GatewayConfig::new("TEST", "TEST").with_base_url(BASE_URL))
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_else(|| panic!("missing string field {key}"))
}

fn amount(input: &Value) -> Decimal {
    text(input, "amount").parse().unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(text(expected, "method")), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", text(expected, "path")), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: text(sim, "body").to_string(),
    }
}

fn check_result<T: Serialize>(name: &str, result: Result<GatewayResult<T>, ApiError>, case: &Value) {
    if let Some(expected_error) = case.get("expected_error") {
        let err = result.err().unwrap_or_else(|| panic!("{name}: expected an error"));
        match expected_error.as_str().unwrap() {
            "Unauthorized" => assert!(matches!(err, ApiError::Unauthorized), "{name}: expected Unauthorized"),
            "HttpError" => assert!(matches!(err, ApiError::HttpError { .. }), "{name}: expected HttpError"),
            other => panic!("{name}: unknown expected_error: {other}"),
        }
        return;
    }

    let result = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
    let expected = &case["expected_result"];
    assert_eq!(Value::Bool(result.successful()), expected["successful"], "{name}: successful");

    let expected_errors: Vec<&str> = expected["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(result.errors(), expected_errors.as_slice(), "{name}: errors");

    match (result.response(), expected["response"].as_object()) {
        (None, None) => {}
        (Some(response), Some(fields)) => {
            let actual = serde_json::to_value(response).unwrap();
            for (key, value) in fields {
                assert_eq!(&actual[key], value, "{name}: response.{key}");
            }
        }
        (actual, _) => panic!("{name}: response presence mismatch, got some = {}", actual.is_some()),
    }
}

// ---------------------------------------------------------------------------
// Purchase
// ---------------------------------------------------------------------------

#[test]
fn purchase_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/purchase.json")) {
        let name = text(&case, "name");
        let input = &case["input"];
        let request = PurchaseRequest::new(
            amount(input),
            text(input, "reference"),
            text(input, "card_holder"),
            text(input, "card_number"),
            text(input, "card_expiry"),
            text(input, "cvv"),
        )
        .unwrap();

        let req = c.build_purchase(&request).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_purchase(simulated(&case)), &case);
    }
}

// ---------------------------------------------------------------------------
// Get purchase
// ---------------------------------------------------------------------------

#[test]
fn get_purchase_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/get_purchase.json")) {
        let name = text(&case, "name");

        let req = c.build_get_purchase(text(&case, "input_id"));
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_get_purchase(simulated(&case)), &case);
    }
}

// ---------------------------------------------------------------------------
// Refund
// ---------------------------------------------------------------------------

#[test]
fn refund_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/refund.json")) {
        let name = text(&case, "name");
        let input = &case["input"];
        let request =
            RefundRequest::new(text(input, "transaction_id"), amount(input), text(input, "reference")).unwrap();

        let req = c.build_refund(&request).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_refund(simulated(&case)), &case);
    }
}

// ---------------------------------------------------------------------------
// Get refund
// ---------------------------------------------------------------------------

#[test]
fn get_refund_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/get_refund.json")) {
        let name = text(&case, "name");

        let req = c.build_get_refund(text(&case, "input_id"));
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_get_refund(simulated(&case)), &case);
    }
}

// ---------------------------------------------------------------------------
// Tokenize
// ---------------------------------------------------------------------------

#[test]
fn tokenize_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/tokenize.json")) {
        let name = text(&case, "name");
        let input = &case["input"];
        let request = TokenizeRequest::new(
            text(input, "card_holder"),
            text(input, "card_number"),
            text(input, "card_expiry"),
            text(input, "cvv"),
        )
        .unwrap();

        let req = c.build_tokenize(&request).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_tokenize(simulated(&case)), &case);
    }
}

// ---------------------------------------------------------------------------
// Token purchase
// ---------------------------------------------------------------------------

#[test]
fn token_purchase_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/token_purchase.json")) {
        let name = text(&case, "name");
        let input = &case["input"];
        let mut request =
            TokenPurchaseRequest::new(text(input, "card_token"), amount(input), text(input, "reference")).unwrap();
        if let Some(cvv) = input["cvv"].as_str() {
            request = request.with_cvv(cvv);
        }

        let req = c.build_token_purchase(&request).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_result(name, c.parse_purchase(simulated(&case)), &case);
    }
}
