//! Blocking client for the Fat Zebra payment gateway.
//!
//! # Overview
//! Purchases, refunds, card tokenization and lookups against a configurable
//! gateway URL (sandbox or production). `GatewayClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! `Gateway` wraps it with a `ureq` agent and performs the round-trip.
//!
//! # Design
//! - Results keep two levels of success apart. `GatewayResult::Accepted`
//!   means the gateway took the request; the payload's `successful` flag says
//!   whether the transaction was approved. Declines, invalid cards and unknown
//!   ids are gateway answers, not `Err`. `Gateway` reports input it can
//!   refuse locally (bad amount, blank reference, malformed expiry) the same
//!   way, with the gateway's message.
//! - `ApiError` is reserved for configuration, transport and decoding
//!   failures, and for the request constructors' validation.
//! - Amounts are `rust_decimal::Decimal` at the API surface and integer cents
//!   on the wire.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod request;
pub mod response;
pub mod types;

pub use client::GatewayClient;
pub use config::{GatewayConfig, PRODUCTION_URL, SANDBOX_URL};
pub use error::ApiError;
pub use gateway::Gateway;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{PurchaseRequest, RefundRequest, TokenPurchaseRequest, TokenizeRequest};
pub use response::{Decision, GatewayResult, PurchaseResponse, RefundResponse, TokenizeResponse};
pub use types::{Amount, CardExpiry, CardNumber, Cvv};
