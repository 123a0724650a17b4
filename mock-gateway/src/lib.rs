//! In-memory emulator of the gateway sandbox.
//!
//! Reproduces the sandbox conventions the client tests rely on: Luhn card
//! validation, declines for amounts ending in 99 cents, purchase/refund
//! lookups, card tokenization and HTTP Basic authentication. Every reply is a
//! `{ successful, response, errors, test }` envelope; `test` echoes the flag
//! the write was sent with, and lookups report the flag the record was
//! created with.

pub mod card;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DECLINE_MESSAGE: &str = "Declined, check with issuer";
pub const APPROVED_MESSAGE: &str = "Approved";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub successful: bool,
    pub response: Option<serde_json::Value>,
    pub errors: Vec<String>,
    pub test: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub successful: bool,
    pub message: String,
    pub authorization: Option<String>,
    pub amount: i64,
    pub reference: String,
    pub card_holder: String,
    pub card_number: String,
    pub card_expiry: String,
    pub card_token: Option<String>,
    #[serde(skip)]
    pub test: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub successful: bool,
    pub message: String,
    pub authorization: Option<String>,
    pub amount: i64,
    pub reference: String,
    pub transaction_id: String,
    #[serde(skip)]
    pub test: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditCard {
    pub token: String,
    pub card_holder: String,
    pub card_number: String,
    pub card_expiry: String,
}

/// Body of `POST /v1.0/purchases`. Either the card fields or `card_token`
/// identify the card.
#[derive(Debug, Deserialize)]
pub struct PurchaseInput {
    pub amount: Option<i64>,
    pub reference: Option<String>,
    pub card_holder: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub card_token: Option<String>,
    #[serde(default)]
    pub test: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefundInput {
    pub transaction_id: Option<String>,
    pub amount: Option<i64>,
    pub reference: Option<String>,
    #[serde(default)]
    pub test: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreditCardInput {
    pub card_holder: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    #[serde(default)]
    pub test: bool,
}

/// Merchant credentials the sandbox accepts.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "TEST".to_string(),
            token: "TEST".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    purchases: HashMap<String, Purchase>,
    refunds: HashMap<String, Refund>,
    cards: HashMap<String, CreditCard>,
    references: HashSet<String>,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    credentials: Arc<Credentials>,
}

pub type Reply = (StatusCode, Json<Envelope>);

pub fn app() -> Router {
    app_with_credentials(Credentials::default())
}

pub fn app_with_credentials(credentials: Credentials) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::default())),
        credentials: Arc::new(credentials),
    };
    Router::new()
        .route("/v1.0/purchases", post(create_purchase))
        .route("/v1.0/purchases/{id}", get(get_purchase))
        .route("/v1.0/refunds", post(create_refund))
        .route("/v1.0/refunds/{id}", get(get_refund))
        .route("/v1.0/credit_cards", post(create_credit_card))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn accepted(response: impl Serialize, test: bool) -> Reply {
    match serde_json::to_value(response) {
        Ok(response) => (
            StatusCode::OK,
            Json(Envelope {
                successful: true,
                response: Some(response),
                errors: Vec::new(),
                test,
            }),
        ),
        Err(err) => {
            warn!(%err, "failed to encode response payload");
            rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                vec!["Internal server error".to_string()],
                test,
            )
        }
    }
}

fn rejected(status: StatusCode, errors: Vec<String>, test: bool) -> Reply {
    (
        status,
        Json(Envelope {
            successful: false,
            response: None,
            errors,
            test,
        }),
    )
}

async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_authorized(&state.credentials, request.headers()) {
        return next.run(request).await;
    }
    debug!("rejecting request with bad credentials");
    rejected(StatusCode::UNAUTHORIZED, vec!["Access denied".to_string()], false).into_response()
}

fn is_authorized(credentials: &Credentials, headers: &HeaderMap) -> bool {
    let Some(encoded) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    decoded.split_once(':') == Some((credentials.username.as_str(), credentials.token.as_str()))
}

fn transaction_id(kind: char) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase();
    format!("071-{kind}-{suffix}")
}

fn authorization_code() -> String {
    format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000)
}

fn card_token() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate raw card fields, pushing one message per problem.
fn check_card(
    holder: Option<String>,
    number: Option<String>,
    expiry: Option<String>,
    errors: &mut Vec<String>,
) -> Option<(String, String, String)> {
    let holder = required(holder);
    if holder.is_none() {
        errors.push("Card holder is required".to_string());
    }
    let number = number.filter(|n| card::is_valid_number(n));
    if number.is_none() {
        errors.push("Card number is invalid".to_string());
    }
    let expiry = expiry.filter(|e| card::is_valid_expiry(e));
    if expiry.is_none() {
        errors.push("Card expiry is invalid".to_string());
    }
    Some((holder?, number?, expiry?))
}

impl Store {
    pub fn purchase(&mut self, input: PurchaseInput) -> Reply {
        let test = input.test;
        let mut errors = Vec::new();

        let card = match input.card_token {
            Some(token) => match self.cards.get(&token) {
                Some(card) => Some(card.clone()),
                None => {
                    errors.push(format!("Card {token} could not be found"));
                    None
                }
            },
            None => check_card(input.card_holder, input.card_number, input.card_expiry, &mut errors).map(
                |(card_holder, number, card_expiry)| CreditCard {
                    token: String::new(),
                    card_holder,
                    card_number: card::mask(&number),
                    card_expiry,
                },
            ),
        };

        let amount = input.amount.filter(|a| *a > 0);
        if amount.is_none() {
            errors.push("Amount is required".to_string());
        }

        let reference = required(input.reference);
        match &reference {
            None => errors.push("Reference is required".to_string()),
            Some(r) if self.references.contains(r) => {
                errors.push("Reference has already been taken".to_string())
            }
            Some(_) => {}
        }

        let (Some(card), Some(amount), Some(reference), true) = (card, amount, reference, errors.is_empty()) else {
            debug!(?errors, "purchase rejected");
            return rejected(StatusCode::UNPROCESSABLE_ENTITY, errors, test);
        };

        let approved = amount % 100 != 99;
        let purchase = Purchase {
            id: transaction_id('P'),
            successful: approved,
            message: if approved { APPROVED_MESSAGE } else { DECLINE_MESSAGE }.to_string(),
            authorization: approved.then(authorization_code),
            amount,
            reference,
            card_holder: card.card_holder,
            card_number: card.card_number,
            card_expiry: card.card_expiry,
            card_token: Some(card.token).filter(|t| !t.is_empty()),
            test,
        };
        info!(id = %purchase.id, amount, approved, "purchase recorded");
        self.references.insert(purchase.reference.clone());
        self.purchases.insert(purchase.id.clone(), purchase.clone());
        accepted(purchase, test)
    }

    pub fn refund(&mut self, input: RefundInput) -> Reply {
        let test = input.test;
        let mut errors = Vec::new();

        let original = input
            .transaction_id
            .and_then(|id| self.purchases.get(&id))
            .filter(|p| p.successful);
        if original.is_none() {
            errors.push("Original transaction is required".to_string());
        }

        let amount = input.amount.filter(|a| *a > 0);
        if amount.is_none() {
            errors.push("Amount is required".to_string());
        }

        let reference = required(input.reference);
        if reference.is_none() {
            errors.push("Reference is required".to_string());
        }

        if let (Some(original), Some(amount)) = (original, amount) {
            let refunded: i64 = self
                .refunds
                .values()
                .filter(|r| r.transaction_id == original.id)
                .map(|r| r.amount)
                .sum();
            if amount > original.amount - refunded {
                errors.push("Refund amount exceeds the original transaction amount".to_string());
            }
        }

        let (Some(original), Some(amount), Some(reference), true) = (original, amount, reference, errors.is_empty())
        else {
            debug!(?errors, "refund rejected");
            return rejected(StatusCode::UNPROCESSABLE_ENTITY, errors, test);
        };

        let refund = Refund {
            id: transaction_id('R'),
            successful: true,
            message: APPROVED_MESSAGE.to_string(),
            authorization: Some(authorization_code()),
            amount,
            reference,
            transaction_id: original.id.clone(),
            test,
        };
        info!(id = %refund.id, purchase = %refund.transaction_id, amount, "refund recorded");
        self.refunds.insert(refund.id.clone(), refund.clone());
        accepted(refund, test)
    }

    pub fn tokenize(&mut self, input: CreditCardInput) -> Reply {
        let test = input.test;
        let mut errors = Vec::new();
        let Some((card_holder, number, card_expiry)) =
            check_card(input.card_holder, input.card_number, input.card_expiry, &mut errors)
        else {
            debug!(?errors, "tokenization rejected");
            return rejected(StatusCode::UNPROCESSABLE_ENTITY, errors, test);
        };

        let card = CreditCard {
            token: card_token(),
            card_holder,
            card_number: card::mask(&number),
            card_expiry,
        };
        info!(token = %card.token, "card tokenized");
        self.cards.insert(card.token.clone(), card.clone());
        accepted(card, test)
    }

    pub fn find_purchase(&self, id: &str) -> Reply {
        match self.purchases.get(id) {
            Some(purchase) => accepted(purchase, purchase.test),
            None => rejected(StatusCode::NOT_FOUND, vec!["Could not find Purchase".to_string()], false),
        }
    }

    pub fn find_refund(&self, id: &str) -> Reply {
        match self.refunds.get(id) {
            Some(refund) => accepted(refund, refund.test),
            None => rejected(StatusCode::NOT_FOUND, vec!["Could not find Refund".to_string()], false),
        }
    }
}

async fn create_purchase(State(state): State<AppState>, Json(input): Json<PurchaseInput>) -> Reply {
    state.store.write().await.purchase(input)
}

async fn get_purchase(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    state.store.read().await.find_purchase(&id)
}

async fn create_refund(State(state): State<AppState>, Json(input): Json<RefundInput>) -> Reply {
    state.store.write().await.refund(input)
}

async fn get_refund(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    state.store.read().await.find_refund(&id)
}

async fn create_credit_card(State(state): State<AppState>, Json(input): Json<CreditCardInput>) -> Reply {
    state.store.write().await.tokenize(input)
}
