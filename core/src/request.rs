//! Typed request payloads for the gateway's write operations.
//!
//! Each request validates what can be checked locally (positive amount,
//! non-empty reference, well-formed expiry) at construction and is immutable
//! afterwards. Failures use the gateway's own wording so `Gateway` can report
//! them as rejections. Card validity is left to the gateway so that an
//! invalid card still produces a gateway verdict.

use std::net::IpAddr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;
use crate::types::{Amount, CardExpiry, CardNumber, Cvv};

const AMOUNT_REQUIRED: &str = "Amount is required";
const REFERENCE_REQUIRED: &str = "Reference is required";
const EXPIRY_INVALID: &str = "Card expiry is invalid";

fn require_amount(amount: Decimal) -> Result<Amount, ApiError> {
    Amount::from_decimal(amount).map_err(|_| ApiError::InvalidRequest(AMOUNT_REQUIRED.to_string()))
}

fn require_reference(reference: impl Into<String>) -> Result<String, ApiError> {
    let reference = reference.into();
    if reference.trim().is_empty() {
        return Err(ApiError::InvalidRequest(REFERENCE_REQUIRED.to_string()));
    }
    Ok(reference)
}

fn require_expiry(expiry: &str) -> Result<CardExpiry, ApiError> {
    expiry
        .parse()
        .map_err(|_| ApiError::InvalidRequest(EXPIRY_INVALID.to_string()))
}

/// A card-present purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRequest {
    amount: Amount,
    reference: String,
    card_holder: String,
    card_number: CardNumber,
    card_expiry: CardExpiry,
    cvv: Cvv,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_ip: Option<IpAddr>,
}

impl PurchaseRequest {
    /// `card_expiry` is `MM/YYYY`; `cvv` may be a string or an integer.
    pub fn new(
        amount: Decimal,
        reference: impl Into<String>,
        card_holder: impl Into<String>,
        card_number: impl Into<CardNumber>,
        card_expiry: &str,
        cvv: impl Into<Cvv>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            amount: require_amount(amount)?,
            reference: require_reference(reference)?,
            card_holder: card_holder.into(),
            card_number: card_number.into(),
            card_expiry: require_expiry(card_expiry)?,
            cvv: cvv.into(),
            customer_ip: None,
        })
    }

    pub fn with_customer_ip(mut self, ip: IpAddr) -> Self {
        self.customer_ip = Some(ip);
        self
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn card_holder(&self) -> &str {
        &self.card_holder
    }

    pub fn card_number(&self) -> &CardNumber {
        &self.card_number
    }

    pub fn card_expiry(&self) -> CardExpiry {
        self.card_expiry
    }

    pub fn customer_ip(&self) -> Option<IpAddr> {
        self.customer_ip
    }
}

/// A purchase charged against a previously tokenized card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPurchaseRequest {
    card_token: String,
    amount: Amount,
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cvv: Option<Cvv>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_ip: Option<IpAddr>,
}

impl TokenPurchaseRequest {
    pub fn new(
        card_token: impl Into<String>,
        amount: Decimal,
        reference: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            card_token: card_token.into(),
            amount: require_amount(amount)?,
            reference: require_reference(reference)?,
            cvv: None,
            customer_ip: None,
        })
    }

    pub fn with_cvv(mut self, cvv: impl Into<Cvv>) -> Self {
        self.cvv = Some(cvv.into());
        self
    }

    pub fn with_customer_ip(mut self, ip: IpAddr) -> Self {
        self.customer_ip = Some(ip);
        self
    }

    pub fn card_token(&self) -> &str {
        &self.card_token
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn has_cvv(&self) -> bool {
        self.cvv.is_some()
    }
}

/// A refund against an earlier purchase. `transaction_id` is the purchase id
/// returned by the gateway; whether it exists is for the gateway to decide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    transaction_id: String,
    amount: Amount,
    reference: String,
}

impl RefundRequest {
    pub fn new(
        transaction_id: impl Into<String>,
        amount: Decimal,
        reference: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            transaction_id: transaction_id.into(),
            amount: require_amount(amount)?,
            reference: require_reference(reference)?,
        })
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Card details to store at the gateway in exchange for a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenizeRequest {
    card_holder: String,
    card_number: CardNumber,
    card_expiry: CardExpiry,
    cvv: Cvv,
}

impl TokenizeRequest {
    pub fn new(
        card_holder: impl Into<String>,
        card_number: impl Into<CardNumber>,
        card_expiry: &str,
        cvv: impl Into<Cvv>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            card_holder: card_holder.into(),
            card_number: card_number.into(),
            card_expiry: require_expiry(card_expiry)?,
            cvv: cvv.into(),
        })
    }

    pub fn card_holder(&self) -> &str {
        &self.card_holder
    }

    pub fn card_number(&self) -> &CardNumber {
        &self.card_number
    }

    pub fn card_expiry(&self) -> CardExpiry {
        self.card_expiry
    }
}
