use std::collections::HashMap;

use serde::Deserialize;

use credit_ledger_application::contracts::payments::CheckoutSessionDetails;
use credit_ledger_application::error::AppResult;
use domain::purchase::PurchaseId;

pub const PAYMENT_STATUS_PAID: &str = "paid";

/// Subset of the provider's checkout session object this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeCheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some(PAYMENT_STATUS_PAID)
    }

    pub fn into_details(self) -> AppResult<CheckoutSessionDetails> {
        let paid = self.is_paid();
        Ok(CheckoutSessionDetails {
            session_id: PurchaseId::parse(&self.id)?,
            paid,
            metadata: self.metadata,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
