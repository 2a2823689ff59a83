use serde::Serialize;
#[cfg(feature = "docs")]
use utoipa::ToSchema;

use credit_ledger_application::contracts::{
    generation::GenerationResult,
    payments::{CheckoutSession, ConfirmationReceipt, WebhookOutcome},
};
use domain::credits::CreditAccount;
use domain::package::CreditPackage;

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Standard API response wrapper with success indicator, optional error message, and optional data payload",
    example = json!({
        "ok": true,
        "data": {
            "creditBalance": 42,
            "lifetimeUsed": 8,
            "planTag": "basic"
        }
    })
))]
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
            data: None,
        }
    }

    #[must_use]
    pub fn success_with_data(data: Option<T>) -> Self {
        Self {
            ok: true,
            error: None,
            data,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({ "creditBalance": 42, "lifetimeUsed": 8, "planTag": "basic" })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub credit_balance: i64,
    pub lifetime_used: i64,
    pub plan_tag: Option<String>,
}

impl From<&CreditAccount> for CreditsResponse {
    fn from(account: &CreditAccount) -> Self {
        Self {
            credit_balance: account.credit_balance,
            lifetime_used: account.lifetime_used,
            plan_tag: account.plan_tag.as_ref().map(ToString::to_string),
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({ "id": "pro", "name": "Pro", "credits": 500, "priceMinorUnits": 3999 })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub id: String,
    pub name: String,
    pub credits: i64,
    pub price_minor_units: i64,
}

impl From<&CreditPackage> for PackageResponse {
    fn from(package: &CreditPackage) -> Self {
        Self {
            id: package.id.to_string(),
            name: package.name.clone(),
            credits: package.credits,
            price_minor_units: package.price_minor_units,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({ "sessionId": "cs_test_a1B2c3", "url": "https://checkout.stripe.com/c/pay/cs_test_a1B2c3" })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

impl From<CheckoutSession> for CheckoutSessionResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            url: session.redirect_url,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({
        "creditBalance": 110,
        "planTag": "basic",
        "applied": true,
        "message": "Credits added successfully"
    })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    pub credit_balance: i64,
    pub plan_tag: Option<String>,
    pub applied: bool,
    pub message: String,
}

impl From<ConfirmationReceipt> for ConfirmPaymentResponse {
    fn from(receipt: ConfirmationReceipt) -> Self {
        Self {
            credit_balance: receipt.account.credit_balance,
            plan_tag: receipt.account.plan_tag.as_ref().map(ToString::to_string),
            applied: receipt.applied,
            message: receipt.message,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(example = json!({ "received": true, "outcome": "applied" })))]
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub outcome: &'static str,
}

impl From<&WebhookOutcome> for WebhookAckResponse {
    fn from(outcome: &WebhookOutcome) -> Self {
        let outcome = match outcome {
            WebhookOutcome::Applied { .. } => "applied",
            WebhookOutcome::AlreadyApplied { .. } => "already_applied",
            WebhookOutcome::Ignored { .. } => "ignored",
        };
        Self {
            received: true,
            outcome,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({
        "operation": "blog_post",
        "text": "# Ownership in Rust\n...",
        "creditsSpent": 3,
        "remainingBalance": 39
    })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub operation: String,
    pub text: String,
    pub credits_spent: i64,
    pub remaining_balance: i64,
}

impl From<GenerationResult> for GenerationResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            operation: result.operation.to_string(),
            text: result.text,
            credits_spent: result.credits_spent,
            remaining_balance: result.remaining_balance,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(example = json!({ "status": "ok", "store": "reachable" })))]
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

#[cfg(feature = "docs")]
#[derive(serde::Serialize, utoipa::ToSchema)]
#[schema(title = "ApiResponseValue")]
pub struct ApiResponseValue {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
