use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::package::{CreditPackage, PackageId};
use domain::purchase::PurchaseId;

pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_PACKAGE_ID: &str = "package_id";
pub const METADATA_CREDITS: &str = "credits";

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// What the checkout session carries through the provider and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseMetadata {
    pub user_id: UserId,
    pub package_id: PackageId,
    pub credits: i64,
}

impl PurchaseMetadata {
    pub fn for_package(user_id: UserId, package: &CreditPackage) -> Self {
        Self {
            user_id,
            package_id: package.id.clone(),
            credits: package.credits,
        }
    }

    pub fn from_map(metadata: &HashMap<String, String>) -> AppResult<Self> {
        let field = |key: &str| {
            metadata
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| AppError::ValidationError {
                    message: format!("checkout metadata is missing '{key}'"),
                })
        };

        let user_id = field(METADATA_USER_ID)?.parse::<UserId>()?;
        let package_id = PackageId::parse(field(METADATA_PACKAGE_ID)?)?;
        let credits = field(METADATA_CREDITS)?
            .parse::<i64>()
            .map_err(|_| AppError::ValidationError {
                message: "checkout metadata 'credits' is not an integer".to_string(),
            })?;

        if credits <= 0 {
            return Err(AppError::ValidationError {
                message: format!("checkout metadata 'credits' must be positive, got {credits}"),
            });
        }

        Ok(Self {
            user_id,
            package_id,
            credits,
        })
    }

    pub fn to_pairs(&self) -> [(&'static str, String); 3] {
        [
            (METADATA_USER_ID, self.user_id.to_string()),
            (METADATA_PACKAGE_ID, self.package_id.to_string()),
            (METADATA_CREDITS, self.credits.to_string()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub package: CreditPackage,
    pub metadata: PurchaseMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: PurchaseId,
    pub redirect_url: String,
}

/// Provider's view of a checkout session, as returned by a lookup or carried in an event.
#[derive(Debug, Clone)]
pub struct CheckoutSessionDetails {
    pub session_id: PurchaseId,
    pub paid: bool,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct VerifiedPaymentEvent {
    pub event_id: String,
    pub kind: PaymentEventKind,
}

#[derive(Debug, Clone)]
pub enum PaymentEventKind {
    CheckoutCompleted(CheckoutSessionDetails),
    Other { event_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied {
        purchase_id: PurchaseId,
        user_id: UserId,
        credits: i64,
    },
    AlreadyApplied {
        purchase_id: PurchaseId,
    },
    Ignored {
        event_type: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ConfirmationReceipt {
    pub account: CreditAccount,
    pub applied: bool,
    pub message: String,
}
