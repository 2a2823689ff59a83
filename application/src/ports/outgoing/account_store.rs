use std::sync::Arc;

use crate::error::AppResult;
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::purchase::{GrantOutcome, PurchaseGrant};

/// Persistence for credit accounts.
///
/// Every mutating method is a single atomic read-modify-write scoped to one
/// account. Implementations must never split a check and its write across
/// two round trips.
#[async_trait::async_trait]
pub trait AccountStorePort: Send + Sync {
    /// Creates the account with `starter_credits` or returns the existing one unchanged.
    async fn open_account(&self, user_id: &UserId, starter_credits: i64)
    -> AppResult<CreditAccount>;

    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>>;

    /// Decrements the balance and increments lifetime usage by `amount`, or
    /// fails with `InsufficientCredits` leaving the account untouched.
    async fn debit_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount>;

    async fn refund_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount>;

    /// Records `grant.purchase_id` and credits the account in one atomic unit.
    /// A purchase id that was already recorded yields `AlreadyApplied` and no mutation.
    async fn apply_grant(&self, grant: &PurchaseGrant) -> AppResult<GrantOutcome>;

    async fn ping(&self) -> AppResult<()>;
}

pub type DynAccountStorePort = Arc<dyn AccountStorePort>;
