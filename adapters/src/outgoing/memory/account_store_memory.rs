use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;
use tracing::{debug, instrument};

use credit_ledger_application::{
    error::{AppError, AppResult},
    ports::outgoing::account_store::AccountStorePort,
};
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::purchase::{GrantOutcome, PurchaseGrant};

#[derive(Default)]
struct Ledger {
    accounts: HashMap<UserId, CreditAccount>,
    applied_purchases: HashSet<String>,
}

/// Process-local account store for development and tests.
///
/// Accounts and applied purchase ids live behind one lock so a grant's
/// duplicate check and its credit happen as a single step.
#[derive(Default)]
pub struct InMemoryAccountStoreAdapter {
    ledger: Mutex<Ledger>,
}

impl InMemoryAccountStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| AppError::AccountUnavailable {
            message: "account ledger lock poisoned".to_string(),
        })
    }

    fn unknown_user(user_id: &UserId) -> AppError {
        AppError::UnknownUser {
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AccountStorePort for InMemoryAccountStoreAdapter {
    #[instrument(skip(self))]
    async fn open_account(
        &self,
        user_id: &UserId,
        starter_credits: i64,
    ) -> AppResult<CreditAccount> {
        let mut ledger = self.lock()?;
        let account = ledger.accounts.entry(*user_id).or_insert_with(|| {
            CreditAccount::open(*user_id, starter_credits, OffsetDateTime::now_utc())
        });
        Ok(account.clone())
    }

    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        Ok(self.lock()?.accounts.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn debit_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let mut ledger = self.lock()?;
        let account = ledger
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| Self::unknown_user(user_id))?;

        account
            .debit(amount, OffsetDateTime::now_utc())
            .map_err(|e| AppError::InsufficientCredits {
                required: e.required,
                available: e.available,
            })?;

        debug!(
            "Debited {} credits for user {}, {} remaining",
            amount, user_id, account.credit_balance
        );
        Ok(account.clone())
    }

    #[instrument(skip(self))]
    async fn refund_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let mut ledger = self.lock()?;
        let account = ledger
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| Self::unknown_user(user_id))?;

        account.refund(amount, OffsetDateTime::now_utc());
        Ok(account.clone())
    }

    #[instrument(skip(self, grant), fields(purchase_id = %grant.purchase_id, user_id = %grant.user_id))]
    async fn apply_grant(&self, grant: &PurchaseGrant) -> AppResult<GrantOutcome> {
        let mut guard = self.lock()?;
        let ledger = &mut *guard;

        let account = ledger
            .accounts
            .get_mut(&grant.user_id)
            .ok_or_else(|| Self::unknown_user(&grant.user_id))?;

        if !ledger
            .applied_purchases
            .insert(grant.purchase_id.as_str().to_string())
        {
            return Ok(GrantOutcome::AlreadyApplied(account.clone()));
        }

        account.grant(
            grant.credits,
            grant.package_id.clone(),
            OffsetDateTime::now_utc(),
        );

        debug!(
            "Applied {} credits to user {} from {}",
            grant.credits,
            grant.user_id,
            grant.source.as_str()
        );
        Ok(GrantOutcome::Applied(account.clone()))
    }

    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }
}
