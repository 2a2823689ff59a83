use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::ports::incoming::credits::{AccountUseCase, CreditGateUseCase};
use crate::ports::outgoing::account_store::DynAccountStorePort;
use domain::auth::UserId;
use domain::credits::{CreditAccount, ensure_positive_amount};

pub struct AccountService {
    account_store: DynAccountStorePort,
    starter_credits: i64,
}

impl AccountService {
    pub fn new(account_store: DynAccountStorePort, starter_credits: i64) -> Self {
        Self {
            account_store,
            starter_credits,
        }
    }

    fn validate_amount(amount: i64) -> AppResult<i64> {
        ensure_positive_amount(amount).map_err(|e| AppError::ValidationError {
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CreditGateUseCase for AccountService {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn reserve_and_debit(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let amount = Self::validate_amount(amount)?;

        match self.account_store.debit_credits(user_id, amount).await {
            Ok(account) => {
                tracing::debug!(
                    amount,
                    remaining = account.credit_balance,
                    lifetime_used = account.lifetime_used,
                    "Credits debited"
                );
                Ok(account)
            }
            Err(AppError::InsufficientCredits {
                required,
                available,
            }) => {
                tracing::info!(required, available, "Debit refused, insufficient credits");
                Err(AppError::InsufficientCredits {
                    required,
                    available,
                })
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn refund(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let amount = Self::validate_amount(amount)?;
        let account = self.account_store.refund_credits(user_id, amount).await?;

        tracing::info!(
            amount,
            balance = account.credit_balance,
            "Credits refunded"
        );

        Ok(account)
    }
}

#[async_trait::async_trait]
impl AccountUseCase for AccountService {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn open_account(&self, user_id: &UserId) -> AppResult<CreditAccount> {
        self.account_store
            .open_account(user_id, self.starter_credits)
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_credits(&self, user_id: &UserId) -> AppResult<CreditAccount> {
        self.account_store
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::UnknownUser {
                user_id: user_id.to_string(),
            })
    }
}
