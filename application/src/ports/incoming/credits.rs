use crate::error::AppResult;
use domain::auth::UserId;
use domain::credits::CreditAccount;

/// Gate in front of every paid action.
#[async_trait::async_trait]
pub trait CreditGateUseCase: Send + Sync {
    async fn reserve_and_debit(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount>;

    /// Compensates a debit whose paid action did not complete.
    async fn refund(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount>;
}

#[async_trait::async_trait]
pub trait AccountUseCase: Send + Sync {
    async fn open_account(&self, user_id: &UserId) -> AppResult<CreditAccount>;

    async fn get_credits(&self, user_id: &UserId) -> AppResult<CreditAccount>;
}
