use crate::contracts::payments::CheckoutSession;
use crate::error::AppResult;
use domain::auth::UserId;
use domain::package::CreditPackage;

#[async_trait::async_trait]
pub trait CheckoutUseCase: Send + Sync {
    async fn create_session(&self, user_id: &UserId, package_id: &str)
    -> AppResult<CheckoutSession>;

    fn list_packages(&self) -> Vec<CreditPackage>;
}
