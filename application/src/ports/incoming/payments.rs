use crate::contracts::payments::{ConfirmationReceipt, WebhookOutcome};
use crate::error::AppResult;
use domain::auth::UserId;

#[async_trait::async_trait]
pub trait PaymentEventUseCase: Send + Sync {
    async fn handle_event(
        &self,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> AppResult<WebhookOutcome>;
}

#[async_trait::async_trait]
pub trait PaymentConfirmationUseCase: Send + Sync {
    async fn confirm_payment(
        &self,
        user_id: &UserId,
        package_id: &str,
        session_id: &str,
    ) -> AppResult<ConfirmationReceipt>;
}
