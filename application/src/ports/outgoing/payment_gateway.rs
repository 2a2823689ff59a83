use std::sync::Arc;

use crate::contracts::payments::{CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest};
use crate::error::AppResult;
use domain::purchase::PurchaseId;

#[async_trait::async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;

    async fn retrieve_checkout_session(
        &self,
        session_id: &PurchaseId,
    ) -> AppResult<CheckoutSessionDetails>;
}

pub type DynPaymentGatewayPort = Arc<dyn PaymentGatewayPort>;
