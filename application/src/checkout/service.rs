use std::sync::Arc;

use tracing::instrument;

use crate::contracts::payments::{CheckoutSession, CheckoutSessionRequest, PurchaseMetadata};
use crate::error::{AppError, AppResult};
use crate::infrastructure_config::PaymentsConfig;
use crate::ports::incoming::checkout::CheckoutUseCase;
use crate::ports::outgoing::account_store::DynAccountStorePort;
use crate::ports::outgoing::payment_gateway::DynPaymentGatewayPort;
use domain::auth::UserId;
use domain::package::{CreditPackage, PackageCatalog};

/// Starts hosted checkout for a catalog package. Never touches balances.
pub struct CheckoutService {
    catalog: Arc<PackageCatalog>,
    account_store: DynAccountStorePort,
    payment_gateway: DynPaymentGatewayPort,
    payments: PaymentsConfig,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<PackageCatalog>,
        account_store: DynAccountStorePort,
        payment_gateway: DynPaymentGatewayPort,
        payments: PaymentsConfig,
    ) -> Self {
        Self {
            catalog,
            account_store,
            payment_gateway,
            payments,
        }
    }
}

#[async_trait::async_trait]
impl CheckoutUseCase for CheckoutService {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn create_session(
        &self,
        user_id: &UserId,
        package_id: &str,
    ) -> AppResult<CheckoutSession> {
        let package = self
            .catalog
            .lookup(package_id)
            .ok_or_else(|| AppError::InvalidPackage {
                package_id: package_id.to_string(),
            })?;

        if self.account_store.get_account(user_id).await?.is_none() {
            return Err(AppError::UnknownUser {
                user_id: user_id.to_string(),
            });
        }

        let request = CheckoutSessionRequest {
            package: package.clone(),
            metadata: PurchaseMetadata::for_package(*user_id, package),
            success_url: self.payments.success_url(&package.id),
            cancel_url: self.payments.cancel_url(),
        };

        let session = self.payment_gateway.create_checkout_session(&request).await?;

        tracing::info!(
            package_id = %package.id,
            purchase_id = %session.session_id,
            "Checkout session created"
        );

        Ok(session)
    }

    fn list_packages(&self) -> Vec<CreditPackage> {
        self.catalog.iter().cloned().collect()
    }
}
