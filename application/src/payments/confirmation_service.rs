use std::sync::Arc;

use tracing::instrument;

use crate::contracts::payments::{ConfirmationReceipt, PurchaseMetadata};
use crate::error::{AppError, AppResult};
use crate::ports::incoming::payments::PaymentConfirmationUseCase;
use crate::ports::outgoing::account_store::DynAccountStorePort;
use crate::ports::outgoing::duplicate_guard::DynDuplicateGuardPort;
use crate::ports::outgoing::payment_gateway::DynPaymentGatewayPort;
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::package::{CreditPackage, PackageCatalog};
use domain::purchase::{GrantOutcome, GrantSource, PurchaseGrant, PurchaseId};

pub const CREDITS_ADDED_MESSAGE: &str = "Credits added successfully";
pub const ALREADY_APPLIED_MESSAGE: &str = "Credits already applied";

pub struct PaymentConfirmationDeps {
    pub catalog: Arc<PackageCatalog>,
    pub account_store: DynAccountStorePort,
    pub payment_gateway: DynPaymentGatewayPort,
    pub duplicate_guard: DynDuplicateGuardPort,
}

/// Client-driven crediting path, used when the user lands on the success page
/// before the provider notification arrives.
pub struct PaymentConfirmationService {
    catalog: Arc<PackageCatalog>,
    account_store: DynAccountStorePort,
    payment_gateway: DynPaymentGatewayPort,
    duplicate_guard: DynDuplicateGuardPort,
}

impl PaymentConfirmationService {
    pub fn new(deps: PaymentConfirmationDeps) -> Self {
        Self {
            catalog: deps.catalog,
            account_store: deps.account_store,
            payment_gateway: deps.payment_gateway,
            duplicate_guard: deps.duplicate_guard,
        }
    }

    async fn current_account(&self, user_id: &UserId) -> AppResult<CreditAccount> {
        self.account_store
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::UnknownUser {
                user_id: user_id.to_string(),
            })
    }

    /// Looks the session up at the provider and returns the id the provider
    /// reports for it, which is the only value a grant may be keyed on.
    async fn verify_session(
        &self,
        user_id: &UserId,
        package: &CreditPackage,
        requested: &PurchaseId,
    ) -> AppResult<PurchaseId> {
        let details = self
            .payment_gateway
            .retrieve_checkout_session(requested)
            .await?;

        if details.session_id != *requested {
            return Err(AppError::PaymentNotVerified {
                message: format!(
                    "provider returned session {} for {}",
                    details.session_id, requested
                ),
            });
        }

        if !details.paid {
            return Err(AppError::PaymentNotVerified {
                message: "checkout session is not paid".to_string(),
            });
        }

        let metadata =
            PurchaseMetadata::from_map(&details.metadata).map_err(|e| AppError::PaymentNotVerified {
                message: e.to_string(),
            })?;

        if metadata.user_id != *user_id || metadata.package_id != package.id {
            return Err(AppError::PaymentNotVerified {
                message: "checkout session belongs to a different purchase".to_string(),
            });
        }

        Ok(details.session_id)
    }

    async fn verify_and_grant(
        &self,
        user_id: &UserId,
        package: &CreditPackage,
        requested: &PurchaseId,
    ) -> AppResult<GrantOutcome> {
        let purchase_id = self.verify_session(user_id, package, requested).await?;

        let grant = PurchaseGrant {
            purchase_id,
            user_id: *user_id,
            package_id: package.id.clone(),
            credits: package.credits,
            source: GrantSource::Confirmation,
        };

        self.account_store.apply_grant(&grant).await
    }
}

#[async_trait::async_trait]
impl PaymentConfirmationUseCase for PaymentConfirmationService {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn confirm_payment(
        &self,
        user_id: &UserId,
        package_id: &str,
        session_id: &str,
    ) -> AppResult<ConfirmationReceipt> {
        let package = self
            .catalog
            .lookup(package_id)
            .ok_or_else(|| AppError::InvalidPackage {
                package_id: package_id.to_string(),
            })?;
        let session_id = PurchaseId::parse(session_id).map_err(|e| AppError::ValidationError {
            message: e.to_string(),
        })?;

        if !self.duplicate_guard.try_claim(user_id, &package.id) {
            tracing::debug!(package_id = %package.id, "Confirmation suppressed by duplicate guard");
            let account = self.current_account(user_id).await?;
            return Ok(ConfirmationReceipt {
                account,
                applied: false,
                message: ALREADY_APPLIED_MESSAGE.to_string(),
            });
        }

        let outcome = match self.verify_and_grant(user_id, package, &session_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.duplicate_guard.release(user_id, &package.id);
                tracing::warn!(package_id = %package.id, error = %e, "Payment confirmation failed");
                return Err(e);
            }
        };

        let applied = outcome.was_applied();
        let account = outcome.into_account();

        if applied {
            tracing::info!(
                package_id = %package.id,
                credits = package.credits,
                balance = account.credit_balance,
                "Purchase credited from confirmation"
            );
        } else {
            tracing::info!(package_id = %package.id, "Purchase was already credited");
        }

        Ok(ConfirmationReceipt {
            account,
            applied,
            message: if applied {
                CREDITS_ADDED_MESSAGE
            } else {
                ALREADY_APPLIED_MESSAGE
            }
            .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{FakeAccountStore, FakeGateway, FakeGuard, catalog};

    struct Harness {
        store: Arc<FakeAccountStore>,
        gateway: Arc<FakeGateway>,
        service: PaymentConfirmationService,
    }

    fn harness(store: FakeAccountStore, gateway: FakeGateway) -> Harness {
        let store = Arc::new(store);
        let gateway = Arc::new(gateway);
        let service = PaymentConfirmationService::new(PaymentConfirmationDeps {
            catalog: Arc::new(catalog()),
            account_store: Arc::clone(&store) as DynAccountStorePort,
            payment_gateway: Arc::clone(&gateway) as DynPaymentGatewayPort,
            duplicate_guard: Arc::new(FakeGuard::default()) as DynDuplicateGuardPort,
        });
        Harness {
            store,
            gateway,
            service,
        }
    }

    #[tokio::test]
    async fn confirmed_session_grants_catalog_credits() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 10),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );

        let receipt = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();

        assert!(receipt.applied);
        assert_eq!(receipt.message, CREDITS_ADDED_MESSAGE);
        assert_eq!(receipt.account.credit_balance, 110);
        assert_eq!(receipt.account.plan_tag.unwrap().as_str(), "basic");
    }

    #[tokio::test]
    async fn repeated_confirmation_is_suppressed() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );

        h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();
        let second = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();

        assert!(!second.applied);
        assert_eq!(second.message, ALREADY_APPLIED_MESSAGE);
        assert_eq!(second.account.credit_balance, 100);
        assert_eq!(h.store.grant_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn durable_key_holds_without_the_guard() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );
        h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();

        let fresh_guard = PaymentConfirmationService::new(PaymentConfirmationDeps {
            catalog: Arc::new(catalog()),
            account_store: Arc::clone(&h.store) as DynAccountStorePort,
            payment_gateway: Arc::clone(&h.gateway) as DynPaymentGatewayPort,
            duplicate_guard: Arc::new(FakeGuard::default()) as DynDuplicateGuardPort,
        });
        let receipt = fresh_guard.confirm_payment(&user, "basic", "cs_1").await.unwrap();

        assert!(!receipt.applied);
        assert_eq!(receipt.account.credit_balance, 100);
    }

    #[tokio::test]
    async fn decorated_session_id_cannot_credit_again() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_x", &user, "basic"),
        );
        h.service.confirm_payment(&user, "basic", "cs_x").await.unwrap();

        let fresh_guard = PaymentConfirmationService::new(PaymentConfirmationDeps {
            catalog: Arc::new(catalog()),
            account_store: Arc::clone(&h.store) as DynAccountStorePort,
            payment_gateway: Arc::clone(&h.gateway) as DynPaymentGatewayPort,
            duplicate_guard: Arc::new(FakeGuard::default()) as DynDuplicateGuardPort,
        });
        for variant in ["cs_x#1", "cs_x?a=b", "cs_x/"] {
            let err = fresh_guard
                .confirm_payment(&user, "basic", variant)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError { .. }), "{variant}: {err}");
        }

        assert_eq!(h.store.balance(&user), Some(100));
        assert_eq!(h.store.grant_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn grant_is_keyed_on_the_provider_session_id() {
        let user = UserId::new();
        let gateway = FakeGateway::with_paid_session("cs_real", &user, "basic");
        let normalized = gateway.sessions.lock().unwrap().get("cs_real").cloned().unwrap();
        gateway
            .sessions
            .lock()
            .unwrap()
            .insert("cs_alias".to_string(), normalized);
        let h = harness(FakeAccountStore::with_account(user, 0), gateway);

        let err = h
            .service
            .confirm_payment(&user, "basic", "cs_alias")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentNotVerified { .. }));
        assert_eq!(h.store.grant_calls.load(Ordering::SeqCst), 0);

        let receipt = h.service.confirm_payment(&user, "basic", "cs_real").await.unwrap();
        assert!(receipt.applied);
        assert_eq!(receipt.account.credit_balance, 100);
    }

    #[tokio::test]
    async fn unpaid_session_is_refused_and_claim_released() {
        let user = UserId::new();
        let gateway = FakeGateway::default();
        gateway.insert_session("cs_1", &user, "basic", false);
        let h = harness(FakeAccountStore::with_account(user, 0), gateway);

        let err = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap_err();
        assert!(matches!(err, AppError::PaymentNotVerified { .. }));
        assert_eq!(h.store.balance(&user), Some(0));

        h.gateway.insert_session("cs_1", &user, "basic", true);
        let receipt = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();
        assert!(receipt.applied);
        assert_eq!(receipt.account.credit_balance, 100);
    }

    #[tokio::test]
    async fn session_of_another_user_is_refused() {
        let user = UserId::new();
        let other = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &other, "basic"),
        );

        let err = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap_err();

        assert!(matches!(err, AppError::PaymentNotVerified { .. }));
        assert_eq!(h.store.grant_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn session_for_another_package_is_refused() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );

        let err = h.service.confirm_payment(&user, "pro", "cs_1").await.unwrap_err();

        assert!(matches!(err, AppError::PaymentNotVerified { .. }));
        assert_eq!(h.store.balance(&user), Some(0));
    }

    #[tokio::test]
    async fn unknown_package_is_rejected() {
        let user = UserId::new();
        let h = harness(FakeAccountStore::with_account(user, 0), FakeGateway::default());

        let err = h.service.confirm_payment(&user, "gold", "cs_1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidPackage { .. }));
    }

    #[tokio::test]
    async fn store_outage_releases_claim() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );
        h.store.unavailable.store(true, Ordering::SeqCst);

        let err = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap_err();
        assert!(matches!(err, AppError::AccountUnavailable { .. }));

        h.store.unavailable.store(false, Ordering::SeqCst);
        let receipt = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap();
        assert!(receipt.applied);
    }

    #[tokio::test]
    async fn gateway_outage_is_provider_unavailable() {
        let user = UserId::new();
        let h = harness(
            FakeAccountStore::with_account(user, 0),
            FakeGateway::with_paid_session("cs_1", &user, "basic"),
        );
        h.gateway.unavailable.store(true, Ordering::SeqCst);

        let err = h.service.confirm_payment(&user, "basic", "cs_1").await.unwrap_err();

        assert!(matches!(err, AppError::PaymentProviderUnavailable { .. }));
    }
}
