use tracing::instrument;

use crate::contracts::payments::{
    CHECKOUT_SESSION_COMPLETED, CheckoutSessionDetails, PaymentEventKind, PurchaseMetadata,
    WebhookOutcome,
};
use crate::error::{AppError, AppResult};
use crate::ports::incoming::payments::PaymentEventUseCase;
use crate::ports::outgoing::account_store::DynAccountStorePort;
use crate::ports::outgoing::payment_events::DynPaymentEventVerifierPort;
use domain::purchase::{GrantOutcome, GrantSource, PurchaseGrant};

const UNREADABLE_EVENT: &str = "unreadable";

/// Authoritative crediting path, driven by signed provider notifications.
pub struct PaymentEventService {
    verifier: DynPaymentEventVerifierPort,
    account_store: DynAccountStorePort,
}

impl PaymentEventService {
    pub fn new(verifier: DynPaymentEventVerifierPort, account_store: DynAccountStorePort) -> Self {
        Self {
            verifier,
            account_store,
        }
    }

    fn ignored(reason: &str) -> WebhookOutcome {
        WebhookOutcome::Ignored {
            event_type: CHECKOUT_SESSION_COMPLETED.to_string(),
            reason: reason.to_string(),
        }
    }

    async fn apply_completed_checkout(
        &self,
        session: CheckoutSessionDetails,
    ) -> AppResult<WebhookOutcome> {
        if !session.paid {
            tracing::info!(
                purchase_id = %session.session_id,
                "Checkout completed without settled payment, skipping"
            );
            return Ok(Self::ignored("payment not settled"));
        }

        // Redelivery cannot repair bad metadata, so acknowledge and leave it to an operator.
        let metadata = match PurchaseMetadata::from_map(&session.metadata) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(
                    purchase_id = %session.session_id,
                    error = %e,
                    "Completed checkout carries unusable metadata"
                );
                return Ok(Self::ignored("malformed metadata"));
            }
        };

        let grant = PurchaseGrant {
            purchase_id: session.session_id,
            user_id: metadata.user_id,
            package_id: metadata.package_id,
            credits: metadata.credits,
            source: GrantSource::Webhook,
        };

        match self.account_store.apply_grant(&grant).await {
            Ok(GrantOutcome::Applied(account)) => {
                tracing::info!(
                    user_id = %grant.user_id,
                    purchase_id = %grant.purchase_id,
                    package_id = %grant.package_id,
                    credits = grant.credits,
                    balance = account.credit_balance,
                    "Purchase credited from webhook"
                );
                Ok(WebhookOutcome::Applied {
                    purchase_id: grant.purchase_id,
                    user_id: grant.user_id,
                    credits: grant.credits,
                })
            }
            Ok(GrantOutcome::AlreadyApplied(_)) => {
                tracing::info!(
                    purchase_id = %grant.purchase_id,
                    "Purchase already credited, acknowledging redelivery"
                );
                Ok(WebhookOutcome::AlreadyApplied {
                    purchase_id: grant.purchase_id,
                })
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %grant.user_id,
                    purchase_id = %grant.purchase_id,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Failed to apply purchase grant"
                );
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl PaymentEventUseCase for PaymentEventService {
    #[instrument(skip(self, raw_payload, signature_header), fields(payload_len = raw_payload.len()))]
    async fn handle_event(
        &self,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> AppResult<WebhookOutcome> {
        let event = match self.verifier.verify(raw_payload, signature_header) {
            Ok(event) => event,
            // Authentic but unreadable; redelivery would fail the same way.
            Err(AppError::MalformedEvent { message }) => {
                tracing::error!(error = %message, "Signed payment event could not be parsed");
                return Ok(WebhookOutcome::Ignored {
                    event_type: UNREADABLE_EVENT.to_string(),
                    reason: "malformed event".to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected payment event");
                return Err(e);
            }
        };

        tracing::debug!(event_id = %event.event_id, "Payment event verified");

        match event.kind {
            PaymentEventKind::CheckoutCompleted(session) => {
                self.apply_completed_checkout(session).await
            }
            PaymentEventKind::Other { event_type } => {
                tracing::debug!(%event_type, "Ignoring unhandled payment event type");
                Ok(WebhookOutcome::Ignored {
                    event_type,
                    reason: "event type not handled".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::contracts::payments::VerifiedPaymentEvent;
    use crate::ports::outgoing::payment_events::{
        DynPaymentEventVerifierPort, PaymentEventVerifierPort,
    };
    use crate::test_support::{FakeAccountStore, FakeVerifier, VALID_SIGNATURE};
    use domain::auth::UserId;
    use domain::purchase::PurchaseId;

    fn completed(session_id: &str, paid: bool, metadata: &[(&str, String)]) -> VerifiedPaymentEvent {
        VerifiedPaymentEvent {
            event_id: "evt_1".to_string(),
            kind: PaymentEventKind::CheckoutCompleted(CheckoutSessionDetails {
                session_id: PurchaseId::parse(session_id).unwrap(),
                paid,
                metadata: metadata
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect::<HashMap<_, _>>(),
            }),
        }
    }

    fn pro_metadata(user: UserId) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", user.to_string()),
            ("package_id", "pro".to_string()),
            ("credits", "500".to_string()),
        ]
    }

    fn service(store: &Arc<FakeAccountStore>, event: VerifiedPaymentEvent) -> PaymentEventService {
        PaymentEventService::new(
            Arc::new(FakeVerifier { event }) as DynPaymentEventVerifierPort,
            Arc::clone(store) as DynAccountStorePort,
        )
    }

    #[tokio::test]
    async fn redelivered_event_credits_once() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 0));
        let svc = service(&store, completed("cs_123", true, &pro_metadata(user)));

        let first = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();
        assert!(matches!(first, WebhookOutcome::Applied { credits: 500, .. }));

        for _ in 0..3 {
            let again = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();
            assert!(matches!(again, WebhookOutcome::AlreadyApplied { .. }));
        }

        let account = store.account(&user).unwrap();
        assert_eq!(account.credit_balance, 500);
        assert_eq!(account.plan_tag.unwrap().as_str(), "pro");
    }

    struct UnreadableVerifier;

    impl PaymentEventVerifierPort for UnreadableVerifier {
        fn verify(&self, _payload: &[u8], _signature_header: &str) -> AppResult<VerifiedPaymentEvent> {
            Err(AppError::MalformedEvent {
                message: "data.object is not a checkout session".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn unreadable_signed_event_is_acknowledged() {
        let store = Arc::new(FakeAccountStore::default());
        let svc = PaymentEventService::new(
            Arc::new(UnreadableVerifier) as DynPaymentEventVerifierPort,
            Arc::clone(&store) as DynAccountStorePort,
        );

        let outcome = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored { reason, .. } if reason == "malformed event"));
        assert_eq!(store.grant_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 7));
        let svc = service(&store, completed("cs_123", true, &pro_metadata(user)));

        let err = svc.handle_event(b"{}", "t=1,v1=00").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSignature { .. }));
        assert_eq!(store.balance(&user), Some(7));
        assert_eq!(store.grant_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_event_types_are_acknowledged() {
        let store = Arc::new(FakeAccountStore::default());
        let svc = service(
            &store,
            VerifiedPaymentEvent {
                event_id: "evt_2".to_string(),
                kind: PaymentEventKind::Other {
                    event_type: "invoice.paid".to_string(),
                },
            },
        );

        let outcome = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored { event_type, .. } if event_type == "invoice.paid"));
    }

    #[tokio::test]
    async fn unpaid_session_is_not_credited() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 0));
        let svc = service(&store, completed("cs_123", false, &pro_metadata(user)));

        let outcome = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));
        assert_eq!(store.balance(&user), Some(0));
    }

    #[tokio::test]
    async fn malformed_metadata_is_acknowledged_without_grant() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 0));
        let metadata = vec![("user_id", user.to_string()), ("package_id", "pro".to_string())];
        let svc = service(&store, completed("cs_123", true, &metadata));

        let outcome = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored { reason, .. } if reason == "malformed metadata"));
        assert_eq!(store.grant_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_outage_is_retryable() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 0));
        store.unavailable.store(true, Ordering::SeqCst);
        let svc = service(&store, completed("cs_123", true, &pro_metadata(user)));

        let err = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap_err();
        assert!(err.is_retryable());

        store.unavailable.store(false, Ordering::SeqCst);
        let outcome = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Applied { .. }));
        assert_eq!(store.balance(&user), Some(500));
    }

    #[tokio::test]
    async fn unknown_user_is_retryable() {
        let store = Arc::new(FakeAccountStore::default());
        let svc = service(&store, completed("cs_123", true, &pro_metadata(UserId::new())));

        let err = svc.handle_event(b"{}", VALID_SIGNATURE).await.unwrap_err();

        assert!(matches!(err, AppError::UnknownUser { .. }));
        assert!(err.is_retryable());
    }
}
