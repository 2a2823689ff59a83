//! Shared wiring for the adapter integration tests.
//!
//! Builds the full service graph over the in-memory account store, the real
//! webhook verifier and duplicate guard, and stubbed provider/generator ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::json;
use sha2::Sha256;
use time::OffsetDateTime;

use credit_ledger_adapters::outgoing::{
    dashmap_guard::duplicate_guard_dashmap::DashMapDuplicateGuard,
    memory::account_store_memory::InMemoryAccountStoreAdapter,
    stripe_reqwest::webhook_verifier::StripeWebhookVerifier,
};
use credit_ledger_adapters::shared::app_state::AppState;
use credit_ledger_application::{
    accounts::service::AccountService,
    checkout::service::CheckoutService,
    contracts::payments::{
        CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest, METADATA_CREDITS,
        METADATA_PACKAGE_ID, METADATA_USER_ID,
    },
    error::{AppError, AppResult},
    generation::service::GenerationService,
    infrastructure_config::Config,
    payments::{
        confirmation_service::{PaymentConfirmationDeps, PaymentConfirmationService},
        event_service::PaymentEventService,
    },
    ports::outgoing::{
        account_store::{AccountStorePort, DynAccountStorePort},
        payment_gateway::PaymentGatewayPort,
        text_generator::TextGeneratorPort,
    },
};
use domain::auth::UserId;
use domain::metering::MeteredOperation;
use domain::purchase::PurchaseId;

pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";
pub const USER_HEADER: &str = "x-user-id";

/// Payment provider stand-in that only knows the sessions a test registers.
#[derive(Default)]
pub struct StubGateway {
    sessions: Mutex<HashMap<String, CheckoutSessionDetails>>,
}

impl StubGateway {
    pub fn register_paid(&self, session_id: &str, user_id: &UserId, package_id: &str, credits: i64) {
        let metadata = HashMap::from([
            (METADATA_USER_ID.to_string(), user_id.to_string()),
            (METADATA_PACKAGE_ID.to_string(), package_id.to_string()),
            (METADATA_CREDITS.to_string(), credits.to_string()),
        ]);
        let details = CheckoutSessionDetails {
            session_id: PurchaseId::parse(session_id).unwrap(),
            paid: true,
            metadata,
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), details);
    }
}

#[async_trait::async_trait]
impl PaymentGatewayPort for StubGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        Ok(CheckoutSession {
            session_id: PurchaseId::parse("cs_test_created").unwrap(),
            redirect_url: format!(
                "https://checkout.example/{}",
                request.package.id.as_str()
            ),
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &PurchaseId,
    ) -> AppResult<CheckoutSessionDetails> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id.as_str())
            .cloned()
            .ok_or_else(|| AppError::PaymentNotVerified {
                message: format!("no such checkout session: {session_id}"),
            })
    }
}

#[derive(Default)]
pub struct StubGenerator {
    pub failing: AtomicBool,
}

#[async_trait::async_trait]
impl TextGeneratorPort for StubGenerator {
    async fn generate(&self, operation: MeteredOperation, prompt: &str) -> AppResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::GenerationFailed {
                message: "upstream model timed out".to_string(),
            });
        }
        Ok(format!("[{operation}] {prompt}"))
    }
}

pub struct TestApp {
    pub config: Arc<Config>,
    pub store: Arc<InMemoryAccountStoreAdapter>,
    pub gateway: Arc<StubGateway>,
    pub generator: Arc<StubGenerator>,
    pub credit_gate: Arc<AccountService>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.payments.webhook_secret = SecretString::from(WEBHOOK_SECRET);
        config.payments.secret_key = SecretString::from("sk_test_unused");
        config.rate_limit.enabled = false;
        config.auth.user_header = USER_HEADER.to_string();
        let config = Arc::new(config);

        let catalog = Arc::new(config.package_catalog().unwrap());
        let store = Arc::new(InMemoryAccountStoreAdapter::new());
        let account_store: DynAccountStorePort = store.clone();
        let gateway = Arc::new(StubGateway::default());
        let generator = Arc::new(StubGenerator::default());

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&account_store),
            config.credits.starter_credits,
        ));
        let checkout_service = Arc::new(CheckoutService::new(
            Arc::clone(&catalog),
            Arc::clone(&account_store),
            gateway.clone(),
            config.payments.clone(),
        ));
        let verifier = StripeWebhookVerifier::new(
            SecretString::from(WEBHOOK_SECRET),
            config.payments.signature_tolerance_secs,
        )
        .unwrap();
        let event_service = Arc::new(PaymentEventService::new(
            Arc::new(verifier),
            Arc::clone(&account_store),
        ));
        let confirmation_service = Arc::new(PaymentConfirmationService::new(
            PaymentConfirmationDeps {
                catalog,
                account_store: Arc::clone(&account_store),
                payment_gateway: gateway.clone(),
                duplicate_guard: Arc::new(DashMapDuplicateGuard::new(Duration::from_secs(10))),
            },
        ));
        let generation_service = Arc::new(GenerationService::new(
            account_service.clone(),
            generator.clone(),
            config.credits.costs.to_costs(),
        ));

        let state = AppState::new(
            Arc::clone(&config),
            account_service.clone(),
            checkout_service,
            event_service,
            confirmation_service,
            generation_service,
            account_store,
        );

        Self {
            config,
            store,
            gateway,
            generator,
            credit_gate: account_service,
            state,
        }
    }

    pub async fn open_with_balance(&self, balance: i64) -> UserId {
        let user = UserId::new();
        self.store.open_account(&user, balance).await.unwrap();
        user
    }

    pub async fn balance(&self, user: &UserId) -> i64 {
        self.store
            .get_account(user)
            .await
            .unwrap()
            .map(|account| account.credit_balance)
            .unwrap()
    }
}

pub fn checkout_completed_event(
    event_id: &str,
    session_id: &str,
    user: &UserId,
    package_id: &str,
    credits: i64,
) -> Vec<u8> {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "payment_status": "paid",
                "metadata": {
                    "user_id": user.to_string(),
                    "package_id": package_id,
                    "credits": credits.to_string()
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub fn sign_with(secret: &str, payload: &[u8]) -> String {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

pub fn sign(payload: &[u8]) -> String {
    sign_with(WEBHOOK_SECRET, payload)
}
