use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use time::OffsetDateTime;

use crate::contracts::payments::{
    CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest, VerifiedPaymentEvent,
};
use crate::error::{AppError, AppResult};
use crate::ports::outgoing::account_store::AccountStorePort;
use crate::ports::outgoing::duplicate_guard::DuplicateGuardPort;
use crate::ports::outgoing::payment_events::PaymentEventVerifierPort;
use crate::ports::outgoing::payment_gateway::PaymentGatewayPort;
use crate::ports::outgoing::text_generator::TextGeneratorPort;
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::metering::MeteredOperation;
use domain::package::{CreditPackage, PackageCatalog, PackageId};
use domain::purchase::{GrantOutcome, PurchaseGrant, PurchaseId};

pub fn catalog() -> PackageCatalog {
    PackageCatalog::new(vec![
        CreditPackage {
            id: PackageId::parse("basic").unwrap(),
            name: "Basic".to_string(),
            credits: 100,
            price_minor_units: 999,
            external_price_ref: None,
        },
        CreditPackage {
            id: PackageId::parse("pro").unwrap(),
            name: "Pro".to_string(),
            credits: 500,
            price_minor_units: 3999,
            external_price_ref: Some("price_pro".to_string()),
        },
    ])
    .unwrap()
}

#[derive(Default)]
pub struct FakeAccountStore {
    accounts: Mutex<HashMap<UserId, CreditAccount>>,
    applied: Mutex<HashSet<String>>,
    pub unavailable: AtomicBool,
    pub grant_calls: AtomicUsize,
}

impl FakeAccountStore {
    pub fn with_account(user_id: UserId, balance: i64) -> Self {
        let store = Self::default();
        store.accounts.lock().unwrap().insert(
            user_id,
            CreditAccount::open(user_id, balance, OffsetDateTime::now_utc()),
        );
        store
    }

    pub fn balance(&self, user_id: &UserId) -> Option<i64> {
        self.accounts
            .lock()
            .unwrap()
            .get(user_id)
            .map(|a| a.credit_balance)
    }

    pub fn account(&self, user_id: &UserId) -> Option<CreditAccount> {
        self.accounts.lock().unwrap().get(user_id).cloned()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::AccountUnavailable {
                message: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountStorePort for FakeAccountStore {
    async fn open_account(
        &self,
        user_id: &UserId,
        starter_credits: i64,
    ) -> AppResult<CreditAccount> {
        self.check_available()?;
        let mut accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .entry(*user_id)
            .or_insert_with(|| {
                CreditAccount::open(*user_id, starter_credits, OffsetDateTime::now_utc())
            })
            .clone())
    }

    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        self.check_available()?;
        Ok(self.account(user_id))
    }

    async fn debit_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        self.check_available()?;
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(user_id).ok_or(AppError::UnknownUser {
            user_id: user_id.to_string(),
        })?;
        account
            .debit(amount, OffsetDateTime::now_utc())
            .map_err(|e| AppError::InsufficientCredits {
                required: e.required,
                available: e.available,
            })?;
        Ok(account.clone())
    }

    async fn refund_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        self.check_available()?;
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(user_id).ok_or(AppError::UnknownUser {
            user_id: user_id.to_string(),
        })?;
        account.refund(amount, OffsetDateTime::now_utc());
        Ok(account.clone())
    }

    async fn apply_grant(&self, grant: &PurchaseGrant) -> AppResult<GrantOutcome> {
        self.check_available()?;
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        let mut applied = self.applied.lock().unwrap();
        let account = accounts.get_mut(&grant.user_id).ok_or(AppError::UnknownUser {
            user_id: grant.user_id.to_string(),
        })?;
        if !applied.insert(grant.purchase_id.as_str().to_string()) {
            return Ok(GrantOutcome::AlreadyApplied(account.clone()));
        }
        account.grant(
            grant.credits,
            grant.package_id.clone(),
            OffsetDateTime::now_utc(),
        );
        Ok(GrantOutcome::Applied(account.clone()))
    }

    async fn ping(&self) -> AppResult<()> {
        self.check_available()
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub sessions: Mutex<HashMap<String, CheckoutSessionDetails>>,
    pub created: Mutex<Vec<CheckoutSessionRequest>>,
    pub unavailable: AtomicBool,
}

impl FakeGateway {
    pub fn with_paid_session(session_id: &str, user_id: &UserId, package_id: &str) -> Self {
        let gateway = Self::default();
        gateway.insert_session(session_id, user_id, package_id, true);
        gateway
    }

    pub fn insert_session(&self, session_id: &str, user_id: &UserId, package_id: &str, paid: bool) {
        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("package_id".to_string(), package_id.to_string()),
            ("credits".to_string(), "1".to_string()),
        ]);
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            CheckoutSessionDetails {
                session_id: PurchaseId::parse(session_id).unwrap(),
                paid,
                metadata,
            },
        );
    }
}

#[async_trait::async_trait]
impl PaymentGatewayPort for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::PaymentProviderUnavailable {
                message: "timeout".to_string(),
            });
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            session_id: PurchaseId::parse("cs_test_new").unwrap(),
            redirect_url: "https://checkout.example/cs_test_new".to_string(),
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &PurchaseId,
    ) -> AppResult<CheckoutSessionDetails> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::PaymentProviderUnavailable {
                message: "timeout".to_string(),
            });
        }
        self.sessions
            .lock()
            .unwrap()
            .get(session_id.as_str())
            .cloned()
            .ok_or_else(|| AppError::PaymentNotVerified {
                message: "no such session".to_string(),
            })
    }
}

#[derive(Default)]
pub struct FakeGuard {
    claims: Mutex<HashSet<(UserId, PackageId)>>,
}

impl DuplicateGuardPort for FakeGuard {
    fn try_claim(&self, user_id: &UserId, package_id: &PackageId) -> bool {
        self.claims
            .lock()
            .unwrap()
            .insert((*user_id, package_id.clone()))
    }

    fn release(&self, user_id: &UserId, package_id: &PackageId) {
        self.claims
            .lock()
            .unwrap()
            .remove(&(*user_id, package_id.clone()));
    }
}

pub const VALID_SIGNATURE: &str = "valid";

pub struct FakeVerifier {
    pub event: VerifiedPaymentEvent,
}

impl PaymentEventVerifierPort for FakeVerifier {
    fn verify(&self, _payload: &[u8], signature_header: &str) -> AppResult<VerifiedPaymentEvent> {
        if signature_header != VALID_SIGNATURE {
            return Err(AppError::InvalidSignature {
                message: "mismatch".to_string(),
            });
        }
        Ok(self.event.clone())
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    pub failing: AtomicBool,
}

#[async_trait::async_trait]
impl TextGeneratorPort for FakeGenerator {
    async fn generate(&self, operation: MeteredOperation, prompt: &str) -> AppResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::GenerationFailed {
                message: "upstream 500".to_string(),
            });
        }
        Ok(format!("{operation}: {prompt}"))
    }
}
