use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use credit_ledger_adapters::outgoing::{
    dashmap_guard::duplicate_guard_dashmap::DashMapDuplicateGuard,
    llm_reqwest::text_generator_http::HttpTextGenerator,
    memory::account_store_memory::InMemoryAccountStoreAdapter,
    postgres_sqlx::account_store_postgres::PostgresAccountStoreAdapter,
    stripe_reqwest::{
        checkout_gateway::StripeCheckoutGateway, webhook_verifier::StripeWebhookVerifier,
    },
};
use credit_ledger_adapters::shared::app_state::AppState as AdaptersAppState;
use credit_ledger_application::error::AppError;
use credit_ledger_application::infrastructure_config::{Config, StoreBackend};
use credit_ledger_application::ports::incoming::{
    checkout::CheckoutUseCase,
    credits::{AccountUseCase, CreditGateUseCase},
    generation::GenerationUseCase,
    payments::{PaymentConfirmationUseCase, PaymentEventUseCase},
};
use credit_ledger_application::ports::outgoing::{
    account_store::DynAccountStorePort, duplicate_guard::DynDuplicateGuardPort,
    payment_events::DynPaymentEventVerifierPort, payment_gateway::DynPaymentGatewayPort,
    text_generator::DynTextGeneratorPort,
};
use credit_ledger_application::{
    accounts::service::AccountService,
    checkout::service::CheckoutService,
    generation::service::GenerationService,
    payments::{
        confirmation_service::{PaymentConfirmationDeps, PaymentConfirmationService},
        event_service::PaymentEventService,
    },
};
use domain::package::PackageCatalog;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    db_pool: Option<PgPool>,
    pub account_store: DynAccountStorePort,
    pub account_service: Arc<AccountService>,
    pub checkout_service: Arc<dyn CheckoutUseCase>,
    pub payment_event_service: Arc<dyn PaymentEventUseCase>,
    pub payment_confirmation_service: Arc<dyn PaymentConfirmationUseCase>,
    pub generation_service: Arc<dyn GenerationUseCase>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let catalog = Arc::new(config.package_catalog()?);

        let (db_pool, account_store) = Self::create_account_store(&config).await?;
        let payment_gateway: DynPaymentGatewayPort =
            Arc::new(StripeCheckoutGateway::new(&config.payments)?);

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&account_store),
            config.credits.starter_credits,
        ));
        let checkout_service = Arc::new(CheckoutService::new(
            Arc::clone(&catalog),
            Arc::clone(&account_store),
            Arc::clone(&payment_gateway),
            config.payments.clone(),
        ));
        let payment_event_service = Self::create_payment_event_service(&config, &account_store)?;
        let payment_confirmation_service = Self::create_payment_confirmation_service(
            &config,
            catalog,
            &account_store,
            payment_gateway,
        );
        let credit_gate: Arc<dyn CreditGateUseCase> = Arc::<AccountService>::clone(&account_service);
        let generation_service = Self::create_generation_service(&config, credit_gate)?;

        Ok(Self {
            config,
            db_pool,
            account_store,
            account_service,
            checkout_service,
            payment_event_service,
            payment_confirmation_service,
            generation_service,
        })
    }

    async fn create_account_store(
        config: &Config,
    ) -> Result<(Option<PgPool>, DynAccountStorePort), AppError> {
        match config.store.backend {
            StoreBackend::Memory => {
                let store: DynAccountStorePort = Arc::new(InMemoryAccountStoreAdapter::new());
                Ok((None, store))
            }
            StoreBackend::Postgres => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db.pool_size)
                    .acquire_timeout(Duration::from_secs(config.db.query_timeout_secs))
                    .connect(config.db.database_url())
                    .await
                    .map_err(|e| AppError::AccountUnavailable {
                        message: format!("Failed to connect to database: {e}"),
                    })?;

                sqlx::migrate!("../migrations")
                    .run(&db_pool)
                    .await
                    .map_err(|e| AppError::ConfigError {
                        message: format!("Failed to run database migrations: {e}"),
                    })?;
                info!("Database migrations applied");

                let store: DynAccountStorePort = Arc::new(PostgresAccountStoreAdapter::new(
                    db_pool.clone(),
                    config.db.query_timeout_secs,
                ));
                Ok((Some(db_pool), store))
            }
        }
    }

    fn create_payment_event_service(
        config: &Config,
        account_store: &DynAccountStorePort,
    ) -> Result<Arc<dyn PaymentEventUseCase>, AppError> {
        let verifier: DynPaymentEventVerifierPort = Arc::new(StripeWebhookVerifier::new(
            config.payments.webhook_secret.clone(),
            config.payments.signature_tolerance_secs,
        )?);
        Ok(Arc::new(PaymentEventService::new(
            verifier,
            Arc::clone(account_store),
        )))
    }

    fn create_payment_confirmation_service(
        config: &Config,
        catalog: Arc<PackageCatalog>,
        account_store: &DynAccountStorePort,
        payment_gateway: DynPaymentGatewayPort,
    ) -> Arc<dyn PaymentConfirmationUseCase> {
        let guard = DashMapDuplicateGuard::new(Duration::from_secs(
            config.confirmation.duplicate_guard_ttl_secs,
        ));
        // Detached; the sweeper lives as long as the runtime.
        let _sweeper = guard.spawn_sweeper();
        let duplicate_guard: DynDuplicateGuardPort = Arc::new(guard);

        Arc::new(PaymentConfirmationService::new(PaymentConfirmationDeps {
            catalog,
            account_store: Arc::clone(account_store),
            payment_gateway,
            duplicate_guard,
        }))
    }

    fn create_generation_service(
        config: &Config,
        credit_gate: Arc<dyn CreditGateUseCase>,
    ) -> Result<Arc<dyn GenerationUseCase>, AppError> {
        let text_generator: DynTextGeneratorPort =
            Arc::new(HttpTextGenerator::new(&config.generation)?);
        Ok(Arc::new(GenerationService::new(
            credit_gate,
            text_generator,
            config.credits.costs.to_costs(),
        )))
    }

    pub fn db_pool(&self) -> Option<&PgPool> {
        self.db_pool.as_ref()
    }

    pub fn to_adapters_state(self) -> AdaptersAppState {
        let account_use_case: Arc<dyn AccountUseCase> = self.account_service;
        AdaptersAppState::new(
            self.config,
            account_use_case,
            self.checkout_service,
            self.payment_event_service,
            self.payment_confirmation_service,
            self.generation_service,
            self.account_store,
        )
    }
}
