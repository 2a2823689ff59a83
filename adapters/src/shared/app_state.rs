use std::sync::Arc;

use credit_ledger_application::{
    infrastructure_config::Config,
    ports::{
        incoming::{
            checkout::CheckoutUseCase,
            credits::AccountUseCase,
            generation::GenerationUseCase,
            payments::{PaymentConfirmationUseCase, PaymentEventUseCase},
        },
        outgoing::account_store::DynAccountStorePort,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub account_use_case: Arc<dyn AccountUseCase>,
    pub checkout_use_case: Arc<dyn CheckoutUseCase>,
    pub payment_event_use_case: Arc<dyn PaymentEventUseCase>,
    pub payment_confirmation_use_case: Arc<dyn PaymentConfirmationUseCase>,
    pub generation_use_case: Arc<dyn GenerationUseCase>,
    pub account_store: DynAccountStorePort,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        account_use_case: Arc<dyn AccountUseCase>,
        checkout_use_case: Arc<dyn CheckoutUseCase>,
        payment_event_use_case: Arc<dyn PaymentEventUseCase>,
        payment_confirmation_use_case: Arc<dyn PaymentConfirmationUseCase>,
        generation_use_case: Arc<dyn GenerationUseCase>,
        account_store: DynAccountStorePort,
    ) -> Self {
        Self {
            config,
            account_use_case,
            checkout_use_case,
            payment_event_use_case,
            payment_confirmation_use_case,
            generation_use_case,
            account_store,
        }
    }
}
