use std::sync::Arc;

use tracing::instrument;

use crate::contracts::generation::GenerationResult;
use crate::error::{AppError, AppResult};
use crate::ports::incoming::credits::CreditGateUseCase;
use crate::ports::incoming::generation::GenerationUseCase;
use crate::ports::outgoing::text_generator::DynTextGeneratorPort;
use domain::auth::UserId;
use domain::metering::{MeteredOperation, OperationCosts};

const MAX_PROMPT_CHARS: usize = 8_000;

/// Runs a paid generation behind the credit gate.
///
/// The debit happens before the generator is called; a generator failure is
/// compensated with a refund of the same amount.
pub struct GenerationService {
    credit_gate: Arc<dyn CreditGateUseCase>,
    text_generator: DynTextGeneratorPort,
    costs: OperationCosts,
}

impl GenerationService {
    pub fn new(
        credit_gate: Arc<dyn CreditGateUseCase>,
        text_generator: DynTextGeneratorPort,
        costs: OperationCosts,
    ) -> Self {
        Self {
            credit_gate,
            text_generator,
            costs,
        }
    }

    fn validate_prompt(prompt: &str) -> AppResult<&str> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::ValidationError {
                message: "prompt cannot be empty".to_string(),
            });
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(AppError::ValidationError {
                message: format!("prompt exceeds {MAX_PROMPT_CHARS} characters"),
            });
        }
        Ok(prompt)
    }
}

#[async_trait::async_trait]
impl GenerationUseCase for GenerationService {
    #[instrument(skip(self, prompt), fields(user_id = %user_id, operation = %operation))]
    async fn generate(
        &self,
        user_id: &UserId,
        operation: MeteredOperation,
        prompt: &str,
    ) -> AppResult<GenerationResult> {
        let prompt = Self::validate_prompt(prompt)?;
        let cost = self.costs.cost_of(operation);

        let account = self.credit_gate.reserve_and_debit(user_id, cost).await?;

        match self.text_generator.generate(operation, prompt).await {
            Ok(text) => Ok(GenerationResult {
                operation,
                text,
                credits_spent: cost,
                remaining_balance: account.credit_balance,
            }),
            Err(e) => {
                tracing::warn!(error = %e, cost, "Generation failed, refunding credits");
                if let Err(refund_err) = self.credit_gate.refund(user_id, cost).await {
                    tracing::error!(
                        error = %refund_err,
                        cost,
                        "Refund after failed generation did not go through"
                    );
                }
                Err(AppError::GenerationFailed {
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::accounts::service::AccountService;
    use crate::ports::outgoing::account_store::DynAccountStorePort;
    use crate::test_support::{FakeAccountStore, FakeGenerator};

    fn service(store: &Arc<FakeAccountStore>, generator: &Arc<FakeGenerator>) -> GenerationService {
        let gate = AccountService::new(Arc::clone(store) as DynAccountStorePort, 0);
        GenerationService::new(
            Arc::new(gate),
            Arc::clone(generator) as DynTextGeneratorPort,
            OperationCosts::default(),
        )
    }

    #[tokio::test]
    async fn blog_post_costs_three_credits() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 5));
        let generator = Arc::new(FakeGenerator::default());

        let result = service(&store, &generator)
            .generate(&user, MeteredOperation::BlogPost, "rust ownership")
            .await
            .unwrap();

        assert_eq!(result.credits_spent, 3);
        assert_eq!(result.remaining_balance, 2);
        assert_eq!(result.text, "blog_post: rust ownership");
        assert_eq!(store.account(&user).unwrap().lifetime_used, 3);
    }

    #[tokio::test]
    async fn generator_failure_refunds_the_debit() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 5));
        let generator = Arc::new(FakeGenerator::default());
        generator.failing.store(true, Ordering::SeqCst);

        let err = service(&store, &generator)
            .generate(&user, MeteredOperation::BlogPost, "rust ownership")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationFailed { .. }));
        assert_eq!(store.balance(&user), Some(5));
    }

    #[tokio::test]
    async fn insufficient_credits_skips_the_generator() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 2));
        let generator = Arc::new(FakeGenerator::default());
        generator.failing.store(true, Ordering::SeqCst);

        let err = service(&store, &generator)
            .generate(&user, MeteredOperation::BlogPost, "rust ownership")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::InsufficientCredits {
                required: 3,
                available: 2
            }
        ));
        assert_eq!(store.account(&user).unwrap().lifetime_used, 0);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_debit() {
        let user = UserId::new();
        let store = Arc::new(FakeAccountStore::with_account(user, 5));
        let generator = Arc::new(FakeGenerator::default());

        let err = service(&store, &generator)
            .generate(&user, MeteredOperation::EmailGenerate, "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError { .. }));
        assert_eq!(store.balance(&user), Some(5));
    }
}
