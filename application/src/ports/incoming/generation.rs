use crate::contracts::generation::GenerationResult;
use crate::error::AppResult;
use domain::auth::UserId;
use domain::metering::MeteredOperation;

#[async_trait::async_trait]
pub trait GenerationUseCase: Send + Sync {
    async fn generate(
        &self,
        user_id: &UserId,
        operation: MeteredOperation,
        prompt: &str,
    ) -> AppResult<GenerationResult>;
}
