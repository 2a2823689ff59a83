use std::sync::Arc;

use crate::error::AppResult;
use domain::metering::MeteredOperation;

#[async_trait::async_trait]
pub trait TextGeneratorPort: Send + Sync {
    async fn generate(&self, operation: MeteredOperation, prompt: &str) -> AppResult<String>;
}

pub type DynTextGeneratorPort = Arc<dyn TextGeneratorPort>;
