use credit_ledger_application::error::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use std::{future::Future, time::Duration};
use tokio::time::timeout;

pub struct PostgresExecutor {
    timeout_secs: u64,
}

impl PostgresExecutor {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    fn timed_out() -> AppError {
        AppError::AccountUnavailable {
            message: "DB timeout".to_string(),
        }
    }

    pub async fn execute_with_timeout<T, F, Fut>(
        &self,
        operation: F,
        error_context: &str,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        timeout(Duration::from_secs(self.timeout_secs), operation())
            .await
            .map_err(|_| Self::timed_out())?
            .map_err(|e| AppError::AccountUnavailable {
                message: format!("{}: {}", error_context, e),
            })
    }

    /// Bounds a multi-statement unit of work, such as a whole transaction, by one deadline.
    pub async fn run_with_timeout<T, Fut>(&self, unit_of_work: Fut) -> AppResult<T>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        timeout(Duration::from_secs(self.timeout_secs), unit_of_work)
            .await
            .map_err(|_| Self::timed_out())?
    }
}

pub fn db_error(context: &str, e: &sqlx::Error) -> AppError {
    AppError::AccountUnavailable {
        message: format!("{}: {}", context, e),
    }
}

pub async fn begin_transaction(pool: &PgPool) -> AppResult<Transaction<'_, Postgres>> {
    pool.begin()
        .await
        .map_err(|e| db_error("Failed to begin transaction", &e))
}

pub async fn commit_transaction(tx: Transaction<'_, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| db_error("Failed to commit transaction", &e))
}
