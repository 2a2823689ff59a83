use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use credit_ledger_application::{
    error::{AppError, AppResult},
    ports::outgoing::account_store::AccountStorePort,
};
use domain::auth::UserId;
use domain::credits::CreditAccount;
use domain::package::PackageId;
use domain::purchase::{GrantOutcome, PurchaseGrant};

use super::utils::{PostgresExecutor, begin_transaction, commit_transaction, db_error};

const ACCOUNT_COLUMNS: &str = "user_id, credit_balance, lifetime_used, plan_tag, updated_at";

pub struct PostgresAccountStoreAdapter {
    pool: PgPool,
    executor: PostgresExecutor,
}

impl PostgresAccountStoreAdapter {
    pub fn new(pool: PgPool, query_timeout_secs: u64) -> Self {
        Self {
            pool,
            executor: PostgresExecutor::new(query_timeout_secs),
        }
    }

    fn account_from_row(row: &PgRow) -> AppResult<CreditAccount> {
        let column_error = |column: &str, e: sqlx::Error| AppError::AccountUnavailable {
            message: format!("Failed to get {}: {}", column, e),
        };

        let user_id: uuid::Uuid = row
            .try_get("user_id")
            .map_err(|e| column_error("user_id", e))?;
        let credit_balance: i64 = row
            .try_get("credit_balance")
            .map_err(|e| column_error("credit_balance", e))?;
        let lifetime_used: i64 = row
            .try_get("lifetime_used")
            .map_err(|e| column_error("lifetime_used", e))?;
        let plan_tag: Option<String> = row
            .try_get("plan_tag")
            .map_err(|e| column_error("plan_tag", e))?;
        let updated_at: OffsetDateTime = row
            .try_get("updated_at")
            .map_err(|e| column_error("updated_at", e))?;

        Ok(CreditAccount {
            user_id: UserId::from_uuid(user_id),
            credit_balance,
            lifetime_used,
            plan_tag: plan_tag.as_deref().map(PackageId::parse).transpose()?,
            updated_at,
        })
    }

    fn unknown_user(user_id: &UserId) -> AppError {
        AppError::UnknownUser {
            user_id: user_id.to_string(),
        }
    }

    async fn apply_grant_in_transaction(&self, grant: &PurchaseGrant) -> AppResult<GrantOutcome> {
        let mut tx = begin_transaction(&self.pool).await?;

        // Row lock serializes concurrent grants and debits for this account.
        let locked = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(grant.user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock account", &e))?;

        let Some(locked) = locked else {
            return Err(Self::unknown_user(&grant.user_id));
        };

        let recorded = sqlx::query(
            r"
            INSERT INTO applied_purchases (purchase_id, user_id, package_id, credits, source, applied_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (purchase_id) DO NOTHING
            ",
        )
        .bind(grant.purchase_id.as_str())
        .bind(grant.user_id.as_uuid())
        .bind(grant.package_id.as_str())
        .bind(grant.credits)
        .bind(grant.source.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to record purchase", &e))?;

        if recorded.rows_affected() == 0 {
            let account = Self::account_from_row(&locked)?;
            commit_transaction(tx).await?;
            return Ok(GrantOutcome::AlreadyApplied(account));
        }

        let row = sqlx::query(&format!(
            r"
            UPDATE accounts
            SET credit_balance = credit_balance + $2, plan_tag = $3, updated_at = now()
            WHERE user_id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(grant.user_id.as_uuid())
        .bind(grant.credits)
        .bind(grant.package_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to credit account", &e))?;

        let account = Self::account_from_row(&row)?;
        commit_transaction(tx).await?;

        Ok(GrantOutcome::Applied(account))
    }
}

#[async_trait::async_trait]
impl AccountStorePort for PostgresAccountStoreAdapter {
    #[instrument(skip(self))]
    async fn open_account(
        &self,
        user_id: &UserId,
        starter_credits: i64,
    ) -> AppResult<CreditAccount> {
        let query = format!(
            r"
            INSERT INTO accounts (user_id, credit_balance, lifetime_used, created_at, updated_at)
            VALUES ($1, $2, 0, now(), now())
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {ACCOUNT_COLUMNS}
            "
        );
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .bind(starter_credits.max(0))
                        .fetch_one(&self.pool)
                },
                &format!("Failed to open account for user {}", user_id),
            )
            .await?;

        Self::account_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1");
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to get account for user {}", user_id),
            )
            .await?;

        row.as_ref().map(Self::account_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn debit_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let query = format!(
            r"
            UPDATE accounts
            SET credit_balance = credit_balance - $2,
                lifetime_used = lifetime_used + $2,
                updated_at = now()
            WHERE user_id = $1 AND credit_balance >= $2
            RETURNING {ACCOUNT_COLUMNS}
            "
        );
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .bind(amount)
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to debit credits for user {}", user_id),
            )
            .await?;

        if let Some(row) = row {
            let account = Self::account_from_row(&row)?;
            debug!(
                "Debited {} credits for user {}, {} remaining",
                amount, user_id, account.credit_balance
            );
            return Ok(account);
        }

        // The conditional update matched nothing: either no account or not enough credits.
        let current = self
            .get_account(user_id)
            .await?
            .ok_or_else(|| Self::unknown_user(user_id))?;

        Err(AppError::InsufficientCredits {
            required: amount,
            available: current.credit_balance,
        })
    }

    #[instrument(skip(self))]
    async fn refund_credits(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let query = format!(
            r"
            UPDATE accounts
            SET credit_balance = credit_balance + $2, updated_at = now()
            WHERE user_id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "
        );
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .bind(amount)
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to refund credits for user {}", user_id),
            )
            .await?
            .ok_or_else(|| Self::unknown_user(user_id))?;

        Self::account_from_row(&row)
    }

    #[instrument(skip(self, grant), fields(purchase_id = %grant.purchase_id, user_id = %grant.user_id))]
    async fn apply_grant(&self, grant: &PurchaseGrant) -> AppResult<GrantOutcome> {
        let outcome = self
            .executor
            .run_with_timeout(self.apply_grant_in_transaction(grant))
            .await?;

        debug!(
            "Grant {} for user {} from {}: applied={}",
            grant.purchase_id,
            grant.user_id,
            grant.source.as_str(),
            outcome.was_applied()
        );

        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> AppResult<()> {
        self.executor
            .execute_with_timeout(
                || sqlx::query("SELECT 1").execute(&self.pool),
                "Failed to reach database",
            )
            .await
            .map(|_| ())
    }
}
