use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;

use crate::auth::UserId;
use crate::error::{DomainError, DomainResult};
use crate::package::PackageId;

/// Spendable balance of one user.
///
/// `credit_balance` never goes below zero and `lifetime_used` only grows by
/// the exact amounts debited. Stores apply these methods inside a single
/// atomic unit; they are never combined across two round trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditAccount {
    pub user_id: UserId,
    pub credit_balance: i64,
    pub lifetime_used: i64,
    pub plan_tag: Option<PackageId>,
    pub updated_at: OffsetDateTime,
}

impl CreditAccount {
    pub fn open(user_id: UserId, starter_credits: i64, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            credit_balance: starter_credits.max(0),
            lifetime_used: 0,
            plan_tag: None,
            updated_at: now,
        }
    }

    pub fn can_afford(&self, cost: i64) -> bool {
        self.credit_balance >= cost
    }

    pub fn debit(&mut self, cost: i64, now: OffsetDateTime) -> Result<(), InsufficientCreditsError> {
        if !self.can_afford(cost) {
            return Err(InsufficientCreditsError {
                required: cost,
                available: self.credit_balance,
            });
        }

        self.credit_balance -= cost;
        self.lifetime_used = self.lifetime_used.saturating_add(cost);
        self.updated_at = now;
        Ok(())
    }

    pub fn grant(&mut self, credits: i64, package_id: PackageId, now: OffsetDateTime) {
        self.credit_balance = self.credit_balance.saturating_add(credits);
        self.plan_tag = Some(package_id);
        self.updated_at = now;
    }

    pub fn refund(&mut self, credits: i64, now: OffsetDateTime) {
        self.credit_balance = self.credit_balance.saturating_add(credits);
        self.updated_at = now;
    }
}

pub fn ensure_positive_amount(amount: i64) -> DomainResult<i64> {
    if amount <= 0 {
        return Err(DomainError::InvalidCreditAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientCreditsError {
    pub required: i64,
    pub available: i64,
}

impl Display for InsufficientCreditsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Insufficient credits: required {}, available {}",
            self.required, self.available
        )
    }
}

impl Error for InsufficientCreditsError {}
