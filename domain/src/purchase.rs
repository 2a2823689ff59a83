use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::auth::UserId;
use crate::credits::CreditAccount;
use crate::error::{DomainError, DomainResult};
use crate::package::PackageId;

const MAX_PURCHASE_ID_LEN: usize = 255;

/// Provider-issued checkout session id.
///
/// Both crediting paths key their grant on this value, so a purchase is
/// applied at most once regardless of which path gets there first. Only the
/// provider's id alphabet (`[A-Za-z0-9_]`) is accepted, which keeps the value
/// usable verbatim as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PurchaseId(String);

impl PurchaseId {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let id = raw.trim();
        if id.is_empty()
            || id.len() > MAX_PURCHASE_ID_LEN
            || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::InvalidPurchaseId(raw.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PurchaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSource {
    Webhook,
    Confirmation,
}

impl GrantSource {
    pub fn as_str(self) -> &'static str {
        match self {
            GrantSource::Webhook => "webhook",
            GrantSource::Confirmation => "confirmation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseGrant {
    pub purchase_id: PurchaseId,
    pub user_id: UserId,
    pub package_id: PackageId,
    pub credits: i64,
    pub source: GrantSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Applied(CreditAccount),
    AlreadyApplied(CreditAccount),
}

impl GrantOutcome {
    pub fn account(&self) -> &CreditAccount {
        match self {
            GrantOutcome::Applied(account) | GrantOutcome::AlreadyApplied(account) => account,
        }
    }

    pub fn into_account(self) -> CreditAccount {
        match self {
            GrantOutcome::Applied(account) | GrantOutcome::AlreadyApplied(account) => account,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, GrantOutcome::Applied(_))
    }
}
