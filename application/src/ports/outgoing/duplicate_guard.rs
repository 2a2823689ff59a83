use std::sync::Arc;

use domain::auth::UserId;
use domain::package::PackageId;

/// Short-lived, in-process suppression of repeated confirmation calls.
///
/// Best effort only: the durable purchase key in the account store decides
/// whether a grant happens. Losing an entry costs a redundant store call.
pub trait DuplicateGuardPort: Send + Sync {
    /// Returns `true` if the caller now holds the claim, `false` if an
    /// unexpired claim for the same key already exists.
    fn try_claim(&self, user_id: &UserId, package_id: &PackageId) -> bool;

    fn release(&self, user_id: &UserId, package_id: &PackageId);
}

pub type DynDuplicateGuardPort = Arc<dyn DuplicateGuardPort>;
