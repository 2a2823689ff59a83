use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use credit_ledger_application::ports::outgoing::duplicate_guard::DuplicateGuardPort;
use domain::auth::UserId;
use domain::package::PackageId;

type ClaimKey = (UserId, PackageId);

const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

/// Time-boxed `(user, package)` claims held in process memory.
///
/// Expired claims are treated as absent on read; a background sweep only
/// reclaims memory.
#[derive(Debug, Clone)]
pub struct DashMapDuplicateGuard {
    claims: Arc<DashMap<ClaimKey, Instant>>,
    ttl: Duration,
}

impl DashMapDuplicateGuard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            claims: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Starts the periodic sweep. Must be called from within a Tokio runtime.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let claims = Arc::clone(&self.claims);
        let ttl = self.ttl;

        tokio::spawn(async move {
            let mut sweep_interval = interval(ttl.max(MIN_SWEEP_PERIOD));
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                sweep_interval.tick().await;
                let now = Instant::now();
                claims.retain(|_, claimed_at: &mut Instant| now.duration_since(*claimed_at) < ttl);
            }
        })
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    fn try_claim_at(&self, key: ClaimKey, now: Instant) -> bool {
        match self.claims.entry(key) {
            Entry::Occupied(mut occupied) => {
                if now.duration_since(*occupied.get()) < self.ttl {
                    false
                } else {
                    occupied.insert(now);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        }
    }
}

impl DuplicateGuardPort for DashMapDuplicateGuard {
    fn try_claim(&self, user_id: &UserId, package_id: &PackageId) -> bool {
        self.try_claim_at((*user_id, package_id.clone()), Instant::now())
    }

    fn release(&self, user_id: &UserId, package_id: &PackageId) {
        self.claims.remove(&(*user_id, package_id.clone()));
    }
}
