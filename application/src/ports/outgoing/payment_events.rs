use std::sync::Arc;

use crate::contracts::payments::VerifiedPaymentEvent;
use crate::error::AppResult;

pub trait PaymentEventVerifierPort: Send + Sync {
    /// Checks `signature_header` against the exact received bytes before parsing.
    fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<VerifiedPaymentEvent>;
}

pub type DynPaymentEventVerifierPort = Arc<dyn PaymentEventVerifierPort>;
