use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use time::OffsetDateTime;
use tracing::debug;

use credit_ledger_application::{
    contracts::payments::{CHECKOUT_SESSION_COMPLETED, PaymentEventKind, VerifiedPaymentEvent},
    error::{AppError, AppResult},
    ports::outgoing::payment_events::PaymentEventVerifierPort,
};

use super::types::{StripeCheckoutSession, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

/// Verifies `Stripe-Signature` headers of the form `t=<unix>,v1=<hex>[,v1=<hex>...]`.
///
/// The signed message is `"{t}."` followed by the exact request bytes, so the
/// payload must reach this type before any JSON parsing or re-encoding.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

struct SignatureHeader<'a> {
    timestamp: &'a str,
    signatures: Vec<&'a str>,
}

fn invalid(message: &str) -> AppError {
    AppError::InvalidSignature {
        message: message.to_string(),
    }
}

fn parse_header(header: &str) -> AppResult<SignatureHeader<'_>> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| invalid("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(invalid("missing v1 signature"));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> AppResult<Self> {
        if secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError {
                message: "webhook signing secret is not configured".to_string(),
            });
        }
        Ok(Self {
            secret,
            tolerance_secs,
        })
    }

    fn signed_mac(&self, timestamp: &str, payload: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AppError::ConfigError {
                message: "webhook signing secret is unusable".to_string(),
            })?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// Checks the signature as of `now`.
    pub fn verify_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: OffsetDateTime,
    ) -> AppResult<()> {
        let header = parse_header(signature_header)?;

        let issued_at: i64 = header
            .timestamp
            .parse()
            .map_err(|_| invalid("timestamp is not an integer"))?;
        let skew = now
            .unix_timestamp()
            .checked_sub(issued_at)
            .map(i64::unsigned_abs)
            .ok_or_else(|| invalid("timestamp out of range"))?;
        if skew > self.tolerance_secs.unsigned_abs() {
            return Err(invalid("timestamp outside tolerance"));
        }

        let mac = self.signed_mac(header.timestamp, payload)?;
        let matched = header.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(invalid("no signature matched"))
        }
    }

    pub fn parse_event(payload: &[u8]) -> AppResult<VerifiedPaymentEvent> {
        let event: StripeEvent = serde_json::from_slice(payload)?;

        let kind = if event.event_type == CHECKOUT_SESSION_COMPLETED {
            let session: StripeCheckoutSession = serde_json::from_value(event.data.object)?;
            PaymentEventKind::CheckoutCompleted(session.into_details()?)
        } else {
            PaymentEventKind::Other {
                event_type: event.event_type,
            }
        };

        Ok(VerifiedPaymentEvent {
            event_id: event.id,
            kind,
        })
    }
}

impl PaymentEventVerifierPort for StripeWebhookVerifier {
    fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<VerifiedPaymentEvent> {
        self.verify_signature_at(payload, signature_header, OffsetDateTime::now_utc())?;
        debug!("Webhook signature verified ({} bytes)", payload.len());
        Self::parse_event(payload).map_err(|e| AppError::MalformedEvent {
            message: e.to_string(),
        })
    }
}
