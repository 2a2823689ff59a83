use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use credit_ledger_application::{
    contracts::payments::{CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest},
    error::{AppError, AppResult},
    infrastructure_config::PaymentsConfig,
    ports::outgoing::payment_gateway::PaymentGatewayPort,
};
use domain::purchase::PurchaseId;

use super::types::{StripeCheckoutSession, StripeErrorEnvelope};

const CHECKOUT_SESSIONS_PATH: &str = "/v1/checkout/sessions";

/// Hosted checkout through the provider's REST API.
pub struct StripeCheckoutGateway {
    client: Client,
    api_base: String,
    secret_key: SecretString,
    currency: String,
}

fn provider_unavailable(message: String) -> AppError {
    AppError::PaymentProviderUnavailable { message }
}

impl StripeCheckoutGateway {
    pub fn new(config: &PaymentsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError {
                message: format!("Failed to create payment HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}{}", self.api_base, CHECKOUT_SESSIONS_PATH)
    }

    /// Form fields for `POST /v1/checkout/sessions`, in the bracketed notation the API expects.
    pub fn session_form(&self, request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let package = &request.package;
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "client_reference_id".to_string(),
                request.metadata.user_id.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        match &package.external_price_ref {
            Some(price_ref) => {
                form.push(("line_items[0][price]".to_string(), price_ref.clone()));
            }
            None => {
                form.extend([
                    (
                        "line_items[0][price_data][currency]".to_string(),
                        self.currency.clone(),
                    ),
                    (
                        "line_items[0][price_data][unit_amount]".to_string(),
                        package.price_minor_units.to_string(),
                    ),
                    (
                        "line_items[0][price_data][product_data][name]".to_string(),
                        format!("{} ({} credits)", package.name, package.credits),
                    ),
                ]);
            }
        }

        for (key, value) in request.metadata.to_pairs() {
            form.push((format!("metadata[{key}]"), value));
        }

        form
    }

    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<StripeErrorEnvelope>().await {
            Ok(envelope) => format!(
                "{} ({}): {}",
                status,
                envelope.error.error_type.unwrap_or_default(),
                envelope.error.message.unwrap_or_default()
            ),
            Err(_) => format!("provider responded with {}", status),
        }
    }

    async fn read_session(response: Response) -> AppResult<StripeCheckoutSession> {
        response
            .json::<StripeCheckoutSession>()
            .await
            .map_err(|e| provider_unavailable(format!("Unreadable checkout session: {}", e)))
    }
}

#[async_trait::async_trait]
impl PaymentGatewayPort for StripeCheckoutGateway {
    #[instrument(skip(self, request), fields(package_id = %request.package.id, user_id = %request.metadata.user_id))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let response = self
            .client
            .post(self.sessions_url())
            .bearer_auth(self.secret_key.expose_secret())
            .form(&self.session_form(request))
            .send()
            .await
            .map_err(|e| provider_unavailable(format!("Checkout request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(provider_unavailable(Self::error_message(response).await));
        }

        let session = Self::read_session(response).await?;
        let redirect_url = session
            .url
            .clone()
            .ok_or_else(|| provider_unavailable("Checkout session has no redirect URL".to_string()))?;

        debug!("Created checkout session {}", session.id);

        Ok(CheckoutSession {
            session_id: PurchaseId::parse(&session.id)?,
            redirect_url,
        })
    }

    #[instrument(skip(self), fields(purchase_id = %session_id))]
    async fn retrieve_checkout_session(
        &self,
        session_id: &PurchaseId,
    ) -> AppResult<CheckoutSessionDetails> {
        let response = self
            .client
            .get(format!("{}/{}", self.sessions_url(), session_id.as_str()))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| provider_unavailable(format!("Session lookup failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::PaymentNotVerified {
                message: format!("unknown checkout session {}", session_id),
            });
        }
        if !response.status().is_success() {
            return Err(provider_unavailable(Self::error_message(response).await));
        }

        Self::read_session(response).await?.into_details()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_ledger_application::contracts::payments::PurchaseMetadata;
    use credit_ledger_application::infrastructure_config::Config;
    use domain::auth::UserId;
    use domain::package::{CreditPackage, PackageId};

    fn request(price_ref: Option<&str>) -> CheckoutSessionRequest {
        let package = CreditPackage {
            id: PackageId::parse("basic").unwrap(),
            name: "Basic".to_string(),
            credits: 100,
            price_minor_units: 999,
            external_price_ref: price_ref.map(ToString::to_string),
        };
        CheckoutSessionRequest {
            metadata: PurchaseMetadata::for_package(UserId::new(), &package),
            package,
            success_url: "https://app.example/payment/success".to_string(),
            cancel_url: "https://app.example/pricing".to_string(),
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn inline_price_when_no_external_reference() {
        let gateway = StripeCheckoutGateway::new(&Config::default().payments).unwrap();
        let form = gateway.session_form(&request(None));

        assert_eq!(field(&form, "mode"), Some("payment"));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("999"));
        assert_eq!(field(&form, "line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(field(&form, "metadata[package_id]"), Some("basic"));
        assert_eq!(field(&form, "metadata[credits]"), Some("100"));
        assert!(field(&form, "line_items[0][price]").is_none());
    }

    #[test]
    fn external_price_reference_replaces_inline_price() {
        let gateway = StripeCheckoutGateway::new(&Config::default().payments).unwrap();
        let form = gateway.session_form(&request(Some("price_123")));

        assert_eq!(field(&form, "line_items[0][price]"), Some("price_123"));
        assert!(field(&form, "line_items[0][price_data][unit_amount]").is_none());
    }
}
