use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error, warn};

use credit_ledger_application::error::AppError;

pub struct HttpError(pub AppError);

impl HttpError {
    fn status_code_and_message(&self) -> (StatusCode, &'static str, String) {
        let app_error = &self.0;

        match app_error {
            AppError::Domain(_) => (StatusCode::BAD_REQUEST, "bad_request", app_error.to_string()),

            AppError::InvalidPackage { .. } => (
                StatusCode::BAD_REQUEST,
                "invalid_package",
                app_error.to_string(),
            ),

            AppError::UnknownUser { .. } => (
                StatusCode::NOT_FOUND,
                "unknown_user",
                "Account not found".to_string(),
            ),

            AppError::InvalidSignature { .. } => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                "Invalid signature".to_string(),
            ),

            AppError::InsufficientCredits { .. } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                app_error.to_string(),
            ),

            AppError::AccountUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "account_unavailable",
                "Account store unavailable".to_string(),
            ),

            AppError::PaymentProviderUnavailable { .. } => (
                StatusCode::BAD_GATEWAY,
                "payment_provider_unavailable",
                "Payment provider unavailable".to_string(),
            ),

            AppError::MalformedEvent { .. } => (
                StatusCode::BAD_REQUEST,
                "malformed_event",
                "Malformed payment event".to_string(),
            ),
            AppError::PaymentNotVerified { .. } => (
                StatusCode::CONFLICT,
                "payment_not_verified",
                "Payment could not be verified".to_string(),
            ),

            AppError::GenerationFailed { .. } => (
                StatusCode::BAD_GATEWAY,
                "generation_failed",
                "Generation failed, credits were refunded".to_string(),
            ),

            AppError::ValidationError { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                app_error.to_string(),
            ),

            AppError::JsonError(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_json",
                "Invalid JSON format".to_string(),
            ),

            AppError::ConfigError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Configuration error".to_string(),
            ),

            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error".to_string(),
            ),

            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status_code, code, message) = self.status_code_and_message();

        if status_code.is_server_error() {
            error!(code, "Server error response generated: {}", self.0);
        } else if matches!(self.0, AppError::InvalidSignature { .. }) {
            warn!(code, "Rejected request: {}", self.0);
        } else {
            debug!(code, "Client error response generated: {}", self.0);
        }

        let error_response = json!({
            "ok": false,
            "error": message,
            "code": code,
            "status": status_code.as_u16()
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<AppError> for HttpError {
    fn from(app_error: AppError) -> Self {
        HttpError(app_error)
    }
}
