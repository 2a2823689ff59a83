use thiserror::Error;

use domain::error::DomainError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid package: {package_id}")]
    InvalidPackage { package_id: String },

    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: String },

    #[error("Invalid webhook signature: {message}")]
    InvalidSignature { message: String },

    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Account store unavailable: {message}")]
    AccountUnavailable { message: String },

    #[error("Payment provider unavailable: {message}")]
    PaymentProviderUnavailable { message: String },

    #[error("Malformed payment event: {message}")]
    MalformedEvent { message: String },

    #[error("Payment not verified: {message}")]
    PaymentNotVerified { message: String },

    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error")]
    InternalServerError,

    #[error("Unauthorized")]
    Unauthorized,
}

impl AppError {
    /// Whether the payment provider should redeliver a webhook that failed with this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::AccountUnavailable { .. } | AppError::UnknownUser { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
