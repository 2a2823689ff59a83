use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid credit amount: {0}")]
    InvalidCreditAmount(String),

    #[error("Invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("Invalid purchase id: {0}")]
    InvalidPurchaseId(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Unknown metered operation: {0}")]
    UnknownOperation(String),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
