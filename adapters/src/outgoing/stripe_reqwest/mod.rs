pub mod checkout_gateway;
pub mod types;
pub mod webhook_verifier;
