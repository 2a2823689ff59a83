// keep public for OpenAPI docs
pub mod accounts;
pub mod checkout;
pub mod generation;
pub mod health;
pub mod packages;
pub mod payments;
