#[cfg(any(
    feature = "adapters",
    feature = "axum",
    feature = "sqlx",
    feature = "reqwest"
))]
compile_error!("application must not depend on adapters/framework crates");

pub mod accounts;
pub mod checkout;
pub mod contracts;
pub mod error;
pub mod generation;
pub mod infrastructure_config;
pub mod payments;
pub mod ports;

#[cfg(test)]
mod test_support;
