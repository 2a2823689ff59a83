pub mod account_store;
pub mod duplicate_guard;
pub mod payment_events;
pub mod payment_gateway;
pub mod text_generator;
