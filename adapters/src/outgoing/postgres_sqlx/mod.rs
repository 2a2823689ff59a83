pub mod account_store_postgres;
pub mod utils;
