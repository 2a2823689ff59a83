pub mod account_store_memory;
