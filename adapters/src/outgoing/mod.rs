pub mod dashmap_guard;
pub mod llm_reqwest;
pub mod memory;
pub mod postgres_sqlx;
pub mod stripe_reqwest;
