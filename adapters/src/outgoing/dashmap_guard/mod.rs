pub mod duplicate_guard_dashmap;
