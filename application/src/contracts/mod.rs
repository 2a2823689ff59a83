pub mod generation;
pub mod payments;
