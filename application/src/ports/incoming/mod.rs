pub mod checkout;
pub mod credits;
pub mod generation;
pub mod payments;
