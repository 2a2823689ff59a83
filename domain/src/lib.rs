pub mod auth;
pub mod credits;
pub mod error;
pub mod metering;
pub mod package;
pub mod purchase;
