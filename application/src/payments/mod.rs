pub mod confirmation_service;
pub mod event_service;
