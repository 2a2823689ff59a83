use axum::{extract::FromRequestParts, http::request::Parts};

use credit_ledger_application::error::AppError;
use domain::auth::UserId;

use crate::incoming::http_axum::error_mapper::HttpError;
use crate::shared::app_state::AppState;

/// Caller identity asserted by the upstream authentication gateway.
///
/// The header name comes from `auth.user_header`; a missing or non-UUID value
/// is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_name = state.config.auth.user_header.as_str();

        let user_id = parts
            .headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .ok_or(HttpError(AppError::Unauthorized))?;

        Ok(Self(user_id))
    }
}
