use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    NotFoundResponse, ServiceUnavailableResponse, UnauthorizedResponse,
};
#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::{
    core::extractors::AuthenticatedUser,
    dto::responses::{ApiResponse, CreditsResponse},
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/accounts",
    responses(
        (status = 201, description = "Account opened, or the existing account returned unchanged", body = ApiResponseValue,
         example = json!({ "ok": true, "data": { "creditBalance": 10, "lifetimeUsed": 0, "planTag": null } })
        ),
        (status = 401, response = UnauthorizedResponse),
        (status = 503, response = ServiceUnavailableResponse)
    ),
    tag = "credits",
    summary = "Open a credit account",
    description = "Called once the authentication service has registered the user. Grants the starter credits on first call and is a no-op afterwards."
))]
#[instrument(skip(state), fields(user_id = %user.0))]
pub async fn open_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<ApiResponse<CreditsResponse>>), HttpError> {
    let account = state.account_use_case.open_account(&user.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_data(Some(CreditsResponse::from(
            &account,
        )))),
    ))
}

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/credits",
    responses(
        (status = 200, description = "Current balance, lifetime usage and plan tag", body = ApiResponseValue,
         example = json!({ "ok": true, "data": { "creditBalance": 42, "lifetimeUsed": 8, "planTag": "basic" } })
        ),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    ),
    tag = "credits",
    summary = "Get credit balance"
))]
#[instrument(skip(state), fields(user_id = %user.0))]
pub async fn get_credits(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<CreditsResponse>>, HttpError> {
    let account = state.account_use_case.get_credits(&user.0).await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        CreditsResponse::from(&account),
    ))))
}
