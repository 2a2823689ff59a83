use axum::{Json, extract::State};
use axum_valid::Valid;
use tracing::instrument;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    BadGatewayResponse, BadRequestResponse, NotFoundResponse, RateLimitExceededResponse,
    UnauthorizedResponse, ValidationErrorResponse,
};
#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::{
    core::extractors::AuthenticatedUser,
    dto::{
        requests::CreateCheckoutRequest,
        responses::{ApiResponse, CheckoutSessionResponse},
    },
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/checkout/sessions",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created; redirect the browser to url", body = ApiResponseValue,
         example = json!({
             "ok": true,
             "data": { "sessionId": "cs_test_a1B2c3", "url": "https://checkout.stripe.com/c/pay/cs_test_a1B2c3" }
         })
        ),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "checkout",
    summary = "Start checkout for a credit package"
))]
#[instrument(skip(state, request), fields(user_id = %user.0, package_id = %request.package_id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<CreateCheckoutRequest>>,
) -> Result<Json<ApiResponse<CheckoutSessionResponse>>, HttpError> {
    let session = state
        .checkout_use_case
        .create_session(&user.0, &request.package_id)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        CheckoutSessionResponse::from(session),
    ))))
}
