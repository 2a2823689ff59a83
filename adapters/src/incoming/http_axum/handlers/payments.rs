use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use axum_valid::Valid;
use tracing::instrument;

use credit_ledger_application::error::AppError;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    BadGatewayResponse, BadRequestResponse, NotFoundResponse, RateLimitExceededResponse,
    ServiceUnavailableResponse, UnauthorizedResponse, ValidationErrorResponse,
};
#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::{
    core::extractors::AuthenticatedUser,
    dto::{
        requests::ConfirmPaymentRequest,
        responses::{ApiResponse, ConfirmPaymentResponse, WebhookAckResponse},
    },
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/webhooks/stripe",
    request_body(content = String, description = "Raw event payload exactly as sent by the provider", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac-sha256>")
    ),
    responses(
        (status = 200, description = "Event acknowledged: applied, already applied, or ignored", body = ApiResponseValue,
         example = json!({ "ok": true, "data": { "received": true, "outcome": "applied" } })
        ),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    ),
    tag = "payments",
    summary = "Payment provider webhook",
    description = "Verifies the signature against the raw body, then applies completed checkouts exactly once. Non-2xx responses make the provider redeliver."
))]
#[instrument(skip(state, headers, body), fields(payload_len = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookAckResponse>>, HttpError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            HttpError(AppError::InvalidSignature {
                message: "missing signature header".to_string(),
            })
        })?;

    let outcome = state
        .payment_event_use_case
        .handle_event(&body, signature)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        WebhookAckResponse::from(&outcome),
    ))))
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/payments/confirm",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Credits applied, or already applied earlier", body = ApiResponseValue,
         example = json!({
             "ok": true,
             "data": { "creditBalance": 110, "planTag": "basic", "applied": true, "message": "Credits added successfully" }
         })
        ),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, description = "Checkout session is not paid or belongs to another purchase"),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse)
    ),
    tag = "payments",
    summary = "Confirm a completed checkout",
    description = "Client-side fallback for the webhook. Safe to call repeatedly; a purchase is credited at most once across both paths."
))]
#[instrument(skip(state, request), fields(user_id = %user.0, package_id = %request.package_id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<ConfirmPaymentRequest>>,
) -> Result<Json<ApiResponse<ConfirmPaymentResponse>>, HttpError> {
    let receipt = state
        .payment_confirmation_use_case
        .confirm_payment(&user.0, &request.package_id, &request.session_id)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        ConfirmPaymentResponse::from(receipt),
    ))))
}
