use axum::{Json, extract::State};
use axum_valid::Valid;

use domain::metering::MeteredOperation;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    BadGatewayResponse, PaymentRequiredResponse, RateLimitExceededResponse, UnauthorizedResponse,
    ValidationErrorResponse,
};
#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::{
    core::extractors::AuthenticatedUser,
    dto::{
        requests::GenerateRequest,
        responses::{ApiResponse, GenerationResponse},
    },
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

type GenerationReply = Result<Json<ApiResponse<GenerationResponse>>, HttpError>;

async fn run(
    state: &AppState,
    user: AuthenticatedUser,
    operation: MeteredOperation,
    request: &GenerateRequest,
) -> GenerationReply {
    let result = state
        .generation_use_case
        .generate(&user.0, operation, &request.prompt)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        GenerationResponse::from(result),
    ))))
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/generate/blog/outline",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Outline generated", body = ApiResponseValue),
        (status = 401, response = UnauthorizedResponse),
        (status = 402, response = PaymentRequiredResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "generation",
    summary = "Generate a blog outline (1 credit by default)"
))]
pub async fn generate_blog_outline(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> GenerationReply {
    run(&state, user, MeteredOperation::BlogOutline, &request).await
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/generate/blog/post",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Blog post generated", body = ApiResponseValue),
        (status = 401, response = UnauthorizedResponse),
        (status = 402, response = PaymentRequiredResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "generation",
    summary = "Generate a full blog post (3 credits by default)"
))]
pub async fn generate_blog_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> GenerationReply {
    run(&state, user, MeteredOperation::BlogPost, &request).await
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/generate/social",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Social post generated", body = ApiResponseValue),
        (status = 401, response = UnauthorizedResponse),
        (status = 402, response = PaymentRequiredResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "generation",
    summary = "Generate a social media post"
))]
pub async fn generate_social(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> GenerationReply {
    run(&state, user, MeteredOperation::SocialGenerate, &request).await
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/generate/social/optimize",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Social post rewritten", body = ApiResponseValue),
        (status = 401, response = UnauthorizedResponse),
        (status = 402, response = PaymentRequiredResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "generation",
    summary = "Optimize an existing social media post"
))]
pub async fn optimize_social(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> GenerationReply {
    run(&state, user, MeteredOperation::SocialOptimize, &request).await
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/generate/email",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Email generated", body = ApiResponseValue),
        (status = 401, response = UnauthorizedResponse),
        (status = 402, response = PaymentRequiredResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 502, response = BadGatewayResponse)
    ),
    tag = "generation",
    summary = "Generate an email"
))]
pub async fn generate_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> GenerationReply {
    run(&state, user, MeteredOperation::EmailGenerate, &request).await
}
