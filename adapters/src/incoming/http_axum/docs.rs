use crate::incoming::http_axum::{dto, handlers};
use dto::common_responses::{
    BadGatewayResponse, BadRequestResponse, NotFoundResponse, PaymentRequiredResponse,
    RateLimitExceededResponse, ServiceUnavailableResponse, UnauthorizedResponse,
    ValidationErrorResponse,
};
use dto::requests::{ConfirmPaymentRequest, CreateCheckoutRequest, GenerateRequest};
use dto::responses::{
    ApiResponseValue, CheckoutSessionResponse, ConfirmPaymentResponse, CreditsResponse,
    GenerationResponse, HealthResponse, PackageResponse, WebhookAckResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::accounts::open_account,
        handlers::accounts::get_credits,
        handlers::packages::list_packages,
        handlers::checkout::create_checkout_session,
        handlers::payments::stripe_webhook,
        handlers::payments::confirm_payment,
        handlers::generation::generate_blog_outline,
        handlers::generation::generate_blog_post,
        handlers::generation::generate_social,
        handlers::generation::optimize_social,
        handlers::generation::generate_email,
    ),
    components(
        schemas(
            ApiResponseValue,
            CreateCheckoutRequest,
            ConfirmPaymentRequest,
            GenerateRequest,
            CreditsResponse,
            PackageResponse,
            CheckoutSessionResponse,
            ConfirmPaymentResponse,
            WebhookAckResponse,
            GenerationResponse,
            HealthResponse
        ),
        responses(
            BadRequestResponse,
            RateLimitExceededResponse,
            UnauthorizedResponse,
            PaymentRequiredResponse,
            NotFoundResponse,
            ValidationErrorResponse,
            BadGatewayResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = "credits", description = "Credit accounts - open an account and read the current balance"),
        (name = "checkout", description = "Credit package catalog and hosted checkout sessions with the payment provider"),
        (name = "payments", description = "Payment reconciliation - provider webhook and client-side confirmation, both crediting a purchase at most once"),
        (name = "generation", description = "Metered text generation - each call debits credits before running and refunds on failure"),
        (name = "system", description = "System health and status monitoring")
    ),
    info(
        title = "Credit Ledger API",
        description = "Prepaid credit ledger with payment reconciliation. Callers are identified by the configured user header; client and generation routes are rate limited per IP (RateLimit-Limit, RateLimit-Remaining, RateLimit-Reset, Retry-After).",
        contact(
            name = "Credit Ledger",
        ),
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server"),
    )
)]
pub struct ApiDoc;
