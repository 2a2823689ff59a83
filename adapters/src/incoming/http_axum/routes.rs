use axum::{
    Router,
    routing::{get, post},
};
#[cfg(feature = "docs")]
use utoipa::OpenApi;
#[cfg(feature = "docs")]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::docs::ApiDoc;
use crate::incoming::http_axum::{
    handlers::{
        accounts::{get_credits, open_account},
        checkout::create_checkout_session,
        generation::{
            generate_blog_outline, generate_blog_post, generate_email, generate_social,
            optimize_social,
        },
        health::health_check,
        packages::list_packages,
        payments::{confirm_payment, stripe_webhook},
    },
    middleware::rate_limit::{create_client_rate_limiter, create_generation_rate_limiter},
    router_ext::RouterExt,
};
use crate::shared::app_state::AppState;

/// Must be called from within a Tokio runtime when rate limiting is enabled,
/// since each limiter spawns its cleanup task.
pub fn build_application_router(state: &AppState) -> Router<AppState> {
    let core_routes = build_core_routes();
    let webhook_routes = build_webhook_routes();
    let client_routes = build_client_routes(state);
    let generation_routes = build_generation_routes(state);

    core_routes
        .merge(webhook_routes)
        .merge(client_routes)
        .merge(generation_routes)
        .with_request_id()
}

fn build_core_routes() -> Router<AppState> {
    let router = Router::new().route("/health", get(health_check));

    #[cfg(feature = "docs")]
    {
        router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    #[cfg(not(feature = "docs"))]
    {
        router
    }
}

// Provider redeliveries must never be throttled.
fn build_webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(stripe_webhook))
}

fn build_client_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/accounts", post(open_account))
        .route("/credits", get(get_credits))
        .route("/packages", get(list_packages))
        .route("/checkout/sessions", post(create_checkout_session))
        .route("/payments/confirm", post(confirm_payment));

    let limiter = state
        .config
        .rate_limit
        .enabled
        .then(|| create_client_rate_limiter(&state.config.rate_limit));

    routes.with_optional_rate_limit(limiter)
}

fn build_generation_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/generate/blog/outline", post(generate_blog_outline))
        .route("/generate/blog/post", post(generate_blog_post))
        .route("/generate/social", post(generate_social))
        .route("/generate/social/optimize", post(optimize_social))
        .route("/generate/email", post(generate_email));

    let limiter = state
        .config
        .rate_limit
        .enabled
        .then(|| create_generation_rate_limiter(&state.config.rate_limit));

    routes.with_optional_rate_limit(limiter)
}
