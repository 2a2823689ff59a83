use axum::{Json, extract::State, http::StatusCode};

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::dto::responses::{ApiResponse, HealthResponse};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service up and account store reachable", body = ApiResponseValue,
         example = json!({ "ok": true, "data": { "status": "ok", "store": "reachable" } })
        ),
        (status = 503, description = "Account store unreachable", body = ApiResponseValue,
         example = json!({ "ok": false, "data": { "status": "degraded", "store": "unreachable" } })
        )
    ),
    tag = "system",
    summary = "Liveness and account store probe",
    operation_id = "health_check"
))]
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    match state.account_store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success_with_data(Some(HealthResponse {
                status: "ok",
                store: "reachable",
            }))),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed to reach account store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    ok: false,
                    error: None,
                    data: Some(HealthResponse {
                        status: "degraded",
                        store: "unreachable",
                    }),
                }),
            )
        }
    }
}
