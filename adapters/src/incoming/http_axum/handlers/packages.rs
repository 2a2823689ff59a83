use axum::{Json, extract::State};

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::dto::responses::{ApiResponse, PackageResponse};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/packages",
    responses(
        (status = 200, description = "Purchasable credit packages", body = ApiResponseValue,
         example = json!({
             "ok": true,
             "data": [
                 { "id": "basic", "name": "Basic", "credits": 100, "priceMinorUnits": 999 },
                 { "id": "pro", "name": "Pro", "credits": 500, "priceMinorUnits": 3999 }
             ]
         })
        )
    ),
    tag = "checkout",
    summary = "List credit packages"
))]
pub async fn list_packages(State(state): State<AppState>) -> Json<ApiResponse<Vec<PackageResponse>>> {
    let packages = state
        .checkout_use_case
        .list_packages()
        .iter()
        .map(PackageResponse::from)
        .collect();

    Json(ApiResponse::success_with_data(Some(packages)))
}
