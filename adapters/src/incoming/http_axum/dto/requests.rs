use serde::{Deserialize, Serialize};
#[cfg(feature = "docs")]
use utoipa::ToSchema;
use validator::Validate;

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Start a hosted checkout for one credit package from the catalog.",
    example = json!({ "packageId": "pro" })
))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[validate(length(min = 1, max = 64, message = "packageId must be 1-64 characters"))]
    pub package_id: String,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Confirm a completed checkout from the success page. sessionId is the value the provider substituted into the success URL.",
    example = json!({ "packageId": "pro", "sessionId": "cs_test_a1B2c3" })
))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 64, message = "packageId must be 1-64 characters"))]
    pub package_id: String,
    #[validate(length(min = 1, max = 255, message = "sessionId must be 1-255 characters"))]
    pub session_id: String,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Prompt for a metered generation.",
    example = json!({ "prompt": "Ownership and borrowing for Python developers" })
))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 8000, message = "prompt must be 1-8000 characters"))]
    pub prompt: String,
}
