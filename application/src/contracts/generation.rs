use domain::metering::MeteredOperation;

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub operation: MeteredOperation,
    pub text: String,
    pub credits_spent: i64,
    pub remaining_balance: i64,
}
