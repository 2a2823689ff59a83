use credit_ledger_application::infrastructure_config::{Config, RateLimitConfig, StoreBackend};
use tracing::info;

pub fn print_api_info(config: &Config) {
    print_api_documentation_info(config);
    print_configuration_info(config);
    print_rate_limiting_info(config);
}

fn print_api_documentation_info(config: &Config) {
    let base_url = format!("http://{}", config.server_address());
    if cfg!(feature = "docs") {
        info!("📋 API Documentation:");
        info!("  📖 Swagger UI: {}/docs", base_url);
        info!("  📄 OpenAPI JSON: {}/api-docs/openapi.json", base_url);
    }
    info!("  🔔 Payment webhook: {}/webhooks/stripe", base_url);
}

fn print_configuration_info(config: &Config) {
    info!("⚙️  Configuration:");
    print_store_configuration(config);
    print_credit_configuration(config);
    info!(
        "  🔒 Confirmation guard TTL: {}s",
        config.confirmation.duplicate_guard_ttl_secs
    );
    info!("  🪪 Caller identity header: {}", config.auth.user_header);
}

fn print_store_configuration(config: &Config) {
    match config.store.backend {
        StoreBackend::Postgres => {
            info!("  🗄️  Account store: PostgreSQL with connection pooling");
        }
        StoreBackend::Memory => info!("  🗄️  Account store: in-memory (non-durable)"),
    }
}

fn print_credit_configuration(config: &Config) {
    info!("  🎁 Starter credits: {}", config.credits.starter_credits);
    for package in &config.packages {
        info!(
            "  📦 Package {}: {} credits for {} {}",
            package.id,
            package.credits,
            package.price_minor_units,
            config.payments.currency
        );
    }
}

fn print_rate_limiting_info(config: &Config) {
    if config.rate_limit.enabled {
        info!("  🚦 Rate Limiting: ENABLED");
        print_rate_limits(&config.rate_limit);
    } else {
        info!("  🚦 Rate Limiting: DISABLED");
    }
}

fn print_rate_limits(rate_limit: &RateLimitConfig) {
    info!(
        "    • Client: {}/min per IP (burst: {})",
        rate_limit.client_requests_per_minute,
        rate_limit.client_requests_per_minute * rate_limit.burst_size_multiplier
    );
    info!(
        "    • Generation: {}/min per IP (burst: {})",
        rate_limit.generation_requests_per_minute,
        rate_limit.generation_requests_per_minute * rate_limit.burst_size_multiplier
    );
}
