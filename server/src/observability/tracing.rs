use std::{collections::HashMap, error::Error, io::stdout};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use credit_ledger_application::infrastructure_config::{Config, LogFormat};

const SERVICE_NAME: &str = "credit-ledger";

// Connection-pool and HTTP client chatter drowns out ledger events at debug.
const QUIET_DEPENDENCIES: &str = "sqlx=warn,hyper=warn,hyper_util=warn,reqwest=warn";

fn default_filter(level: &str) -> String {
    format!("{level},{QUIET_DEPENDENCIES}")
}

pub fn setup_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(&config.logging.level)))?;

    match config.logging.format {
        LogFormat::Json => {
            let default_fields = HashMap::from([(
                "environment".to_string(),
                serde_json::Value::String(config.environment.env.clone()),
            )]);
            let formatting_layer = BunyanFormattingLayer::with_default_fields(
                SERVICE_NAME.to_string(),
                stdout,
                default_fields,
            );

            tracing_subscriber::registry()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(formatting_layer)
                .try_init()?;
        }
        LogFormat::Pretty => {
            let format = fmt::format().with_target(true).compact();

            let mut subscriber = tracing_subscriber::fmt()
                .event_format(format)
                .with_env_filter(env_filter);

            if config.logging.include_location {
                subscriber = subscriber.with_file(true).with_line_number(true);
            }

            subscriber.try_init().map_err(|e| e as Box<dyn Error>)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_keeps_configured_level_and_quiets_dependencies() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("sqlx=warn"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
