use credit_ledger_application::error::{AppError, AppResult};
use credit_ledger_application::infrastructure_config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use std::fs;
use std::path::Path;
use tracing::info;

pub const ENV_PREFIX: &str = "CREDIT_LEDGER_";

const TOML_FILE: &str = "config.toml";
const JSON_FILE: &str = "config.json";
const ENV_FILE: &str = ".env";
const ENV_TEMPLATE_FILE: &str = ".env.example";

/// Defaults, then `config.toml`, then `config.json`, then `CREDIT_LEDGER_*`
/// variables with `__` separating nested keys.
pub fn load_config() -> AppResult<Config> {
    generate_env_template_if_missing()?;

    let figment = file_layers(Figment::from(Serialized::defaults(Config::default())))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config = extract(&figment)?;
    config.validate()?;
    Ok(config)
}

fn file_layers(mut figment: Figment) -> Figment {
    if Path::new(TOML_FILE).exists() {
        figment = figment.merge(Toml::file(TOML_FILE));
    }
    if Path::new(JSON_FILE).exists() {
        figment = figment.merge(Json::file(JSON_FILE));
    }
    figment
}

fn extract(figment: &Figment) -> AppResult<Config> {
    figment.extract().map_err(|e| AppError::ConfigError {
        message: format!("Failed to load configuration: {e}"),
    })
}

fn generate_env_template_if_missing() -> AppResult<()> {
    if Path::new(ENV_FILE).exists() || !Path::new(ENV_TEMPLATE_FILE).exists() {
        return Ok(());
    }

    fs::copy(ENV_TEMPLATE_FILE, ENV_FILE).map_err(|e| AppError::ConfigError {
        message: format!("Failed to generate {ENV_FILE} from {ENV_TEMPLATE_FILE}: {e}"),
    })?;

    info!("Generated {ENV_FILE} from template. Set the payment and generation secrets before going live.");

    Ok(())
}
