use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use domain::metering::OperationCosts;
use domain::package::{CreditPackage, PackageCatalog, PackageId};

const REDACTED: &str = "[REDACTED]";

fn redact(secret: &SecretString) -> &'static str {
    if secret.expose_secret().is_empty() {
        ""
    } else {
        REDACTED
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub store: StoreConfig,
    pub credits: CreditConfig,
    pub packages: Vec<PackageConfig>,
    pub payments: PaymentsConfig,
    pub confirmation: ConfirmationConfig,
    pub generation: GenerationConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: SecretString,
    pub pool_size: u32,
    pub query_timeout_secs: u64,
}

impl Serialize for DbConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DbConfig", 3)?;
        state.serialize_field("database_url", redact(&self.database_url))?;
        state.serialize_field("pool_size", &self.pool_size)?;
        state.serialize_field("query_timeout_secs", &self.query_timeout_secs)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DbConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DbConfigHelper {
            database_url: String,
            pool_size: u32,
            query_timeout_secs: u64,
        }

        let helper = DbConfigHelper::deserialize(deserializer)?;
        Ok(DbConfig {
            database_url: SecretString::from(helper.database_url),
            pool_size: helper.pool_size,
            query_timeout_secs: helper.query_timeout_secs,
        })
    }
}

impl DbConfig {
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let url_str = self.database_url.expose_secret();
        match url::Url::parse(url_str) {
            Ok(mut url) => {
                if url.password().is_some() {
                    url.set_password(Some("***")).ok();
                }
                url.to_string()
            }
            Err(_) => "[INVALID_URL]".to_string(),
        }
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        self.database_url.expose_secret()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditConfig {
    pub starter_credits: i64,
    pub costs: OperationCostsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationCostsConfig {
    pub blog_outline: i64,
    pub blog_post: i64,
    pub social_generate: i64,
    pub social_optimize: i64,
    pub email_generate: i64,
}

impl OperationCostsConfig {
    #[must_use]
    pub fn to_costs(&self) -> OperationCosts {
        OperationCosts {
            blog_outline: self.blog_outline,
            blog_post: self.blog_post,
            social_generate: self.social_generate,
            social_optimize: self.social_optimize,
            email_generate: self.email_generate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    pub id: String,
    pub name: String,
    pub credits: i64,
    pub price_minor_units: i64,
    #[serde(default)]
    pub external_price_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub api_base: String,
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
    pub currency: String,
    pub public_base_url: String,
    pub success_path: String,
    pub cancel_path: String,
    pub request_timeout_secs: u64,
    pub signature_tolerance_secs: i64,
}

impl Serialize for PaymentsConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PaymentsConfig", 9)?;
        state.serialize_field("api_base", &self.api_base)?;
        state.serialize_field("secret_key", redact(&self.secret_key))?;
        state.serialize_field("webhook_secret", redact(&self.webhook_secret))?;
        state.serialize_field("currency", &self.currency)?;
        state.serialize_field("public_base_url", &self.public_base_url)?;
        state.serialize_field("success_path", &self.success_path)?;
        state.serialize_field("cancel_path", &self.cancel_path)?;
        state.serialize_field("request_timeout_secs", &self.request_timeout_secs)?;
        state.serialize_field("signature_tolerance_secs", &self.signature_tolerance_secs)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PaymentsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct PaymentsConfigHelper {
            api_base: String,
            secret_key: String,
            webhook_secret: String,
            currency: String,
            public_base_url: String,
            success_path: String,
            cancel_path: String,
            request_timeout_secs: u64,
            signature_tolerance_secs: i64,
        }

        let helper = PaymentsConfigHelper::deserialize(deserializer)?;
        Ok(PaymentsConfig {
            api_base: helper.api_base,
            secret_key: SecretString::from(helper.secret_key),
            webhook_secret: SecretString::from(helper.webhook_secret),
            currency: helper.currency,
            public_base_url: helper.public_base_url,
            success_path: helper.success_path,
            cancel_path: helper.cancel_path,
            request_timeout_secs: helper.request_timeout_secs,
            signature_tolerance_secs: helper.signature_tolerance_secs,
        })
    }
}

impl PaymentsConfig {
    /// `{CHECKOUT_SESSION_ID}` is substituted by the provider on redirect.
    #[must_use]
    pub fn success_url(&self, package_id: &PackageId) -> String {
        format!(
            "{}{}?session_id={{CHECKOUT_SESSION_ID}}&package={}",
            self.public_base_url.trim_end_matches('/'),
            self.success_path,
            package_id
        )
    }

    #[must_use]
    pub fn cancel_url(&self) -> String {
        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            self.cancel_path
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    pub duplicate_guard_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: SecretString,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Serialize for GenerationConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("GenerationConfig", 5)?;
        state.serialize_field("endpoint", &self.endpoint)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("api_key", redact(&self.api_key))?;
        state.serialize_field("max_tokens", &self.max_tokens)?;
        state.serialize_field("request_timeout_secs", &self.request_timeout_secs)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for GenerationConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GenerationConfigHelper {
            endpoint: String,
            model: String,
            api_key: String,
            max_tokens: u32,
            request_timeout_secs: u64,
        }

        let helper = GenerationConfigHelper::deserialize(deserializer)?;
        Ok(GenerationConfig {
            endpoint: helper.endpoint,
            model: helper.model,
            api_key: SecretString::from(helper.api_key),
            max_tokens: helper.max_tokens,
            request_timeout_secs: helper.request_timeout_secs,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub client_requests_per_minute: u32,
    pub generation_requests_per_minute: u32,
    pub burst_size_multiplier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

fn default_packages() -> Vec<PackageConfig> {
    [
        ("starter", "Starter", 50, 499),
        ("basic", "Basic", 100, 999),
        ("pro", "Pro", 500, 3999),
        ("unlimited", "Unlimited", 2000, 9999),
    ]
    .into_iter()
    .map(|(id, name, credits, price)| PackageConfig {
        id: id.to_string(),
        name: name.to_string(),
        credits,
        price_minor_units: price,
        external_price_ref: None,
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origin: None,
            },
            db: DbConfig {
                database_url: SecretString::from(""),
                pool_size: 10,
                query_timeout_secs: 5,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
            },
            credits: CreditConfig {
                starter_credits: 10,
                costs: OperationCostsConfig {
                    blog_outline: 1,
                    blog_post: 3,
                    social_generate: 1,
                    social_optimize: 1,
                    email_generate: 1,
                },
            },
            packages: default_packages(),
            payments: PaymentsConfig {
                api_base: "https://api.stripe.com".to_string(),
                secret_key: SecretString::from(""),
                webhook_secret: SecretString::from(""),
                currency: "usd".to_string(),
                public_base_url: "http://localhost:5173".to_string(),
                success_path: "/payment/success".to_string(),
                cancel_path: "/pricing?canceled=true".to_string(),
                request_timeout_secs: 10,
                signature_tolerance_secs: 300,
            },
            confirmation: ConfirmationConfig {
                duplicate_guard_ttl_secs: 10,
            },
            generation: GenerationConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: SecretString::from(""),
                max_tokens: 2048,
                request_timeout_secs: 60,
            },
            auth: AuthConfig {
                user_header: "x-user-id".to_string(),
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                client_requests_per_minute: 120,
                generation_requests_per_minute: 20,
                burst_size_multiplier: 2,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    #[allow(clippy::too_many_lines)]
    pub fn validate(&self) -> AppResult<()> {
        if self.store.backend == StoreBackend::Postgres {
            if self.db.database_url.expose_secret().is_empty() {
                return Err(AppError::ConfigError {
                    message: "database_url cannot be empty with the postgres store".to_string(),
                });
            }

            if self.db.pool_size == 0 {
                return Err(AppError::ConfigError {
                    message: "db pool_size must be greater than 0".to_string(),
                });
            }
        }

        if self.db.query_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "query_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.credits.starter_credits < 0 {
            return Err(AppError::ConfigError {
                message: "starter_credits must be greater than or equal to 0".to_string(),
            });
        }

        let costs = &self.credits.costs;
        if [
            costs.blog_outline,
            costs.blog_post,
            costs.social_generate,
            costs.social_optimize,
            costs.email_generate,
        ]
        .iter()
        .any(|cost| *cost <= 0)
        {
            return Err(AppError::ConfigError {
                message: "operation costs must be greater than 0".to_string(),
            });
        }

        let mut seen_ids = HashSet::new();
        for package in &self.packages {
            if !seen_ids.insert(package.id.as_str()) {
                return Err(AppError::ConfigError {
                    message: format!("Duplicate package id: '{}'", package.id),
                });
            }
        }
        self.package_catalog()?;

        if self.payments.secret_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError {
                message: "payments secret_key cannot be empty".to_string(),
            });
        }

        if self.payments.webhook_secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError {
                message: "payments webhook_secret cannot be empty".to_string(),
            });
        }

        for (name, value) in [
            ("payments api_base", &self.payments.api_base),
            ("payments public_base_url", &self.payments.public_base_url),
            ("generation endpoint", &self.generation.endpoint),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(AppError::ConfigError {
                    message: format!("{name} is not a valid URL: '{value}'"),
                });
            }
        }

        if !self.payments.success_path.starts_with('/') || !self.payments.cancel_path.starts_with('/')
        {
            return Err(AppError::ConfigError {
                message: "success_path and cancel_path must start with '/'".to_string(),
            });
        }

        if self.payments.currency.len() != 3 {
            return Err(AppError::ConfigError {
                message: "currency must be a three-letter ISO code".to_string(),
            });
        }

        if self.payments.request_timeout_secs == 0 || self.generation.request_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "request timeouts must be greater than 0".to_string(),
            });
        }

        if self.payments.signature_tolerance_secs <= 0 {
            return Err(AppError::ConfigError {
                message: "signature_tolerance_secs must be greater than 0".to_string(),
            });
        }

        if self.confirmation.duplicate_guard_ttl_secs == 0 {
            return Err(AppError::ConfigError {
                message: "duplicate_guard_ttl_secs must be greater than 0".to_string(),
            });
        }

        if self.auth.user_header.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "auth user_header cannot be empty".to_string(),
            });
        }

        if self.rate_limit.enabled {
            if self.rate_limit.client_requests_per_minute == 0
                || self.rate_limit.generation_requests_per_minute == 0
            {
                return Err(AppError::ConfigError {
                    message: "Rate limit values must be greater than 0 when enabled".to_string(),
                });
            }

            if self.rate_limit.burst_size_multiplier == 0 {
                return Err(AppError::ConfigError {
                    message: "burst_size_multiplier must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn package_catalog(&self) -> AppResult<PackageCatalog> {
        let packages = self
            .packages
            .iter()
            .map(|package| -> AppResult<CreditPackage> {
                Ok(CreditPackage {
                    id: PackageId::parse(&package.id)?,
                    name: package.name.clone(),
                    credits: package.credits,
                    price_minor_units: package.price_minor_units,
                    external_price_ref: package
                        .external_price_ref
                        .clone()
                        .filter(|price_ref| !price_ref.trim().is_empty()),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PackageCatalog::new(packages)?)
    }

    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
