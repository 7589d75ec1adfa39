use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::repositories::BackoffPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

/// Settings shared by every service binary.
///
/// Each section is read from `ROBOTSHOP_*` environment variables; a
/// binary only uses the sections its stores need.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub dynamodb: DynamoDbConfig,
    pub catalogue: CatalogueClientConfig,
    pub retry: RetryConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub go_slow_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default = "default_cart_ttl")]
    pub cart_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub dynamodb_endpoint: Option<String>,
    #[serde(default = "default_products_table")]
    pub products_table_name: String,
    #[serde(default = "default_users_table")]
    pub users_table_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueClientConfig {
    #[serde(default = "default_catalogue_host")]
    pub catalogue_host: String,
    #[serde(default = "default_catalogue_port")]
    pub catalogue_port: u16,
    #[serde(default = "default_catalogue_timeout_ms")]
    pub catalogue_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_otlp_endpoint_option")]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_enable_json_logging")]
    pub enable_json_logging: bool,
}

impl Config {
    /// Load every section, defaulting the service name to `service`
    pub fn from_environment(service: &str) -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let config = Config {
            server: load_section("server", None)?,
            redis: load_section("redis", None)?,
            dynamodb: load_section("dynamodb", None)?,
            catalogue: load_section("catalogue client", None)?,
            retry: load_section("retry", None)?,
            observability: load_section("observability", Some(service))?,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        if self.redis.cart_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Cart TTL cannot be 0".to_string(),
            });
        }

        if self.dynamodb.products_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Products table name cannot be empty".to_string(),
            });
        }

        if self.dynamodb.users_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Users table name cannot be empty".to_string(),
            });
        }

        if self.retry.retry_initial_delay_ms == 0
            || self.retry.retry_max_delay_ms < self.retry.retry_initial_delay_ms
        {
            return Err(ConfigError::ValidationError {
                message: "Retry delays must be positive and max >= initial".to_string(),
            });
        }

        Ok(())
    }
}

fn load_section<T: serde::de::DeserializeOwned>(
    section: &str,
    service_name: Option<&str>,
) -> Result<T, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(service_name) = service_name {
        builder = builder
            .set_default("service_name", service_name)
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to set {} defaults: {}", section, e),
            })?;
    }

    let settings = builder
        .add_source(config::Environment::with_prefix("ROBOTSHOP"))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn go_slow(&self) -> Duration {
        Duration::from_millis(self.go_slow_ms)
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    pub fn cart_ttl(&self) -> Duration {
        Duration::from_secs(self.cart_ttl_seconds)
    }
}

impl DynamoDbConfig {
    /// Build a DynamoDB client for the configured region and optional endpoint
    pub async fn client(&self) -> DynamoDbClient {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = self.dynamodb_endpoint {
            info!("Using DynamoDB endpoint override: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        DynamoDbClient::from_conf(builder.build())
    }
}

impl CatalogueClientConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.catalogue_host, self.catalogue_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.catalogue_timeout_ms)
    }
}

impl RetryConfig {
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_initial_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_redis_host() -> String {
    std::env::var("REDIS_HOST").unwrap_or_else(|_| "redis".to_string())
}

pub(crate) fn default_redis_port() -> u16 {
    6379
}

pub(crate) fn default_cart_ttl() -> u64 {
    3600
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_products_table() -> String {
    "RobotShopProducts".to_string()
}

pub(crate) fn default_users_table() -> String {
    "RobotShopUsers".to_string()
}

pub(crate) fn default_catalogue_host() -> String {
    std::env::var("CATALOGUE_HOST").unwrap_or_else(|_| "catalogue".to_string())
}

pub(crate) fn default_catalogue_port() -> u16 {
    8080
}

pub(crate) fn default_catalogue_timeout_ms() -> u64 {
    5000
}

pub(crate) fn default_retry_initial_delay_ms() -> u64 {
    2000
}

pub(crate) fn default_retry_max_delay_ms() -> u64 {
    30_000
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_otlp_endpoint_option() -> Option<String> {
    std::env::var("ROBOTSHOP_OTLP_ENDPOINT").ok()
}

pub(crate) fn default_enable_json_logging() -> bool {
    std::env::var("ROBOTSHOP_ENABLE_JSON_LOGGING")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}
