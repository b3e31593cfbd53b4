use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub suppliers: SuppliersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_batch_limit")]
    pub batch_limit: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_poll_interval() -> u64 {
    600
}

fn default_batch_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    #[serde(default = "default_cache_seconds")]
    pub settings_cache_seconds: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            settings_cache_seconds: default_cache_seconds(),
        }
    }
}

fn default_cache_seconds() -> u64 {
    30
}

/// One entry per supplier integration. A missing entry leaves the
/// supplier registered but unconfigured; it then rejects purchases with a
/// fixed message instead of erroring.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SuppliersConfig {
    pub dataxpress: Option<SupplierEndpointConfig>,
    pub hubnet: Option<SupplierEndpointConfig>,
    pub datakazina: Option<SupplierEndpointConfig>,
    pub codecraft: Option<SupplierEndpointConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupplierEndpointConfig {
    pub base_url: String,
    pub api_key: String,
    pub agent_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Then the current environment's file, if it exists
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Then a local, uncommitted override file
            .add_source(config::File::with_name("config/local").required(false))
            // Finally the environment, e.g. VOLTA__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("VOLTA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
