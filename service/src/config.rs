use std::fmt;

/// Process configuration, read once at startup from the environment
/// (optionally seeded by a `.env` file). Missing or malformed values fail
/// fast rather than falling back to a guessed default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub kafka_bootstrap_servers: String,
    pub outbox_poll_frequency_sec: u64,
    pub pool_rebalancer_poll_frequency_sec: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing required env var {key}"),
            ConfigError::Invalid(key, msg) => write!(f, "invalid value for {key}: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env("PORT", "8080")?;
        let database_url = require_env("DATABASE_URL")?;
        let kafka_bootstrap_servers = require_env("KAFKA_BOOTSTRAP_SERVERS")?;
        let outbox_poll_frequency_sec = parse_env("TRANSFER_OUTBOX_POLL_FREQUENCY_SEC", "5")?;
        let pool_rebalancer_poll_frequency_sec =
            parse_env("POOL_REBALANCER_POLL_FREQUENCY_SEC", "30")?;

        Ok(Self {
            port,
            database_url,
            kafka_bootstrap_servers,
            outbox_poll_frequency_sec,
            pool_rebalancer_poll_frequency_sec,
        })
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|_| ConfigError::Invalid(key, raw))
}
