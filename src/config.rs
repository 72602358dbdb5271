use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, ensure};
use dotenvy::dotenv;

/// Where users and attendance records live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// `DATABASE_URL=memory`, process-local and lost on restart
    Memory,
    MySql(String),
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub store: StoreBackend,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// seconds
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    pub log_level: String,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{key} must be set"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let store = if database_url.eq_ignore_ascii_case("memory") {
            StoreBackend::Memory
        } else {
            StoreBackend::MySql(database_url)
        };

        let config = Self {
            server_addr: required(&lookup, "SERVER_ADDR")?,
            store,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 3600)?,

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
        };

        ensure!(
            config.rate_login_per_min > 0
                && config.rate_register_per_min > 0
                && config.rate_protected_per_min > 0,
            "rate limits must be greater than zero"
        );
        ensure!(config.access_token_ttl > 0, "ACCESS_TOKEN_TTL must be greater than zero");
        ensure!(config.db_max_connections > 0, "DB_MAX_CONNECTIONS must be greater than zero");

        Ok(config)
    }
}
