use dotenvy::dotenv;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Runtime configuration, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub secret: String,
    pub bind_addr: String,
    pub stripe_secret_key: Option<String>,
    pub admin_password: Option<String>,
    pub default_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv().ok();

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            secret: required("SECRET")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "thb".into()),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}
