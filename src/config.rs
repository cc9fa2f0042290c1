use std::convert::Infallible;

use clap::{Args, Parser, ValueEnum};
use secrecy::SecretString;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "M-Pesa STK Push relay")]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub mpesa: MpesaConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    #[arg(long = "database-path", env = "DATABASE_PATH", default_value = "mpesa.db")]
    pub path: String,

    #[arg(long = "database-pool-size", env = "DATABASE_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Args)]
pub struct MpesaConfig {
    #[arg(long = "mpesa-environment", env = "MPESA_ENV", value_enum, default_value_t = Environment::Sandbox)]
    pub environment: Environment,

    /// Overrides the host picked by `--mpesa-environment`
    #[arg(long = "mpesa-base-url", env = "MPESA_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long = "mpesa-consumer-key", env = "MPESA_CONSUMER_KEY")]
    pub consumer_key: String,

    #[arg(long = "mpesa-consumer-secret", env = "MPESA_CONSUMER_SECRET", value_parser = secret, hide_env_values = true)]
    pub consumer_secret: SecretString,

    #[arg(long = "mpesa-shortcode", env = "MPESA_SHORTCODE")]
    pub shortcode: String,

    #[arg(long = "mpesa-passkey", env = "MPESA_PASSKEY", value_parser = secret, hide_env_values = true)]
    pub passkey: SecretString,

    #[arg(long = "mpesa-callback-url", env = "MPESA_CALLBACK_URL")]
    pub callback_url: String,

    #[arg(long = "mpesa-account-reference", env = "MPESA_ACCOUNT_REFERENCE", default_value = "EPICARE")]
    pub account_reference: String,

    #[arg(long = "mpesa-transaction-desc", env = "MPESA_TRANSACTION_DESC", default_value = "Donation")]
    pub transaction_desc: String,

    /// Shared token the provider must echo back as `?token=` on callbacks
    #[arg(long = "mpesa-callback-token", env = "MPESA_CALLBACK_TOKEN", value_parser = secret, hide_env_values = true)]
    pub callback_token: Option<SecretString>,
}

impl MpesaConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.environment.base_url())
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.safaricom.co.ke",
            Environment::Production => "https://api.safaricom.co.ke",
        }
    }
}

fn secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::new(value.to_owned()))
}
