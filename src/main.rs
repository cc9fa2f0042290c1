mod api;
mod config;
mod db;
mod error;
mod initiator;
mod mpesa;
mod payment;
mod receiver;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::InnerData,
    config::{Config, LogFormat},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();

    init_tracing(config.log_format);

    tracing::info!(
        environment = ?config.mpesa.environment,
        base_url = config.mpesa.base_url(),
        database = %config.database.path,
        "config loaded"
    );

    if config.mpesa.callback_token.is_none() {
        tracing::warn!(
            "no callback token configured, anyone who knows the callback URL can settle payments"
        );
    }

    let store = db::Store::open(&config.database)?;
    tracing::info!("mpesa_payments table ready");

    let mpesa = mpesa::Client::new(reqwest::Client::new(), config.mpesa);

    let data = Arc::new(InnerData { store, mpesa });

    api::serve(config.port, data).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}
