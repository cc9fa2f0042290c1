mod stk_push;
mod token;

use std::sync::Arc;

use reqwest::Response;
use serde_json::Value;

use crate::{
    config::MpesaConfig,
    error::{Error, Result},
};

/// Daraja API client. Cheap to clone, one instance is shared by every request.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<MpesaConfig>,
}

impl Client {
    pub fn new(http: reqwest::Client, config: MpesaConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }
}

/// Reads a provider response body as JSON, turning non-2xx replies into [`Error::Provider`].
async fn read_json(res: Response) -> Result<Value> {
    let status = res.status();
    let text = res.text().await?;

    tracing::debug!(%status, "mpesa_res");

    if !status.is_success() {
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        return Err(Error::Provider { status, body });
    }

    Ok(serde_json::from_str(&text)?)
}
