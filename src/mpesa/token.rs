use secrecy::ExposeSecret;

use crate::{
    error::{Error, Result},
    mpesa::{Client, read_json},
};

impl Client {
    /// Exchanges the consumer key and secret for a short-lived bearer token.
    #[tracing::instrument(skip_all)]
    pub async fn access_token(&self) -> Result<String> {
        let res = self
            .http
            .get(self.url("/oauth/v1/generate?grant_type=client_credentials"))
            .basic_auth(
                &self.config.consumer_key,
                Some(self.config.consumer_secret.expose_secret()),
            )
            .send()
            .await?;

        let body = read_json(res).await?;

        body.get("access_token")
            .and_then(|t| t.as_str())
            .map(str::to_owned)
            .ok_or(Error::MissingField("access_token"))
    }
}
