use reqwest::StatusCode;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("provider responded with {status}")]
    Provider { status: StatusCode, body: Value },

    #[error("provider response is missing {0}")]
    MissingField(&'static str),

    #[error("malformed callback: {0}")]
    MalformedCallback(#[source] serde_json::Error),

    #[error("invalid request body: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Blocking(#[from] tokio::task::JoinError),
}

impl Error {
    /// Value reported back to the caller in the `error` field.
    ///
    /// Provider rejections carry the provider's own body, everything else its message.
    pub fn detail(&self) -> Value {
        match self {
            Error::Provider { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}
