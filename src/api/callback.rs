use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use secrecy::ExposeSecret;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::{
    api::{Data, Reply, failure, success},
    receiver,
};

#[derive(Debug, serde::Deserialize)]
pub struct CallbackQuery {
    token: Option<String>,
}

pub async fn receive(
    State(data): State<Data>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    body: Bytes,
) -> Reply {
    if let Some(expected) = &data.mpesa.config().callback_token {
        // an unparseable query carries no usable token
        let given = match &query {
            Ok(Query(query)) => query.token.as_deref().unwrap_or_default(),
            Err(err) => {
                tracing::debug!(%err, "callback_query");
                ""
            }
        };

        if !bool::from(given.as_bytes().ct_eq(expected.expose_secret().as_bytes())) {
            tracing::warn!("callback_rejected");

            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "error": "invalid callback token" })),
            );
        }
    }

    match receiver::handle(&data.store, &body).await {
        Ok(()) => success(None),
        Err(err) => {
            tracing::error!(%err, "callback_err");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    }
}
