use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;

use crate::{
    api::{Data, Reply, failure, success},
    error::Error,
};

pub async fn get(State(data): State<Data>, Path(checkout_request_id): Path<String>) -> Reply {
    match data.store.find_by_checkout_id(&checkout_request_id).await {
        Ok(Some(record)) => match serde_json::to_value(record) {
            Ok(record) => success(Some(record)),
            Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &Error::from(err)),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "payment not found" })),
        ),
        Err(err) => {
            tracing::error!(%err, %checkout_request_id, "payment_lookup_err");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    }
}
