use axum::{body::Bytes, extract::State, http::StatusCode};

use crate::{
    api::{Data, Reply, failure, success},
    error::Error,
    initiator,
    payment::Request,
};

/// Always answers 200, the outcome is carried in the `success` flag.
pub async fn create(State(data): State<Data>, body: Bytes) -> Reply {
    let result = match serde_json::from_slice::<Request>(&body) {
        Ok(request) => initiator::handle(&data.store, &data.mpesa, request).await,
        Err(err) => Err(Error::InvalidRequest(err)),
    };

    match result {
        Ok(response) => success(Some(response)),
        Err(err) => {
            tracing::error!(%err, detail = %err.detail(), "stk_push_err");
            failure(StatusCode::OK, &err)
        }
    }
}
