mod callback;
mod payment;
mod stk_push;
mod util;

use std::{net::Ipv4Addr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{Json, Router, http::Request, http::StatusCode, routing};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::{db::Store, error::Error, mpesa};

pub type Data = Arc<InnerData>;

pub struct InnerData {
    pub store: Store,
    pub mpesa: mpesa::Client,
}

pub fn router(data: Data) -> Router {
    let layer = tower_http::trace::TraceLayer::new_for_http()
        .on_request(|request: &Request<_>, _: &tracing::Span| {
            tracing::debug!(method = ?request.method(), url = ?request.uri(), "req");
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, _: &tracing::Span| {
                tracing::debug!(status = ?response.status(), ?latency, "res");
            },
        );

    Router::new()
        .route("/api/mpesa", routing::get(util::index))
        .route("/api/mpesa/stkpush", routing::post(stk_push::create))
        .route("/api/mpesa/callback", routing::post(callback::receive))
        .route("/api/mpesa/payments/{checkout_request_id}", routing::get(payment::get))
        .layer(layer)
        .with_state(data)
}

pub async fn serve(port: u16, data: Data) -> Result<()> {
    tracing::info!("starting API");

    let socket = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    tracing::info!("binding to network socket on {port}");

    axum::serve(socket, router(data))
        .with_graceful_shutdown(util::shutdown_signal())
        .await?;

    tracing::info!("API stopped");

    Ok(())
}

type Reply = (StatusCode, Json<Value>);

fn success(data: Option<Value>) -> Reply {
    let body = match data {
        Some(data) => json!({ "success": true, "data": data }),
        None => json!({ "success": true }),
    };

    (StatusCode::OK, Json(body))
}

fn failure(status: StatusCode, err: &Error) -> Reply {
    (status, Json(json!({ "success": false, "error": err.detail() })))
}
