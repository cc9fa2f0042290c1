use axum::Json;
use serde_json::{Value, json};

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "M-Pesa STK Push relay",
        "endpoints": {
            "stkPush": "POST /api/mpesa/stkpush",
            "callback": "POST /api/mpesa/callback",
            "payment": "GET /api/mpesa/payments/{checkoutRequestId}",
        }
    }))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(?err, "ctrl_c_handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(?err, "sigterm_handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
