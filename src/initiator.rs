use serde_json::Value;

use crate::{
    db::Store,
    error::Result,
    mpesa,
    payment::{NewPayment, Request},
};

/// Sends the STK Push prompt and records it as pending once the provider accepts it.
///
/// Nothing is written unless the provider hands back a CheckoutRequestID, so a
/// failure at any step leaves the table untouched.
#[tracing::instrument(skip_all, fields(phone = %request.phone, amount = %request.amount))]
pub async fn handle(store: &Store, client: &mpesa::Client, request: Request) -> Result<Value> {
    let token = client.access_token().await?;

    let accepted = client
        .stk_push(&token, &request.phone, request.amount)
        .await?;

    let id = store
        .insert_pending(NewPayment {
            phone: request.phone,
            amount: request.amount,
            checkout_request_id: accepted.checkout_request_id.clone(),
            merchant_request_id: accepted.merchant_request_id,
            provider_response: accepted.raw.clone(),
        })
        .await?;

    tracing::info!(id, checkout_request_id = %accepted.checkout_request_id, "stk_push_pending");

    Ok(accepted.raw)
}
