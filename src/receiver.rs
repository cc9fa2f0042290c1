use serde_json::Value;

use crate::{
    db::{Settlement, Store},
    error::{Error, Result},
    payment::{CallbackEnvelope, StkCallback},
};

/// Applies a provider callback to the pending payment it refers to.
///
/// A callback that matches no pending row is not an error, it simply updates nothing.
#[tracing::instrument(skip_all)]
pub async fn handle(store: &Store, body: &[u8]) -> Result<()> {
    let envelope: CallbackEnvelope = serde_json::from_slice(body).map_err(Error::MalformedCallback)?;
    let payload: Value = envelope.body.stk_callback;
    let callback: StkCallback =
        serde_json::from_value(payload.clone()).map_err(Error::MalformedCallback)?;

    let status = callback.status();

    let updated = store
        .settle(Settlement {
            checkout_request_id: &callback.checkout_request_id,
            merchant_request_id: callback.merchant_request_id.as_deref(),
            status,
            result_desc: callback.result_desc.as_deref(),
            callback_payload: &payload,
        })
        .await?;

    match updated {
        0 => tracing::warn!(checkout_request_id = %callback.checkout_request_id, %status, "callback_unmatched"),
        _ => tracing::info!(checkout_request_id = %callback.checkout_request_id, %status, updated, "callback_applied"),
    }

    Ok(())
}
