use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
    Failed,
}

impl Status {
    /// Only an integer zero counts as success, anything else (including `"0"`) is a failure.
    pub fn from_result_code(code: &Value) -> Self {
        match code.as_i64() {
            Some(0) => Status::Completed,
            _ => Status::Failed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown payment status {0:?}")]
pub struct UnknownStatus(String);

/// Body accepted by `POST /api/mpesa/stkpush`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Request {
    #[serde(deserialize_with = "phone")]
    pub phone: String,
    pub amount: Decimal,
}

/// Puts a payer number in the `2547XXXXXXXX` shape Daraja expects. Formats only, never validates.
pub fn normalize_phone(raw: &str) -> String {
    let phone: String = raw.chars().filter(|c| *c != '+' && *c != ' ').collect();

    match phone.strip_prefix('0') {
        Some(local) => format!("254{local}"),
        None => phone,
    }
}

fn phone<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    let raw = match <Raw as serde::Deserialize>::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    };

    Ok(normalize_phone(&raw))
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub phone: String,
    pub amount: Decimal,
    pub checkout_request_id: Option<String>,
    pub merchant_request_id: Option<String>,
    pub status: Status,
    pub result_desc: Option<String>,
    pub provider_response: Option<Value>,
    pub callback_payload: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct NewPayment {
    pub phone: String,
    pub amount: Decimal,
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub provider_response: Value,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackEnvelope {
    pub body: CallbackBody,
}

#[derive(Debug, serde::Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: Value,
}

/// The fields of `Body.stkCallback` the receiver acts on.
#[derive(Debug, serde::Deserialize)]
pub struct StkCallback {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "ResultCode")]
    pub result_code: Value,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: Option<String>,
}

impl StkCallback {
    pub fn status(&self) -> Status {
        Status::from_result_code(&self.result_code)
    }
}
