use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    mpesa::{Client, read_json},
};

const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Payload of `POST /mpesa/stkpush/v1/processrequest`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'a str,
    amount: Decimal,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    call_back_url: &'a str,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

/// A payment request the provider has taken on.
#[derive(Debug)]
pub struct Accepted {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    /// Provider response as received.
    pub raw: Value,
}

impl Client {
    #[tracing::instrument(skip_all, fields(phone = %phone))]
    pub async fn stk_push(&self, token: &str, phone: &str, amount: Decimal) -> Result<Accepted> {
        let request = self.stk_push_request(phone, amount, Utc::now());

        let res = self
            .http
            .post(self.url("/mpesa/stkpush/v1/processrequest"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let raw = read_json(res).await?;

        let checkout_request_id = raw
            .get("CheckoutRequestID")
            .and_then(Value::as_str)
            .ok_or(Error::MissingField("CheckoutRequestID"))?
            .to_owned();

        let merchant_request_id = raw
            .get("MerchantRequestID")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Ok(Accepted {
            checkout_request_id,
            merchant_request_id,
            raw,
        })
    }

    fn stk_push_request<'a>(
        &'a self,
        phone: &'a str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> StkPushRequest<'a> {
        let config = &*self.config;
        let timestamp = timestamp(now);

        StkPushRequest {
            business_short_code: &config.shortcode,
            password: password(&config.shortcode, config.passkey.expose_secret(), &timestamp),
            timestamp,
            transaction_type: TRANSACTION_TYPE,
            amount,
            party_a: phone,
            party_b: &config.shortcode,
            phone_number: phone,
            call_back_url: &config.callback_url,
            account_reference: &config.account_reference,
            transaction_desc: &config.transaction_desc,
        }
    }
}

/// `YYYYMMDDHHMMSS`, the only timestamp format Daraja accepts.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

pub fn password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}
