use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params, types::Type};
use serde_json::Value;

use crate::{
    config::DatabaseConfig,
    error::Result,
    payment::{NewPayment, Record, Status},
};

const MEMORY: &str = ":memory:";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mpesa_payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    phone TEXT NOT NULL,
    amount TEXT NOT NULL,
    checkout_request_id TEXT,
    merchant_request_id TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    result_desc TEXT,
    provider_response TEXT,
    callback_payload TEXT,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS mpesa_payments_checkout_request_id
    ON mpesa_payments (checkout_request_id);
";

/// Shared handle over the `mpesa_payments` table.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

/// Result of a callback, applied to the pending row it refers to.
pub struct Settlement<'a> {
    pub checkout_request_id: &'a str,
    pub merchant_request_id: Option<&'a str>,
    pub status: Status,
    pub result_desc: Option<&'a str>,
    pub callback_payload: &'a Value,
}

impl Store {
    /// Opens the pool and creates the table if it is missing.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let pool = match config.path.as_str() {
            // every `:memory:` connection is its own database, so keep exactly one alive forever
            MEMORY => Pool::builder()
                .max_size(1)
                .max_lifetime(None)
                .idle_timeout(None)
                .build(SqliteConnectionManager::memory())?,
            path => Pool::builder()
                .max_size(config.pool_size.max(1))
                .build(SqliteConnectionManager::file(path))?,
        };

        pool.get()?.execute_batch(SCHEMA)?;

        Ok(Self { pool })
    }

    pub async fn insert_pending(&self, payment: NewPayment) -> Result<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO mpesa_payments
                    (phone, amount, checkout_request_id, merchant_request_id, status, provider_response)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    payment.phone,
                    payment.amount.to_string(),
                    payment.checkout_request_id,
                    payment.merchant_request_id,
                    Status::Pending.as_str(),
                    payment.provider_response.to_string(),
                ],
            )?;

            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Moves a pending row to its final status, returning the number of rows touched.
    ///
    /// Rows are matched by CheckoutRequestID first and by MerchantRequestID only when
    /// that finds nothing. Rows that already left `pending` are never touched again.
    pub async fn settle(&self, settlement: Settlement<'_>) -> Result<usize> {
        let checkout_request_id = settlement.checkout_request_id.to_owned();
        let merchant_request_id = settlement.merchant_request_id.map(str::to_owned);
        let status = settlement.status.as_str();
        let result_desc = settlement.result_desc.map(str::to_owned);
        let payload = settlement.callback_payload.to_string();

        self.with_conn(move |conn| {
            let now = Utc::now();

            let updated = conn.execute(
                "UPDATE mpesa_payments
                 SET status = ?1, result_desc = ?2, callback_payload = ?3, updated_at = ?4
                 WHERE checkout_request_id = ?5 AND status = 'pending'",
                params![status, result_desc, payload, now, checkout_request_id],
            )?;

            match merchant_request_id {
                Some(merchant_request_id) if updated == 0 => Ok(conn.execute(
                    "UPDATE mpesa_payments
                     SET status = ?1, result_desc = ?2, callback_payload = ?3, updated_at = ?4
                     WHERE merchant_request_id = ?5 AND status = 'pending'",
                    params![status, result_desc, payload, now, merchant_request_id],
                )?),
                _ => Ok(updated),
            }
        })
        .await
    }

    /// Most recent record carrying this CheckoutRequestID.
    pub async fn find_by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<Record>> {
        let checkout_request_id = checkout_request_id.to_owned();

        self.with_conn(move |conn| {
            let record = conn
                .query_row(
                    "SELECT id, phone, amount, checkout_request_id, merchant_request_id, status,
                            result_desc, provider_response, callback_payload, timestamp, updated_at
                     FROM mpesa_payments
                     WHERE checkout_request_id = ?1
                     ORDER BY id DESC
                     LIMIT 1",
                    params![checkout_request_id],
                    read_record,
                )
                .optional()?;

            Ok(record)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(PooledConnection<SqliteConnectionManager>) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || f(pool.get()?)).await?
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get("id")?,
        phone: row.get("phone")?,
        amount: parse_column(row, "amount")?,
        checkout_request_id: row.get("checkout_request_id")?,
        merchant_request_id: row.get("merchant_request_id")?,
        status: parse_column(row, "status")?,
        result_desc: row.get("result_desc")?,
        provider_response: json_column(row, "provider_response")?,
        callback_payload: json_column(row, "callback_payload")?,
        timestamp: row.get("timestamp")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_column<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(column)?;
    let idx = row.as_ref().column_index(column)?;

    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Value>> {
    let text: Option<String> = row.get(column)?;
    let idx = row.as_ref().column_index(column)?;

    text.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
